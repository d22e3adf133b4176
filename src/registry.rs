//! # Controller Registry
//!
//! Process-scoped set of controllers plus the global `path → controller`
//! mount table.
//!
//! Controllers are registered once, in declaration order. The mount table is
//! built by [`ControllerRegistry::resolve_mount_table`]: each controller claims
//! its explicit paths (or, when automapped, the path derived from its type
//! name) unless another controller got there first. The only way to take over
//! a claimed path is [`ControllerRegistry::map`].
//!
//! Reads of the mount table are lock-free snapshots via `ArcSwap`; the
//! controller list sits behind an `RwLock` that is only written at
//! registration.

use crate::controller::{derive_mount_path, Controller, DEFAULT_ACTION_CACHE_CAPACITY};
use crate::resolver::{normalize, normalize_mount};
use arc_swap::ArcSwap;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Names never reachable as actions, whatever a controller declares.
pub const DEFAULT_EXCLUDED_ACTIONS: [&str; 11] = [
    "new",
    "clone",
    "drop",
    "fmt",
    "to_string",
    "hash",
    "eq",
    "default",
    "from",
    "into",
    "call",
];

/// Action used when no path segment names one.
pub const DEFAULT_ACTION: &str = "index";

/// Snapshot of the mount table.
///
/// Besides `path → controller` it keeps the distinct segment depths of all
/// mounted paths, longest first, so resolution only tries prefixes that can
/// exist.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    paths: HashMap<String, Arc<Controller>>,
    depths: Vec<usize>,
}

impl MountTable {
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Arc<Controller>> {
        self.paths.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Arc<Controller>)> {
        self.paths.iter()
    }

    /// Segment counts of mounted paths, descending, without duplicates.
    #[must_use]
    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    fn contains_controller(&self, controller: &Arc<Controller>) -> bool {
        self.paths.values().any(|c| Arc::ptr_eq(c, controller))
    }

    fn insert(&mut self, path: String, controller: Arc<Controller>) {
        let depth = normalize(&path).len();
        if let Err(at) = self.depths.binary_search_by(|d| depth.cmp(d)) {
            self.depths.insert(at, depth);
        }
        self.paths.insert(path, controller);
    }
}

pub struct ControllerRegistry {
    controllers: RwLock<Vec<Arc<Controller>>>,
    mounts: ArcSwap<MountTable>,
    excluded: HashSet<String>,
    default_action: String,
    cache_capacity: usize,
}

impl Default for ControllerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            controllers: RwLock::new(Vec::new()),
            mounts: ArcSwap::from_pointee(MountTable::default()),
            excluded: DEFAULT_EXCLUDED_ACTIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            default_action: DEFAULT_ACTION.to_string(),
            cache_capacity: DEFAULT_ACTION_CACHE_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_default_action(mut self, name: impl Into<String>) -> Self {
        self.default_action = name.into();
        self
    }

    /// Replace the registry-wide excluded action set.
    #[must_use]
    pub fn with_excluded_actions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = names.into_iter().map(Into::into).collect();
        self
    }

    /// Bound on cached resolutions per controller registered from now on.
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    #[must_use]
    pub fn default_action(&self) -> &str {
        &self.default_action
    }

    /// Whether `name` is hidden for every controller.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Append a controller with a fresh, empty action cache.
    pub fn register(&self, mut controller: Controller) -> Arc<Controller> {
        controller.reset_cache(self.cache_capacity);
        let controller = Arc::new(controller);
        let mut controllers = self
            .controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if controllers.iter().any(|c| c.name() == controller.name()) {
            warn!(
                controller = %controller.name(),
                "Controller name registered twice - both descriptors are kept"
            );
        }
        controllers.push(Arc::clone(&controller));
        info!(
            controller = %controller.name(),
            total_controllers = controllers.len(),
            "Controller registered"
        );
        controller
    }

    /// Registered controllers in registration order.
    #[must_use]
    pub fn controllers(&self) -> Vec<Arc<Controller>> {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// First registered controller called `name`.
    #[must_use]
    pub fn controller(&self, name: &str) -> Option<Arc<Controller>> {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|c| c.name() == name)
            .cloned()
    }

    /// Where `controller` is (or would be) mounted.
    ///
    /// An existing mount-table entry wins, then the first explicit path, then
    /// the automapped path. Controllers with automap disabled and no explicit
    /// path have no mount.
    #[must_use]
    pub fn mount(&self, controller: &Controller) -> Option<String> {
        let mounts = self.mounts.load();
        let mut claimed: Vec<&String> = mounts
            .iter()
            .filter(|(_, c)| std::ptr::eq(c.as_ref(), controller))
            .map(|(path, _)| path)
            .collect();
        claimed.sort();
        if let Some(path) = claimed.first() {
            return Some((*path).clone());
        }
        if let Some(path) = controller.paths().first() {
            return Some(normalize_mount(path));
        }
        controller
            .automap()
            .then(|| derive_mount_path(controller.name()))
    }

    /// Claim mount paths for every registered controller not yet mounted.
    ///
    /// Paths already in the table are never taken over here; the first
    /// claimant keeps them. Safe to call repeatedly.
    pub fn resolve_mount_table(&self) {
        let controllers = self.controllers();
        self.mounts.rcu(|current| {
            let mut table = (**current).clone();
            for controller in &controllers {
                if table.contains_controller(controller) {
                    continue;
                }

                let mut claimed_any = false;
                for path in controller.paths().iter().map(|p| normalize_mount(p)) {
                    claimed_any |= claim(&mut table, path, controller);
                }
                if !claimed_any && controller.automap() {
                    let derived = derive_mount_path(controller.name());
                    claim(&mut table, derived, controller);
                }
            }
            table
        });

        info!(
            controllers = controllers.len(),
            mounts = self.mounts.load().len(),
            "Mount table resolved"
        );
    }

    /// Mount `controller` at `path`, replacing any previous owner.
    pub fn map(&self, path: &str, controller: &Arc<Controller>) {
        let path = normalize_mount(path);
        self.mounts.rcu(|current| {
            let mut table = (**current).clone();
            table.insert(path.clone(), Arc::clone(controller));
            table
        });
        info!(path = %path, controller = %controller.name(), "Controller mapped");
    }

    /// Controller mounted at exactly `path` (already normalized).
    #[must_use]
    pub fn mounted_at(&self, path: &str) -> Option<Arc<Controller>> {
        self.mounts.load().get(path).cloned()
    }

    /// Current mount table snapshot.
    #[must_use]
    pub fn mounts(&self) -> Arc<MountTable> {
        self.mounts.load_full()
    }
}

fn claim(table: &mut MountTable, path: String, controller: &Arc<Controller>) -> bool {
    if let Some(owner) = table.get(&path) {
        warn!(
            path = %path,
            owner = %owner.name(),
            controller = %controller.name(),
            "Mount path already claimed - skipping"
        );
        return false;
    }
    debug!(path = %path, controller = %controller.name(), "Mount path claimed");
    table.insert(path, Arc::clone(controller));
    true
}
