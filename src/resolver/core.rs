use crate::controller::{CachedAction, Controller, NESTED_ACTION_SEPARATOR};
use crate::error::ResolveError;
use crate::registry::ControllerRegistry;
use std::sync::Arc;
use tracing::debug;

/// Split `path` into its significant segments.
///
/// ```rust
/// use switchyard::resolver::normalize;
/// assert_eq!(normalize("/foo//bar/?x=1#top"), vec!["foo", "bar"]);
/// assert!(normalize("/").is_empty());
/// ```
#[must_use]
pub fn normalize(path: &str) -> Vec<&str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty()).collect()
}

/// Canonical form of a mount path: leading slash, no trailing or doubled slashes.
#[must_use]
pub fn normalize_mount(path: &str) -> String {
    format!("/{}", normalize(path).join("/"))
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub controller: Arc<Controller>,
    /// Mount path the controller was found under.
    pub mount: String,
    pub action: String,
    pub args: Vec<String>,
}

/// Resolves paths against a registry's mount table.
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<ControllerRegistry>,
}

impl Resolver {
    #[must_use]
    pub fn new(registry: Arc<ControllerRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ControllerRegistry> {
        &self.registry
    }

    /// Resolve `path` to a controller, action and positional arguments.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NotFound`] when no mounted controller can serve the path.
    pub fn resolve(&self, path: &str) -> Result<Resolved, ResolveError> {
        let segments = normalize(path);
        let mounts = self.registry.mounts();

        // Only depths some mount actually has; deepest first.
        for &prefix_len in mounts.depths().iter().filter(|&&d| d <= segments.len()) {
            let mount = format!("/{}", segments[..prefix_len].join("/"));
            let Some(controller) = mounts.get(&mount) else {
                continue;
            };

            // RS1: Mount prefix matched
            debug!(path = %path, mount = %mount, controller = %controller.name(), "Mount prefix matched");

            if let Some(hit) = self.resolve_in(controller, &segments[prefix_len..]) {
                return Ok(Resolved {
                    controller: Arc::clone(controller),
                    mount,
                    action: hit.action,
                    args: hit.args,
                });
            }

            // RS3: Suffix unresolvable under this mount
            debug!(
                path = %path,
                mount = %mount,
                controller = %controller.name(),
                "No action under mount - trying shorter prefix"
            );
        }

        // RS4: Not found
        debug!(path = %path, mounts = mounts.len(), "Path did not resolve");
        Err(ResolveError::NotFound {
            path: path.to_string(),
        })
    }

    /// Resolve a suffix within one controller, consulting its cache first.
    fn resolve_in(&self, controller: &Controller, rest: &[&str]) -> Option<CachedAction> {
        let key = rest.join("/");
        if let Some(cached) = controller.cache.get(&key) {
            // RS2: Cache hit
            debug!(
                controller = %controller.name(),
                suffix = %key,
                hit = cached.is_some(),
                "Action cache hit"
            );
            return cached;
        }

        let computed = self.search(controller, rest);
        controller.cache.insert(&key, computed)
    }

    fn search(&self, controller: &Controller, rest: &[&str]) -> Option<CachedAction> {
        let longest = rest.len().min(controller.max_action_segments());
        for take in (1..=longest).rev() {
            let name = rest[..take].join(NESTED_ACTION_SEPARATOR);
            if self.callable(controller, &name, rest.len() - take) {
                return Some(CachedAction {
                    action: name,
                    args: to_args(&rest[take..]),
                });
            }
        }

        let default = self.registry.default_action();
        self.callable(controller, default, rest.len())
            .then(|| CachedAction {
                action: default.to_string(),
                args: to_args(rest),
            })
    }

    fn callable(&self, controller: &Controller, name: &str, argc: usize) -> bool {
        if self.registry.is_excluded(name) || controller.is_excluded(name) {
            return false;
        }
        controller.action(name).is_some_and(|a| a.accepts(argc))
    }
}

fn to_args(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| (*s).to_string()).collect()
}
