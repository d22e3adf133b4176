use crate::dispatcher::{BodyStream, Request, Response};
use crate::error::ActionError;
use crate::ids::RequestId;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator joining nested path segments into one action name.
pub const NESTED_ACTION_SEPARATOR: &str = "__";

/// Default bound on cached resolutions per controller.
pub const DEFAULT_ACTION_CACHE_CAPACITY: usize = 10_000;

/// Suffixes longer than this many bytes are resolved but never cached.
pub const MAX_CACHED_SUFFIX_LEN: usize = 1024;

/// Action handler. Arguments are bound positionally through [`ActionContext::args`].
pub type ActionFn = Arc<dyn Fn(&ActionContext<'_>) -> Result<Payload, ActionError> + Send + Sync>;

/// What an action hands back to the dispatcher.
pub enum Payload {
    /// Rendered with the default content type.
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
    Stream(BodyStream),
    /// A finished response; skips rendering entirely.
    Response(Response),
    /// Dispatch another path internally. Route rewrites are not re-applied.
    Reroute(String),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Payload::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Payload::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Payload::Stream(_) => f.write_str("Stream(..)"),
            Payload::Response(r) => f.debug_tuple("Response").field(&r.status).finish(),
            Payload::Reroute(p) => f.debug_tuple("Reroute").field(p).finish(),
        }
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Json(v)
    }
}

impl From<Response> for Payload {
    fn from(r: Response) -> Self {
        Payload::Response(r)
    }
}

/// The failure an error action is rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub status: u16,
    pub message: String,
}

/// Everything an action may look at while it runs.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub request: &'a Request,
    pub controller: &'a str,
    pub action: &'a str,
    /// Path segments left over after the action name.
    pub args: &'a [String],
    /// Path the action was resolved from, after rewriting.
    pub path: &'a str,
    /// Set when the action runs as the configured error handler.
    pub failure: Option<&'a Failure>,
}

impl ActionContext<'_> {
    /// Correlation id shared by every log event of this request.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request.request_id
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Query parameter, falling back to the form body.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }
}

/// A named, callable unit of a controller.
#[derive(Clone)]
pub struct Action {
    name: String,
    min_args: usize,
    max_args: Option<usize>,
    handler: ActionFn,
}

impl Action {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `count` positional arguments fit this action's arity.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    pub fn call(&self, ctx: &ActionContext<'_>) -> Result<Payload, ActionError> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("min_args", &self.min_args)
            .field("max_args", &self.max_args)
            .finish_non_exhaustive()
    }
}

/// Template used to render an action: `template` of `controller`
/// (`None` meaning the owning controller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAlias {
    pub controller: Option<String>,
    pub template: String,
}

/// Resolution remembered for one path suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAction {
    pub action: String,
    pub args: Vec<String>,
}

/// Per-controller memo of `suffix → action`. Misses are remembered as `None`.
#[derive(Debug)]
pub(crate) struct ActionCache {
    entries: DashMap<String, Option<CachedAction>>,
    capacity: usize,
}

impl ActionCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<Option<CachedAction>> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Insert unless present. Returns the stored value, which is the first
    /// writer's when two threads race on the same key.
    pub(crate) fn insert(&self, key: &str, value: Option<CachedAction>) -> Option<CachedAction> {
        if key.len() > MAX_CACHED_SUFFIX_LEN {
            return value;
        }
        if self.entries.len() >= self.capacity && !self.entries.contains_key(key) {
            return value;
        }
        self.entries
            .entry(key.to_string())
            .or_insert(value)
            .value()
            .clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Descriptor of one controller: mount paths, actions, exclusions, templates
/// and its resolution cache.
///
/// Built with [`Controller::builder`] and handed to
/// [`ControllerRegistry::register`](crate::registry::ControllerRegistry::register).
pub struct Controller {
    name: String,
    paths: Vec<String>,
    automap: bool,
    actions: HashMap<String, Action>,
    /// Most path segments any action name spans once `__` is split.
    max_action_segments: usize,
    excluded: HashSet<String>,
    template_root: Option<PathBuf>,
    templates: HashMap<String, TemplateAlias>,
    pub(crate) cache: ActionCache,
}

impl Controller {
    #[must_use]
    pub fn builder(type_name: &str) -> ControllerBuilder {
        ControllerBuilder::new(type_name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit mount paths, in declaration order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    #[must_use]
    pub fn automap(&self) -> bool {
        self.automap
    }

    /// Look an action up by name, ignoring exclusions.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    /// Names of all declared actions, sorted.
    #[must_use]
    pub fn action_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Longest action name in path segments: `show__cats` counts 2.
    #[must_use]
    pub fn max_action_segments(&self) -> usize {
        self.max_action_segments
    }

    /// Whether this controller itself hides `name`.
    #[must_use]
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    #[must_use]
    pub fn template_root(&self) -> Option<&Path> {
        self.template_root.as_deref()
    }

    /// Template alias configured for `action`, if any.
    #[must_use]
    pub fn template_for(&self, action: &str) -> Option<&TemplateAlias> {
        self.templates.get(action)
    }

    /// Number of cached resolutions (hits and misses).
    #[must_use]
    pub fn cached_resolutions(&self) -> usize {
        self.cache.len()
    }

    pub(crate) fn reset_cache(&mut self, capacity: usize) {
        self.cache = ActionCache::new(capacity);
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("automap", &self.automap)
            .field("actions", &self.action_names())
            .finish_non_exhaustive()
    }
}

/// Fluent construction of a [`Controller`].
///
/// ```rust
/// use switchyard::controller::{Controller, Payload};
///
/// let ctrl = Controller::builder("BlogController")
///     .map("/blog")
///     .action("index", |_| Ok(Payload::from("posts")))
///     .action_with_arity("show", 1, Some(1), |ctx| {
///         Ok(format!("post {}", ctx.arg(0).unwrap_or_default()).into())
///     })
///     .build();
/// assert_eq!(ctrl.paths(), ["/blog"]);
/// ```
pub struct ControllerBuilder {
    inner: Controller,
}

impl ControllerBuilder {
    fn new(type_name: &str) -> Self {
        Self {
            inner: Controller {
                name: type_name.to_string(),
                paths: Vec::new(),
                automap: true,
                actions: HashMap::new(),
                max_action_segments: 0,
                excluded: HashSet::new(),
                template_root: None,
                templates: HashMap::new(),
                cache: ActionCache::new(DEFAULT_ACTION_CACHE_CAPACITY),
            },
        }
    }

    /// Add an explicit mount path. May be called more than once.
    #[must_use]
    pub fn map(mut self, path: &str) -> Self {
        if !self.inner.paths.iter().any(|p| p == path) {
            self.inner.paths.push(path.to_string());
        }
        self
    }

    #[must_use]
    pub fn automap(mut self, enabled: bool) -> Self {
        self.inner.automap = enabled;
        self
    }

    /// Add an action that takes any number of arguments.
    #[must_use]
    pub fn action<F>(self, name: &str, f: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Result<Payload, ActionError> + Send + Sync + 'static,
    {
        self.action_with_arity(name, 0, None, f)
    }

    /// Add an action that accepts between `min` and `max` (inclusive) arguments.
    #[must_use]
    pub fn action_with_arity<F>(mut self, name: &str, min: usize, max: Option<usize>, f: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Result<Payload, ActionError> + Send + Sync + 'static,
    {
        let action = Action {
            name: name.to_string(),
            min_args: min,
            max_args: max,
            handler: Arc::new(f),
        };
        if self.inner.actions.insert(name.to_string(), action).is_some() {
            warn!(
                controller = %self.inner.name,
                action = %name,
                "Action redefined - replacing handler"
            );
        }
        self
    }

    /// Hide an action name from resolution.
    #[must_use]
    pub fn exclude(mut self, name: &str) -> Self {
        self.inner.excluded.insert(name.to_string());
        self
    }

    /// Directory holding this controller's templates. A missing directory is
    /// accepted but logged.
    #[must_use]
    pub fn template_root(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.is_dir() {
            warn!(
                controller = %self.inner.name,
                template_root = %path.display(),
                "Template root does not exist"
            );
        }
        self.inner.template_root = Some(path);
        self
    }

    /// Render `action` with this controller's `template`.
    #[must_use]
    pub fn template(mut self, action: &str, template: &str) -> Self {
        self.inner.templates.insert(
            action.to_string(),
            TemplateAlias {
                controller: None,
                template: template.to_string(),
            },
        );
        self
    }

    /// Render `action` with `template` from another controller's template root.
    #[must_use]
    pub fn template_from(mut self, action: &str, controller: &str, template: &str) -> Self {
        self.inner.templates.insert(
            action.to_string(),
            TemplateAlias {
                controller: Some(controller.to_string()),
                template: template.to_string(),
            },
        );
        self
    }

    #[must_use]
    pub fn build(mut self) -> Controller {
        self.inner.max_action_segments = self
            .inner
            .actions
            .keys()
            .map(|name| name.split(NESTED_ACTION_SEPARATOR).count())
            .max()
            .unwrap_or(0);
        debug!(
            controller = %self.inner.name,
            paths = ?self.inner.paths,
            automap = self.inner.automap,
            actions = self.inner.actions.len(),
            "Controller declared"
        );
        self.inner
    }
}
