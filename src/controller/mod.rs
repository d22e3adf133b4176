//! # Controller Module
//!
//! Controller descriptors: explicit action tables with per-controller
//! exclusions, mount paths (explicit or automapped from the type name),
//! template aliases and a resolution cache.
//!
//! Actions are plain closures over an [`ActionContext`]. There is no
//! reflection: only names added with [`ControllerBuilder::action`] are
//! reachable, minus the registry-wide and per-controller exclusions.

mod core;
mod naming;

pub use core::{
    Action, ActionContext, ActionFn, CachedAction, Controller, ControllerBuilder, Failure,
    Payload, TemplateAlias, DEFAULT_ACTION_CACHE_CAPACITY, MAX_CACHED_SUFFIX_LEN,
    NESTED_ACTION_SEPARATOR,
};
pub use naming::{derive_mount_path, snake_case};
