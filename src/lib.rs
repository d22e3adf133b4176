//! # Switchyard
//!
//! **Switchyard** is a small controller-based web framework core on the `may`
//! coroutine runtime. Requests are rewritten by a route table, resolved to a
//! controller action by walking the path, invoked, and rendered.
//!
//! ## Architecture
//!
//! - **[`route`]** - Ordered literal/regex/closure rewrite rules
//! - **[`controller`]** - Controllers, actions, template aliases and mount-path naming
//! - **[`registry`]** - Controller registry and the mount table
//! - **[`resolver`]** - Path to controller/action/arguments resolution, with per-controller caching
//! - **[`render`]** - Payload rendering, plain or through `minijinja` templates
//! - **[`dispatcher`]** - The request lifecycle, error recovery and reroutes
//! - **[`server`]** - HTTP adapter on `may_minihttp`
//! - **[`config`]** - YAML application configuration
//! - **[`hot_reload`]** - Route table reloading on configuration change
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Request lifecycle
//!
//! ```text
//! RECEIVED -> ROUTED -> RESOLVED -> INVOKED -> RENDERED -> RESPONDED
//!                 \__________\__________\__________\______> ERROR -> error path or fallback
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::controller::{Controller, Payload};
//! use switchyard::dispatcher::{Dispatcher, Request};
//! use switchyard::registry::ControllerRegistry;
//! use switchyard::route::RouteTable;
//!
//! let registry = ControllerRegistry::new();
//! registry.register(
//!     Controller::builder("MainController")
//!         .action("index", |_| Ok(Payload::from("Hello, World!")))
//!         .build(),
//! );
//! registry.resolve_mount_table();
//!
//! let dispatcher = Dispatcher::new(RouteTable::new(), Arc::new(registry));
//! let response = dispatcher.dispatch(Request::get("/"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.body_text(), "Hello, World!");
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod hot_reload;
pub mod ids;
pub mod logging;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod route;
pub mod runtime_config;
pub mod server;

pub use config::AppConfig;
pub use controller::{ActionContext, Controller, ControllerBuilder, Payload};
pub use dispatcher::{Dispatcher, Request, Response};
pub use error::{ActionError, DispatchError};
pub use ids::RequestId;
pub use registry::ControllerRegistry;
pub use route::RouteTable;
