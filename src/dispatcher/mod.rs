//! # Dispatcher Module
//!
//! Runs each request through the full lifecycle:
//!
//! ```text
//! RECEIVED → ROUTED → RESOLVED → INVOKED → RENDERED → RESPONDED
//!               ↘         ↘          ↘          ↘
//!                              ERROR
//! ```
//!
//! - **ROUTED**: the [`RouteTable`](crate::route::RouteTable) rewrites the path in one pass
//! - **RESOLVED**: the [`Resolver`](crate::resolver::Resolver) picks controller, action and args
//! - **INVOKED**: the action runs with an [`ActionContext`](crate::controller::ActionContext)
//! - **RENDERED**: the [`Renderer`](crate::render::Renderer) turns the payload into bytes
//!
//! ## Error Handling
//!
//! [`Dispatcher::dispatch`] returns a [`Response`], never a `Result`:
//! - resolution failures become 404
//! - action errors, action panics, render failures and bad `%d` rewrites become 500
//! - with `error_path` configured, that path is resolved and invoked with the
//!   failure in [`ActionContext::failure`](crate::controller::ActionContext::failure)
//! - otherwise, or if the error action fails too, a `text/plain` fallback such
//!   as `404 Not Found` is returned
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::controller::{Controller, Payload};
//! use switchyard::dispatcher::{Dispatcher, Request};
//! use switchyard::registry::ControllerRegistry;
//! use switchyard::route::RouteTable;
//!
//! let registry = Arc::new(ControllerRegistry::new());
//! registry.register(
//!     Controller::builder("MainController")
//!         .action("index", |_| Ok(Payload::from("Hello, World!")))
//!         .build(),
//! );
//! registry.resolve_mount_table();
//!
//! let dispatcher = Dispatcher::new(RouteTable::new(), registry);
//! let response = dispatcher.dispatch(Request::get("/"));
//! assert_eq!(response.status, 200);
//! assert_eq!(response.content_type, "text/html");
//! assert_eq!(response.body_text(), "Hello, World!");
//! ```

mod core;
mod request;
mod response;

pub use core::{DispatchConfig, Dispatcher, Stage, DEFAULT_MAX_REROUTE_DEPTH};
pub use request::{HeaderVec, ParamVec, Request, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS};
pub use response::{Body, BodyStream, Response};
