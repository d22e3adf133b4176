//! # Server Module
//!
//! HTTP adapter on `may_minihttp`: one coroutine per connection, each
//! converting the wire request into a [`Request`](crate::dispatcher::Request),
//! dispatching it and writing the [`Response`](crate::dispatcher::Response) back.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use switchyard::dispatcher::Dispatcher;
//! use switchyard::registry::ControllerRegistry;
//! use switchyard::route::RouteTable;
//! use switchyard::server::{AppService, HttpServer};
//!
//! let registry = Arc::new(ControllerRegistry::new());
//! let dispatcher = Arc::new(Dispatcher::new(RouteTable::new(), registry));
//! let handle = HttpServer(AppService::new(dispatcher).with_tidy(true))
//!     .start("127.0.0.1:7000")
//!     .unwrap();
//! handle.wait_ready().unwrap();
//! handle.join().unwrap();
//! ```

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{build_request, parse_request};
pub use response::{
    encode_response, status_reason, write_response, EncodedResponse, HeaderInterner, Tidy,
    WhitespaceTidy, HEADER_INTERN_CAPACITY,
};
pub use service::AppService;
