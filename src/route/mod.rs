//! # Route Module
//!
//! Path rewriting that runs before controller resolution.
//!
//! ## Overview
//!
//! A [`RouteTable`] is an ordered dictionary of rules. Three kinds are supported:
//!
//! - **Literal**: one exact path is translated into another.
//!   `/foo` → `/bar`
//! - **Pattern**: a regex whose capture groups are substituted positionally into
//!   a printf-like template.
//!   `^/(\d+)\.te?xt$` → `/text/%d` turns `/123.txt` into `/text/123`
//! - **Programmatic**: a named closure receiving the current path and the
//!   request, returning a new path or `None`.
//!
//! ## Application order
//!
//! Rules are applied cumulatively in a single pass: each rule sees the output
//! of the rules registered before it, and every rule is attempted exactly once.
//! This differs from "first match wins" routers and configurations may rely on
//! chaining.
//!
//! ## Example
//!
//! ```rust
//! use switchyard::dispatcher::Request;
//! use switchyard::route::RouteTable;
//!
//! let mut routes = RouteTable::new();
//! routes.literal("/foo", "/bar");
//! routes.pattern(r"^/(\d+)\.te?xt$", "/text/%d").unwrap();
//! routes.rewrite("bar flag", |path, req| {
//!     (path == "/bar" && req.param("bar") == Some("1")).then(|| "/flagged".to_string())
//! });
//!
//! let req = Request::get("/foo").with_query("bar", "1");
//! assert_eq!(routes.apply("/foo", &req).unwrap(), "/flagged");
//! assert_eq!(routes.apply("/789.text", &req).unwrap(), "/text/789");
//! ```

mod core;
mod template;
#[cfg(test)]
mod tests;

pub use core::{RewriteFn, RouteKey, RouteTable, RouteTarget};
