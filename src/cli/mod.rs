//! # CLI Module
//!
//! Command-line entry points for the `switchyard` binary.
//!
//! ### `serve`
//!
//! Run the demo application (a `MainController` answering `Hello, World!`
//! at `/`, plus an error page at `/error`):
//!
//! ```bash
//! switchyard serve --config config.yaml --addr 127.0.0.1:7000 --watch
//! ```
//!
//! `SIGINT` or `SIGTERM` stops the server.
//!
//! ### `rewrite`
//!
//! Show what a path turns into after the configured route rules:
//!
//! ```bash
//! switchyard rewrite --config config.yaml /42.txt
//! ```

mod commands;


pub use commands::{demo_controllers, run_cli, Cli, Commands};
