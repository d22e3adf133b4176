//! # Runtime Configuration Module
//!
//! Environment-driven tuning of the `may` coroutine runtime.
//!
//! ## Environment Variables
//!
//! ### `SWITCHYARD_STACK_SIZE`
//!
//! Stack size of each connection coroutine. Accepts decimal (`32768`) or
//! hexadecimal (`0x8000`). Default: `0x8000` (32 KB).
//!
//! Actions run on the connection coroutine's stack, so deep action call
//! chains or large locals need a bigger value. Memory use is roughly
//! `stack_size × concurrent connections`.
//!
//! ```bash
//! export SWITCHYARD_STACK_SIZE=0x10000
//! switchyard serve --config config.yaml
//! ```

use std::env;
use tracing::{info, warn};

/// Environment variable holding the coroutine stack size.
pub const STACK_SIZE_ENV: &str = "SWITCHYARD_STACK_SIZE";

/// Default coroutine stack size (32 KB).
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = match env::var(STACK_SIZE_ENV) {
            Ok(val) => parse_size(&val).unwrap_or_else(|| {
                warn!(value = %val, default = DEFAULT_STACK_SIZE, "Invalid {STACK_SIZE_ENV} - using default");
                DEFAULT_STACK_SIZE
            }),
            Err(_) => DEFAULT_STACK_SIZE,
        };
        RuntimeConfig { stack_size }
    }

    /// Apply to the global `may` configuration. Call before starting the server.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

/// Parse `0x`-prefixed hex or plain decimal.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
