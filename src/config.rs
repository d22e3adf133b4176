//! # Configuration Module
//!
//! YAML application configuration. Every section and field has a default, so
//! an empty file is a valid configuration.
//!
//! ```yaml
//! server:
//!   addr: 0.0.0.0:7000
//!   tidy: true          # whitespace-tidy text/html responses
//!   benchmark: false    # log per-request wall time
//! dispatch:
//!   default_action: index
//!   error_path: /error
//!   max_reroute_depth: 8
//!   default_content_type: text/html
//!   action_cache_capacity: 10000
//! routes:               # applied in file order, cumulatively
//!   - from: /foo
//!     to: /bar
//!   - pattern: '^/(\d+)\.te?xt$'
//!     to: /text/%d
//! ```

use crate::controller::DEFAULT_ACTION_CACHE_CAPACITY;
use crate::dispatcher::{DispatchConfig, DEFAULT_MAX_REROUTE_DEPTH};
use crate::error::ConfigError;
use crate::registry::{ControllerRegistry, DEFAULT_ACTION, DEFAULT_EXCLUDED_ACTIONS};
use crate::route::RouteTable;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dispatch: DispatchSettings,
    pub routes: Vec<RouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub tidy: bool,
    pub benchmark: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:7000".to_string(),
            tidy: false,
            benchmark: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub default_action: String,
    pub error_path: Option<String>,
    pub max_reroute_depth: usize,
    pub default_content_type: String,
    pub action_cache_capacity: usize,
    pub excluded_actions: Vec<String>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_action: DEFAULT_ACTION.to_string(),
            error_path: None,
            max_reroute_depth: DEFAULT_MAX_REROUTE_DEPTH,
            default_content_type: "text/html".to_string(),
            action_cache_capacity: DEFAULT_ACTION_CACHE_CAPACITY,
            excluded_actions: DEFAULT_EXCLUDED_ACTIONS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// One route rule: exactly one of `from` (literal) or `pattern` (regex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    pub to: String,
}

impl AppConfig {
    /// Read and parse a YAML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Yaml`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        info!(
            path = %path.display(),
            routes = config.routes.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parse YAML text. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Yaml`] on malformed input.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Compile `routes` into a [`RouteTable`], in file order.
    ///
    /// # Errors
    ///
    /// [`ConfigError::RouteKey`] for entries with neither or both keys, and
    /// [`ConfigError::Route`] for invalid patterns or templates.
    pub fn route_table(&self) -> Result<RouteTable, ConfigError> {
        let mut table = RouteTable::new();
        for (index, rule) in self.routes.iter().enumerate() {
            match (&rule.from, &rule.pattern) {
                (Some(from), None) => {
                    table.literal(from.as_str(), rule.to.as_str());
                }
                (None, Some(pattern)) => {
                    table
                        .pattern(pattern, &rule.to)
                        .map_err(|source| ConfigError::Route { index, source })?;
                }
                _ => return Err(ConfigError::RouteKey { index }),
            }
        }
        Ok(table)
    }

    #[must_use]
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            default_content_type: self.dispatch.default_content_type.clone(),
            error_path: self.dispatch.error_path.clone(),
            max_reroute_depth: self.dispatch.max_reroute_depth,
        }
    }

    /// An empty registry carrying the configured action settings.
    #[must_use]
    pub fn registry(&self) -> ControllerRegistry {
        ControllerRegistry::new()
            .with_default_action(self.dispatch.default_action.clone())
            .with_excluded_actions(self.dispatch.excluded_actions.iter().cloned())
            .with_cache_capacity(self.dispatch.action_cache_capacity)
    }
}
