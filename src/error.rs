//! # Error Taxonomy
//!
//! Every failure the dispatch core can observe is one of the enums below.
//! Route configuration problems are raised when a rule is registered (or, for
//! `%d` conversions, when the rule first fires). Resolution, action and render
//! failures never leave [`Dispatcher::dispatch`](crate::dispatcher::Dispatcher::dispatch):
//! they are converted into 404/500-class responses there.

use std::path::PathBuf;
use thiserror::Error;

/// A route rule is malformed or could not be applied.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The pattern key is not a valid regular expression.
    #[error("invalid route pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    /// The template uses a directive other than `%s`, `%d` or `%%`.
    #[error("unknown directive `%{directive}` in route template `{template}`")]
    UnknownDirective { template: String, directive: char },
    /// The template ends with a lone `%`.
    #[error("route template `{template}` ends with an incomplete `%` directive")]
    IncompleteDirective { template: String },
    /// The number of `%s`/`%d` directives differs from the capture group count.
    #[error(
        "route template `{template}` has {directives} directive(s) but pattern `{pattern}` has {captures} capture group(s)"
    )]
    DirectiveMismatch {
        pattern: String,
        template: String,
        captures: usize,
        directives: usize,
    },
    /// A `%d` directive received a capture that is not an integer.
    #[error("capture {index} (`{value}`) of pattern `{pattern}` is not an integer for `%d`")]
    NotAnInteger {
        pattern: String,
        index: usize,
        value: String,
    },
}

/// Path resolution could not find a controller/action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("no controller or action found for `{path}`")]
    NotFound { path: String },
}

/// The renderer failed to turn an action payload into a body.
#[derive(Debug, Error)]
#[error("render of {controller}#{action} failed: {message}")]
pub struct RenderError {
    pub controller: String,
    pub action: String,
    pub message: String,
}

/// Failure raised while an action runs.
///
/// Actions return `Result<Payload, ActionError>`; a panic inside an action is
/// converted into the same type by the dispatcher.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ActionError {
    pub message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Per-request failure observed by the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    NotFound(#[from] ResolveError),
    #[error("action {controller}#{action} failed: {source}")]
    Action {
        controller: String,
        action: String,
        #[source]
        source: ActionError,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("reroute depth limit of {limit} exceeded at `{path}`")]
    RerouteLimit { path: String, limit: usize },
}

impl DispatchError {
    /// HTTP status used when this failure is turned into a response.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound(_) => 404,
            _ => 500,
        }
    }
}

/// Failure loading the YAML application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("route {index} in config is invalid: {source}")]
    Route {
        index: usize,
        #[source]
        source: RouteError,
    },
    #[error("route {index} in config needs exactly one of `from` or `pattern`")]
    RouteKey { index: usize },
}
