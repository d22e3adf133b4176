use crate::ids::RequestId;
use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum number of query/body parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers before heap allocation.
/// Most requests have ≤16 headers.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Ordered, multi-valued parameter storage.
///
/// Names use `Arc<str>` so repeated names (`?tag=a&tag=b`) share one allocation
/// when cloned; values stay `String` as they are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Ordered, multi-valued header storage (stack-allocated for ≤16 headers).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Transport-independent request handed to the dispatcher by an adapter.
///
/// The `path` is expected to be percent-decoded already; the query string may
/// still be attached and is ignored by resolution.
#[derive(Debug, Clone)]
pub struct Request {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    pub path: String,
    /// Query string parameters in arrival order
    pub query_params: ParamVec,
    /// Form body parameters in arrival order
    pub body_params: ParamVec,
    /// HTTP headers, lowercase names
    pub headers: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
    /// Free-form data for route rewrite functions and actions.
    pub context: HashMap<String, Value>,
}

impl Request {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            request_id: RequestId::new(),
            method,
            path: path.into(),
            query_params: ParamVec::new(),
            body_params: ParamVec::new(),
            headers: HeaderVec::new(),
            body: None,
            context: HashMap::new(),
        }
    }

    /// Shorthand for a `GET` request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn with_query(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_body_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.body_params.push((Arc::from(name), value.into()));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.into()));
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Get a query parameter by name
    ///
    /// Uses "last write wins" semantics: `?limit=10&limit=20` yields `20`.
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        last_value(&self.query_params, name)
    }

    /// Get a form body parameter by name ("last write wins").
    #[inline]
    #[must_use]
    pub fn get_body_param(&self, name: &str) -> Option<&str> {
        last_value(&self.body_params, name)
    }

    /// Every value supplied for a query parameter, in arrival order.
    #[must_use]
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query_params
            .iter()
            .filter(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Look a parameter up in the query string first, then in the form body.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.get_query_param(name)
            .or_else(|| self.get_body_param(name))
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }
}

fn last_value<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_prefers_query_over_body() {
        let req = Request::get("/foo")
            .with_body_param("bar", "body")
            .with_query("bar", "query");
        assert_eq!(req.param("bar"), Some("query"));
        assert_eq!(req.get_body_param("bar"), Some("body"));
    }

    #[test]
    fn test_query_last_write_wins() {
        let req = Request::get("/")
            .with_query("limit", "10")
            .with_query("limit", "20");
        assert_eq!(req.get_query_param("limit"), Some("20"));
        assert_eq!(req.query_values("limit"), vec!["10", "20"]);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let req = Request::get("/").with_header("X-Request-Id", "abc");
        assert_eq!(req.get_header("x-request-id"), Some("abc"));
        assert_eq!(req.get_header("X-REQUEST-ID"), Some("abc"));
    }
}
