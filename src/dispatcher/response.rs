use super::request::HeaderVec;
use std::fmt;
use std::sync::Arc;

/// Lazily produced body chunks.
pub type BodyStream = Box<dyn Iterator<Item = Vec<u8>> + Send>;

/// Response body: either fully buffered or produced chunk by chunk.
pub enum Body {
    Buffered(Vec<u8>),
    Stream(BodyStream),
}

impl Body {
    /// Drain the body into one buffer. Streams are consumed.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Body::Buffered(bytes) => bytes,
            Body::Stream(chunks) => chunks.flatten().collect(),
        }
    }

    /// Borrow the buffered bytes; `None` for streams.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Body::Buffered(bytes) => Some(bytes),
            Body::Stream(_) => None,
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Buffered(bytes) => f
                .debug_tuple("Buffered")
                .field(&String::from_utf8_lossy(bytes))
                .finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Buffered(Vec::new())
    }
}

/// Final response produced by the dispatcher and written by an adapter.
///
/// Headers keep insertion order and may repeat (e.g. several `Set-Cookie`).
/// The content type lives in its own field and is emitted by the adapter.
#[derive(Debug)]
pub struct Response {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    pub headers: HeaderVec,
    pub content_type: String,
    pub body: Body,
}

impl Response {
    #[must_use]
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            content_type: content_type.into(),
            body: Body::Buffered(body.into()),
        }
    }

    /// Plain text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, "text/plain", body.into().into_bytes())
    }

    /// JSON response.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, "application/json", body.to_string().into_bytes())
    }

    /// Response whose body is produced lazily by `chunks`.
    #[must_use]
    pub fn stream(
        status: u16,
        content_type: impl Into<String>,
        chunks: impl Iterator<Item = Vec<u8>> + Send + 'static,
    ) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            content_type: content_type.into(),
            body: Body::Stream(Box::new(chunks)),
        }
    }

    /// Minimal last-resort response, e.g. `404 Not Found` as `text/plain`.
    #[must_use]
    pub fn fallback(status: u16) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Error");
        Self::text(status, format!("{status} {reason}"))
    }

    /// Get the first header with this name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        if name.eq_ignore_ascii_case("content-type") {
            return Some(&self.content_type);
        }
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated header, in order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Replace any existing header of this name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if name.eq_ignore_ascii_case("content-type") {
            self.content_type = value.into();
            return;
        }
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Append a header, keeping earlier values of the same name.
    pub fn add_header(&mut self, name: &str, value: impl Into<String>) {
        if name.eq_ignore_ascii_case("content-type") {
            self.content_type = value.into();
            return;
        }
        self.headers.push((Arc::from(name), value.into()));
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    /// Buffered body as UTF-8 text (lossy). Streams report an empty string.
    #[must_use]
    pub fn body_text(&self) -> String {
        self.body
            .as_bytes()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}
