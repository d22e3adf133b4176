use super::request::media_type;
use crate::dispatcher::Response;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Most distinct header lines the adapter will ever leak.
pub const HEADER_INTERN_CAPACITY: usize = 4096;

/// `may_minihttp` only accepts `&'static str` header lines, so each distinct
/// line is leaked once and reused afterwards. The table is bounded: once
/// full, lines not already in it are refused and the header is dropped.
pub struct HeaderInterner {
    lines: DashMap<String, &'static str>,
    capacity: usize,
    overflow_reported: AtomicBool,
}

impl HeaderInterner {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: DashMap::new(),
            capacity,
            overflow_reported: AtomicBool::new(false),
        }
    }

    /// The `'static` copy of `line`, or `None` when the table is full.
    pub fn intern(&self, line: &str) -> Option<&'static str> {
        if let Some(existing) = self.lines.get(line) {
            return Some(*existing);
        }
        if self.lines.len() >= self.capacity {
            self.report_overflow(line);
            return None;
        }
        let leaked = *self
            .lines
            .entry(line.to_string())
            .or_insert_with(|| &*Box::leak(line.to_string().into_boxed_str()));
        Some(leaked)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn report_overflow(&self, line: &str) {
        // Values may be secrets (cookies), so only the name is logged.
        let name = line.split_once(':').map_or(line, |(name, _)| name);
        if self.overflow_reported.swap(true, Ordering::Relaxed) {
            debug!(header = %name, "Header intern table full - header dropped");
        } else {
            warn!(
                header = %name,
                capacity = self.capacity,
                "Header intern table full - dropping headers with unseen values"
            );
        }
    }
}

static HEADER_LINES: Lazy<HeaderInterner> =
    Lazy::new(|| HeaderInterner::new(HEADER_INTERN_CAPACITY));

/// Optional post-processing for HTML bodies.
pub trait Tidy: Send + Sync {
    fn tidy(&self, html: &str) -> String;
}

/// Trims every line and drops blank ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTidy;

impl Tidy for WhitespaceTidy {
    fn tidy(&self, html: &str) -> String {
        html.lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A response flattened into what goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    pub status: u16,
    pub reason: &'static str,
    /// `Name: value` lines in emission order, content type first.
    pub header_lines: Vec<String>,
    pub body: Vec<u8>,
}

/// Status reason phrase; unknown codes get `"Unknown"`.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Drain the body and apply `tidy` to `text/html` responses.
#[must_use]
pub fn encode_response(response: Response, tidy: Option<&dyn Tidy>) -> EncodedResponse {
    let Response {
        status,
        headers,
        content_type,
        body,
    } = response;

    let mut body = body.into_bytes();
    if let Some(tidy) = tidy {
        if media_type(&content_type).eq_ignore_ascii_case("text/html") {
            let before = body.len();
            body = tidy.tidy(&String::from_utf8_lossy(&body)).into_bytes();
            debug!(before_bytes = before, after_bytes = body.len(), "HTML tidied");
        }
    }

    let mut header_lines = Vec::with_capacity(headers.len() + 1);
    header_lines.push(format!("Content-Type: {content_type}"));
    header_lines.extend(headers.iter().map(|(k, v)| format!("{k}: {v}")));

    EncodedResponse {
        status,
        reason: status_reason(status),
        header_lines,
        body,
    }
}

/// Write an encoded response to `may_minihttp`.
pub fn write_response(res: &mut may_minihttp::Response, encoded: EncodedResponse) {
    res.status_code(encoded.status as usize, encoded.reason);
    for line in encoded.header_lines {
        if let Some(line) = HEADER_LINES.intern(&line) {
            res.header(line);
        }
    }
    res.body_vec(encoded.body);
}
