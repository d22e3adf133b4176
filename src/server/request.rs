use crate::dispatcher::Request;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use std::borrow::Cow;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, warn};

/// Content type whose body is decoded into [`Request::body_params`].
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Convert a `may_minihttp` request into a dispatcher [`Request`].
///
/// Consumes the request because the body can only be read once.
pub fn parse_request(req: may_minihttp::Request) -> Request {
    let method = req.method().to_string();
    let target = req.path().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    let mut body = Vec::new();
    if let Err(e) = req.body().read_to_end(&mut body) {
        warn!(error = %e, "Failed to read request body");
        body.clear();
    }

    build_request(&method, &target, headers, &body)
}

/// Assemble a [`Request`] from raw request parts.
///
/// - the path is split from the query string and percent-decoded
/// - query pairs are form-decoded, keeping repeats in order
/// - form bodies fill `body_params`; other non-empty bodies are tried as JSON
/// - a valid ULID in `x-request-id` is kept as the request id
#[must_use]
pub fn build_request(
    method: &str,
    target: &str,
    headers: Vec<(String, String)>,
    body: &[u8],
) -> Request {
    let method = Method::from_bytes(method.as_bytes()).unwrap_or_else(|_| {
        warn!(method = %method, "Unparseable request method - treating as GET");
        Method::GET
    });
    let (raw_path, query) = match target.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (target, None),
    };
    let path = decode_path(raw_path);

    let mut request = Request::new(method, path);
    for (name, value) in headers {
        request.headers.push((Arc::from(name.as_str()), value));
    }
    request.request_id = RequestId::adopt_or_mint(request.get_header(REQUEST_ID_HEADER));

    if let Some(query) = query {
        request.query_params.extend(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned())),
        );
    }

    if !body.is_empty() {
        let is_form = request
            .get_header("content-type")
            .is_some_and(|ct| media_type(ct).eq_ignore_ascii_case(FORM_CONTENT_TYPE));
        if is_form {
            request.body_params.extend(
                url::form_urlencoded::parse(body)
                    .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned())),
            );
        } else {
            request.body = serde_json::from_slice(body).ok();
        }
    }

    // A2: Request parsed
    debug!(
        request_id = %request.request_id,
        method = %request.method,
        path = %request.path,
        header_count = request.headers.len(),
        query_count = request.query_params.len(),
        body_params = request.body_params.len(),
        json_body = request.body.is_some(),
        body_size_bytes = body.len(),
        "HTTP request parsed"
    );

    request
}

/// Percent-decode a path; invalid UTF-8 leaves it untouched.
fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

/// `text/html; charset=utf-8` → `text/html`.
pub(crate) fn media_type(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}
