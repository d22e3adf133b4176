//! Request correlation ids.
//!
//! The HTTP adapter adopts an upstream `x-request-id` when it carries a ULID
//! and mints a fresh one otherwise. The id then rides on
//! [`Request::request_id`](crate::dispatcher::Request::request_id): every
//! dispatch log event (`D*`) records it as `request_id`, reroutes and the
//! error path keep it, and actions read it through
//! [`ActionContext::request_id`](crate::controller::ActionContext::request_id).

use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Header an upstream proxy uses to hand over its correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of one request, backed by a ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(pub ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Keep an upstream id when it parses as a ULID, otherwise mint one.
    ///
    /// Non-ULID ids are dropped rather than echoed into logs.
    #[must_use]
    pub fn adopt_or_mint(header_value: Option<&str>) -> Self {
        header_value
            .and_then(|s| s.trim().parse::<RequestId>().ok())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RequestId(ulid::Ulid::from_string(s)?))
    }
}
