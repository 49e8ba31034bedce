//! HTTP-date (RFC 7231 IMF-fixdate) helpers.

use chrono::{DateTime, Utc};

/// Format as `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an HTTP-date header value.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
