use axum::http::StatusCode;

use crate::app::errors;

/// Parse a path segment into a typed id; a malformed id is a 400, not a 404.
pub fn parse_id<T: core::str::FromStr>(
    raw: &str,
    what: &'static str,
) -> Result<T, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id"),
        )
    })
}
