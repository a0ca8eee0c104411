use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use motorpool_core::UserId;

use crate::context::PrincipalContext;

/// Resolve the caller from `Authorization: Bearer <uuid>`.
///
/// The gateway in front of this service has already verified the token and
/// rewritten it to the bare user id, so the only checks left here are shape
/// checks; anything malformed is a 401.
pub async fn auth_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let user_id: UserId = token.parse().map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(PrincipalContext::new(user_id));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
