use crate::error::AppError;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

/// Header set by oauth2-proxy once it has authenticated the caller.
pub const USER_HEADER: &str = "x-auth-request-user";

/// Caller identity as forwarded by the authenticating proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Rejects requests that did not come through the proxy with a user.
pub async fn require_user(mut request: Request, next: Next) -> Result<Response, AppError> {
    let username = request
        .headers()
        .get(USER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| AppError::Unauthorized("Missing authenticated user".into()))?;

    debug!("Authenticated via oauth2-proxy: {}", username);
    request
        .extensions_mut()
        .insert(AuthenticatedUser { username });

    Ok(next.run(request).await)
}
