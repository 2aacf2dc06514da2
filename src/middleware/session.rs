use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{decode_session_token, Principal};
use crate::config;
use crate::error::ApiError;

/// Cookie set by the web frontend after sign-in; API clients use a bearer
/// header instead.
const SESSION_COOKIE: &str = "ah_session";

/// Resolve the authenticated principal from the request's credential
/// material. Absence or an invalid token is a normal outcome, never an
/// error: protected routes decide how to answer.
pub fn resolve_principal(headers: &HeaderMap) -> Option<Principal> {
    let token = bearer_token(headers).or_else(|| cookie_token(headers))?;

    let secret = &config::config().security.jwt_secret;
    match decode_session_token(&token, secret) {
        Ok(principal) => Some(principal),
        Err(reason) => {
            tracing::debug!("Session token rejected: {}", reason);
            None
        }
    }
}

/// Middleware for protected routes: inject the principal or answer 401.
pub async fn require_principal(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = resolve_principal(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    let cookie_str = headers.get("cookie")?.to_str().ok()?;
    cookie_str.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}
