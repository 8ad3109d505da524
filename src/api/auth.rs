use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::db::{AccessRole, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::{Authenticator, Session};
use crate::AppState;

use super::error::{ApiError, ApiJson};

/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let response = Authenticator::new(&state.db, &state.tokens)
        .register(request)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let response = Authenticator::new(&state.db, &state.tokens)
        .login(request)
        .await?;
    Ok(Json(response))
}

/// Extract the bearer token from the Authorization header
fn extract_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
}

async fn resolve_session(state: &AppState, headers: &axum::http::HeaderMap) -> Result<Session, ApiError> {
    let token = extract_token(headers)
        .ok_or_else(|| ApiError::unauthenticated("Not authorized, no token"))?;

    Ok(Authenticator::new(&state.db, &state.tokens)
        .validate_token(token)
        .await?)
}

/// Auth middleware that validates the bearer token and stores the [`Session`]
/// in the request extensions
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let session = resolve_session(&state, request.headers()).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Role gate for owner-only routes. Must run after [`auth_middleware`].
pub async fn require_owner(request: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<Session>()
        .ok_or_else(|| ApiError::unauthenticated("Not authorized, no token"))?;

    Authenticator::require_role(&session.user, AccessRole::Owner)?;
    Ok(next.run(request).await)
}

/// Extractor for the current session.
///
/// Reuses the session stored by [`auth_middleware`] and falls back to
/// validating the header itself.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }
        resolve_session(state, &parts.headers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn test_extract_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_token(&headers), Some("abc"));
    }
}
