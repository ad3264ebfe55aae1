//! Authenticated user extractor

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use cityflow_auth::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user extractor
///
/// Validates the Bearer token from the `Authorization` header and exposes
/// its claims. Handlers take it as an argument to require auth.
///
/// # Example
///
/// ```ignore
/// async fn handler(user: AuthUser) -> impl IntoResponse {
///     format!("hello, {}", user.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl std::ops::Deref for AuthUser {
    type Target = Claims;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::InvalidToken)?;
        let claims = state
            .tokens
            .validate(token)
            .map_err(|_| ApiError::InvalidToken)?;
        Ok(AuthUser(claims))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
