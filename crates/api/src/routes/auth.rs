//! Authentication routes
//!
//! Registration, login, and the logout acknowledgment. Responses carry the
//! signed token and the public user record; failures stay terse.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use cityflow_auth::{hash_password, verify_password};
use cityflow_types::User;

use crate::error::{ApiError, Result};
use crate::extract::AuthUser;
use crate::state::AppState;

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if !req.email.contains('@') || req.email.len() < 3 {
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let hash =
        hash_password(&req.password).map_err(|_| ApiError::Internal("failed to hash password"))?;

    let user = state.users.create(&req.email, &hash).await?;

    let token = state
        .tokens
        .issue(user.id, &user.email, &user.role)
        .map_err(|_| ApiError::Internal("failed to generate token"))?;

    info!(user_id = %user.id, email = %user.email, "user registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let record = state
        .users
        .by_email(&req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !verify_password(&req.password, &record.password_hash) {
        info!(email = %req.email, "login rejected");
        return Err(ApiError::InvalidCredentials);
    }

    let user = record.user;
    let token = state
        .tokens
        .issue(user.id, &user.email, &user.role)
        .map_err(|_| ApiError::Internal("failed to generate token"))?;

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/logout
///
/// Tokens are stateless, so logout is an acknowledgment: clients discard
/// the token and the server has nothing to revoke.
pub async fn logout(_user: AuthUser) -> Json<serde_json::Value> {
    Json(json!({"message": "logged out"}))
}
