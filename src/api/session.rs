//! Login and logout endpoints.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use super::{success, ApiResult};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::AppState;

/// Request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

/// POST /api/login - Verify credentials and open a session.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    if !state
        .config
        .credentials
        .verify(&request.username, &request.password)
    {
        tracing::info!(username = %request.username, "Rejected login attempt");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.sessions.create(&request.username).await;
    tracing::info!(username = %request.username, "Session opened");

    success(LoginResponse {
        token,
        username: request.username,
    })
}

/// POST /api/logout - Revoke the presented session token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<()> {
    state.sessions.revoke(&user.token).await;
    tracing::info!(username = %user.username, "Session closed");
    success(())
}
