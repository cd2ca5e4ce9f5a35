//! Profile picture API endpoints.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::{success, ApiResult};
use crate::auth::SessionUser;
use crate::errors::AppError;
use crate::models::{UploadPictureRequest, UserProfile};
use crate::AppState;

/// Response body for fetching the profile picture.
#[derive(Debug, Serialize)]
pub struct PictureResponse {
    pub picture: Option<String>,
}

/// POST /api/profile-picture - Upload or replace the session user's picture.
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(request): Json<UploadPictureRequest>,
) -> ApiResult<UserProfile> {
    if request.picture.trim().is_empty() {
        return Err(AppError::Validation("No picture data".to_string()));
    }

    let profile = state
        .repo
        .save_profile_picture(&user.username, &request.picture)
        .await?;
    success(profile)
}

/// GET /api/profile-picture - Get the session user's stored picture, if any.
pub async fn get_profile_picture(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<PictureResponse> {
    let picture = state.repo.get_profile_picture(&user.username).await?;
    success(PictureResponse { picture })
}
