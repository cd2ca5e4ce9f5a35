//! User profile model.

use serde::{Deserialize, Serialize};

/// Per-username profile row. At most one exists per username; saving is an
/// upsert, never an insert of a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    /// Data-URL encoded image, if one was ever uploaded
    pub profile_picture: Option<String>,
    pub updated_at: String,
}

/// Request body for uploading a profile picture.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadPictureRequest {
    pub picture: String,
}
