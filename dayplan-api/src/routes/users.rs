/// Profile endpoints
///
/// # Endpoints
///
/// - `GET  /v1/users/me` - Authenticated user's details
/// - `PUT  /v1/users/profile` - Update fullname/username/email
/// - `PUT  /v1/users/profile/password` - Change password
/// - `POST /v1/users/profile/picture` - Upload a profile picture
///
/// All routes sit behind the access-token middleware.

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use dayplan_shared::{
    auth::password,
    models::user::{PublicUser, UpdateProfile, User},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Profile update request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 6, message = "Name should be at least 6 characters"))]
    pub fullname: String,

    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// Password change request
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// The password being replaced
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    /// The replacement
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

/// Fetch the authenticated user's details
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<PublicUser>> {
    Ok(ApiResponse::ok(
        user.public(),
        "User details fetched successfully",
    ))
}

/// Update the authenticated user's profile fields
///
/// # Errors
///
/// - `422`: Validation failed
/// - `409`: New username or email already taken by someone else
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<PublicUser>> {
    req.validate()?;

    let updated = User::update_profile(
        &state.db,
        user.id,
        UpdateProfile {
            fullname: req.fullname.trim().to_string(),
            username: req.username.trim().to_string(),
            email: req.email.trim().to_lowercase(),
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        updated.public(),
        "Profile updated successfully",
    ))
}

/// Change the authenticated user's password
///
/// Verifies the current password before re-hashing. The response tells the
/// client to treat the session as stale and log in again; the stored
/// refresh token itself is left untouched.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `401`: Current password is wrong
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    req.validate()?;

    let valid = password::verify_password(&req.current_password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    let new_hash = password::hash_password(&req.new_password)?;
    let updated = User::set_password_hash(&state.db, user.id, &new_hash).await?;
    if !updated {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "Password changed");

    Ok(ApiResponse::ok(
        serde_json::json!({ "require_relogin": true }),
        "Password changed successfully",
    ))
}

/// Upload a profile picture
///
/// Accepts a multipart form with a `profile_picture` file field, writes the
/// file into the uploads directory under a fresh name, and stores the
/// resulting `/uploads/...` URL on the user.
///
/// # Errors
///
/// - `400`: No file field present, or malformed multipart body
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    mut multipart: Multipart,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let mut stored_name: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("profile_picture") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("picture").to_string();
        let bytes = field.bytes().await?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        let name = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&original_name));

        tokio::fs::create_dir_all(&state.config.api.uploads_dir)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to create uploads dir: {}", e)))?;

        let path = std::path::Path::new(&state.config.api.uploads_dir).join(&name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ApiError::InternalError(format!("Failed to store upload: {}", e)))?;

        stored_name = Some(name);
        break;
    }

    let stored_name =
        stored_name.ok_or_else(|| ApiError::BadRequest("No file uploaded".to_string()))?;
    let url = format!("/uploads/{}", stored_name);

    let updated = User::set_profile_picture(&state.db, user.id, &url)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ApiResponse::ok(
        serde_json::json!({ "profile_picture_url": updated.profile_picture_url }),
        "Profile picture updated successfully",
    ))
}

/// Keeps filenames to a safe character set
///
/// Path separators and anything exotic collapse to '_', so a hostile
/// filename cannot climb out of the uploads directory.
fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "picture".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_passthrough() {
        assert_eq!(sanitize_filename("avatar.png"), "avatar.png");
        assert_eq!(sanitize_filename("my-photo_2.jpeg"), "my-photo_2.jpeg");
    }

    #[test]
    fn test_sanitize_filename_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("a b/c"), "a_b_c");
    }

    #[test]
    fn test_sanitize_filename_empty() {
        assert_eq!(sanitize_filename(""), "picture");
    }
}
