/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register new user
/// - `POST /v1/auth/login` - Login and get a token pair
/// - `POST /v1/auth/logout` - Clear the session (authenticated)
/// - `POST /v1/auth/refresh` - Rotate the token pair

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult},
    response::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use dayplan_shared::{
    auth::password,
    models::user::{CreateUser, PublicUser, User},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 6, message = "Name should be at least 6 characters"))]
    pub fullname: String,

    /// Unique handle
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Password
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Refresh request
///
/// The token is optional at the type level so its absence maps to a 401
/// rather than a body-decoding 400.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token from the previous pair
    pub refresh_token: Option<String>,
}

/// Payload returned by register, login, and refresh
#[derive(Debug, Serialize)]
pub struct SessionPayload {
    /// The authenticated user
    pub user: PublicUser,

    /// Short-lived request credential
    pub access_token: String,

    /// Long-lived rotation credential
    pub refresh_token: String,
}

/// Register a new user
///
/// Hashes the password, stores the account, and opens a session by issuing
/// a token pair.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `409`: Username or email already taken
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<ApiResponse<SessionPayload>> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();
    let username = req.username.trim().to_string();

    if User::find_by_email_or_username(&state.db, &email, &username)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(
            "User with this email or username already exists",
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            fullname: req.fullname.trim().to_string(),
            username,
            email,
            password_hash,
        },
    )
    .await?;

    let pair = state.sessions.issue(&state.db, &user).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created(
        SessionPayload {
            user: user.public(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
        "User registered successfully",
    ))
}

/// Login with email and password
///
/// A successful login overwrites any previously stored refresh token:
/// logging in on a new device ends the old device's session.
///
/// # Errors
///
/// - `422`: Validation failed
/// - `401`: Unknown email or wrong password (indistinguishable on purpose)
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<ApiResponse<SessionPayload>> {
    req.validate()?;

    let email = req.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    let pair = state.sessions.issue(&state.db, &user).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok(
        SessionPayload {
            user: user.public(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
        "Login successful",
    ))
}

/// Logout, clearing the stored refresh token
///
/// Idempotent. Outstanding access tokens keep working until they expire.
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    state.sessions.revoke(&state.db, user.id).await?;

    Ok(ApiResponse::ok(serde_json::json!({}), "User logged out"))
}

/// Rotate a refresh token into a new pair
///
/// The presented token must byte-equal the stored one; a token that was
/// already rotated out is rejected, which turns replay of a captured old
/// token into a visible 401.
///
/// # Errors
///
/// - `401`: Missing, invalid, expired, or already-used refresh token
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<ApiResponse<SessionPayload>> {
    let (pair, user) = state
        .sessions
        .rotate(&state.db, req.refresh_token.as_deref())
        .await?;

    Ok(ApiResponse::ok(
        SessionPayload {
            user: user.public(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        },
        "Access token refreshed",
    ))
}
