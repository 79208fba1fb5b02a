/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>`; the conversion renders the
/// same envelope as successful responses, with `success: false` and any
/// structured detail (validation field list, overlap list) in `data`.
///
/// # Taxonomy
///
/// - `BadRequest` (400): malformed input, e.g. a bad `HH:mm` string
/// - `Unauthorized` (401): missing/invalid/expired/mismatched credential
/// - `Forbidden` (403): the resource belongs to another user
/// - `NotFound` (404): referenced entity absent
/// - `Conflict` (409): uniqueness or overlap violation, optionally carrying
///   the conflicting task list
/// - `ValidationError` (422): per-field validation failures
/// - `InternalError` (500): unexpected collaborator failure; detail is
///   logged, clients get a generic message

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dayplan_shared::auth::jwt::JwtError;
use dayplan_shared::auth::password::PasswordError;
use dayplan_shared::auth::session::SessionError;
use dayplan_shared::models::task::{TaskError, TimeConflict};
use serde::Serialize;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403) - resource owned by someone else
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409) - duplicate username/email or overlapping task window
    Conflict {
        message: String,
        /// Overlapping tasks, when the conflict is a schedule collision
        conflicts: Vec<TimeConflict>,
    },

    /// Unprocessable entity (422) - validation errors
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

impl ApiError {
    /// Conflict without structured detail (uniqueness violations)
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict {
            message: message.into(),
            conflicts: Vec::new(),
        }
    }
}

/// Validation error detail
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error envelope, mirroring the success envelope's shape
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEnvelope {
    status_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
    message: String,
    success: bool,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict { message, .. } => write!(f, "Conflict: {}", message),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, data) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict { message, conflicts } => {
                let data = if conflicts.is_empty() {
                    None
                } else {
                    Some(serde_json::json!({ "overlaps": conflicts }))
                };
                (StatusCode::CONFLICT, message, data)
            }
            ApiError::ValidationError(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Request validation failed".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorEnvelope {
            status_code: status.as_u16(),
            data,
            message,
            success: false,
        });

        (status, body).into_response()
    }
}

/// Convert sqlx errors to API errors
///
/// Unique constraint violations surface as conflicts so registration and
/// profile updates report "already taken" instead of a 500.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::conflict("Email already in use");
                    }
                    if constraint.contains("username") {
                        return ApiError::conflict("Username already taken");
                    }
                    return ApiError::conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::InternalError(format!("Database error: {}", db_err))
            }
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

/// Convert session errors to API errors
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::MissingToken => {
                ApiError::Unauthorized("No refresh token provided".to_string())
            }
            SessionError::InvalidToken(JwtError::Expired) => {
                ApiError::Unauthorized("Token expired".to_string())
            }
            SessionError::InvalidToken(_) => {
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
            SessionError::UnknownUser => ApiError::Unauthorized("User not found".to_string()),
            SessionError::TokenMismatch => {
                ApiError::Unauthorized("Refresh token is expired, used, or invalid".to_string())
            }
            SessionError::Database(e) => e.into(),
        }
    }
}

/// Convert task store errors to API errors
impl From<TaskError> for ApiError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::NotFound => ApiError::NotFound("Task not found".to_string()),
            TaskError::NotOwner => {
                ApiError::Forbidden("Task belongs to another user".to_string())
            }
            TaskError::InvalidWindow => {
                ApiError::BadRequest("End time must be after start time".to_string())
            }
            TaskError::Overlap(conflicts) => ApiError::Conflict {
                message: "Time overlaps with existing tasks".to_string(),
                conflicts,
            },
            TaskError::Database(e) => e.into(),
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            _ => ApiError::Unauthorized(format!("Invalid token: {}", err)),
        }
    }
}

/// Convert request-body validation failures to the field-error list
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();

        ApiError::ValidationError(details)
    }
}

/// Convert multipart decoding failures to bad requests
impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart payload: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_validation_error_display() {
        let errors = vec![
            ValidationErrorDetail {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            },
            ValidationErrorDetail {
                field: "password".to_string(),
                message: "Password too short".to_string(),
            },
        ];

        let err = ApiError::ValidationError(errors);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[test]
    fn test_task_error_mapping() {
        assert!(matches!(
            ApiError::from(TaskError::NotFound),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(TaskError::NotOwner),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(TaskError::InvalidWindow),
            ApiError::BadRequest(_)
        ));

        let overlap = TaskError::Overlap(vec![TimeConflict {
            name: "Standup".to_string(),
            time: "09:00 - 09:15".to_string(),
        }]);
        match ApiError::from(overlap) {
            ApiError::Conflict { conflicts, .. } => assert_eq!(conflicts.len(), 1),
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_session_error_mapping() {
        assert!(matches!(
            ApiError::from(SessionError::MissingToken),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::TokenMismatch),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(SessionError::UnknownUser),
            ApiError::Unauthorized(_)
        ));
    }
}
