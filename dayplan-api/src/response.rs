/// The uniform response envelope
///
/// Every successful response has the same shape:
///
/// ```json
/// {
///   "statusCode": 200,
///   "data": { ... },
///   "message": "Tasks fetched successfully",
///   "success": true
/// }
/// ```
///
/// Errors render the same envelope with `success: false` (see
/// [`crate::error::ApiError`]).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Success envelope wrapping a payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// HTTP status code, duplicated into the body for clients that only
    /// look at the payload
    pub status_code: u16,

    /// The payload
    pub data: T,

    /// Human-readable outcome description
    pub message: String,

    /// Always true for this type
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 envelope
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, data, message)
    }

    /// 201 envelope
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::CREATED, data, message)
    }

    /// Envelope with an explicit status
    pub fn with_status(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: true,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
