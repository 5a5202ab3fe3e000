//! Mapping of core failures onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{error::StoreError, notify::NotifyError};

/// Result type for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by a route handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    BadRequest(String),
    /// The operator secret was absent or wrong.
    #[error("Forbidden")]
    Forbidden,
    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The core operation succeeded but the code could not be delivered.
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

impl ApiError {
    /// Build a [`ApiError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self { Self::BadRequest(message.into()) }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Pool(_) | StoreError::Database(_)) | Self::Notify(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_owned()
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
            self.to_string()
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(ApiError::bad_request("Missing email."), StatusCode::BAD_REQUEST)]
    #[case(ApiError::Forbidden, StatusCode::FORBIDDEN)]
    #[case(ApiError::NotFound("gone".to_owned()), StatusCode::NOT_FOUND)]
    #[case(StoreError::Validation("x".to_owned()).into(), StatusCode::BAD_REQUEST)]
    #[case(StoreError::NotFound("x".to_owned()).into(), StatusCode::NOT_FOUND)]
    #[case(StoreError::Conflict("x".to_owned()).into(), StatusCode::CONFLICT)]
    #[case(
        StoreError::Database(diesel::result::Error::NotFound).into(),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    #[case(
        NotifyError::Delivery("smtp down".to_owned()).into(),
        StatusCode::INTERNAL_SERVER_ERROR
    )]
    fn maps_status(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response = ApiError::from(NotifyError::Delivery("smtp down".to_owned())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
