use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Queue errors
/// - E2xxx: Analytics errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    BadRequest,

    // Queue (E1xxx)
    NoActiveSlots,
    NoAvailableSlot,
    PostNotFound,
    PostNotOwned,
    PostAlreadyPublished,
    SlotAlreadyTaken,
    SlotNotFound,

    // Analytics (E2xxx)
    InvalidDateRange,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::BadRequest => "E0008",

            // Queue
            Self::NoActiveSlots => "E1001",
            Self::NoAvailableSlot => "E1002",
            Self::PostNotFound => "E1003",
            Self::PostNotOwned => "E1004",
            Self::PostAlreadyPublished => "E1005",
            Self::SlotAlreadyTaken => "E1006",
            Self::SlotNotFound => "E1007",

            // Analytics
            Self::InvalidDateRange => "E2001",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidDateRange => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::PostNotFound | Self::SlotNotFound => StatusCode::NOT_FOUND,
            Self::PostNotOwned => StatusCode::FORBIDDEN,
            Self::NoActiveSlots | Self::NoAvailableSlot | Self::PostAlreadyPublished
            | Self::SlotAlreadyTaken => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code carried by a `Known` error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Known { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if status.is_server_error() {
                    tracing::error!(code = code.code(), "{message}");
                }
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new(ErrorCode::InternalError.code(), "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new(ErrorCode::NotFound.code(), "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new(ErrorCode::InternalError.code(), "database error"),
                    ),
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn known_error_uses_code_status() {
        let (status, value) = body_json(AppError::new(
            ErrorCode::NoAvailableSlot,
            "no available slot within 30 days",
        ))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "E1002");
        assert_eq!(value["error"]["message"], "no available slot within 30 days");
        assert!(value["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn details_are_serialized() {
        let (_, value) = body_json(AppError::with_details(
            ErrorCode::PostNotOwned,
            "post does not belong to account",
            serde_json::json!({ "postId": "abc" }),
        ))
        .await;

        assert_eq!(value["error"]["code"], "E1004");
        assert_eq!(value["error"]["details"]["postId"], "abc");
    }

    #[tokio::test]
    async fn diesel_not_found_maps_to_404() {
        let (status, value) = body_json(AppError::Database(diesel::result::Error::NotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(value["error"]["code"], "E0003");
    }

    #[tokio::test]
    async fn internal_hides_cause() {
        let (status, value) = body_json(AppError::Internal(anyhow::anyhow!("pool exhausted"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["error"]["message"], "internal server error");
    }

    #[test]
    fn queue_codes_are_conflicts_or_not_found() {
        assert_eq!(ErrorCode::SlotAlreadyTaken.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::SlotNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::PostNotOwned.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::InvalidDateRange.code(), "E2001");
    }
}
