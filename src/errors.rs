use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the sparrow-lifecycle service
#[derive(Debug, Error)]
pub enum SparrowError {
    // Record store errors
    #[error("Query on '{collection}' failed: {reason}")]
    StoreQuery { collection: String, reason: String },

    #[error("Update of {collection}/{id} failed: {reason}")]
    StoreUpdate {
        collection: String,
        id: String,
        reason: String,
    },

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    // Push gateway errors
    #[error("FCM delivery error: {0}")]
    FcmDelivery(String),

    #[error("Invalid FCM token: {0}")]
    FcmInvalidToken(String),

    // Trigger dispatch errors
    #[error("No handler registered for trigger: {0}")]
    UnhandledTrigger(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // Configuration and setup errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for SparrowError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            SparrowError::RecordNotFound(_) => (StatusCode::NOT_FOUND, "record_not_found"),
            SparrowError::UnhandledTrigger(_) => (StatusCode::NOT_FOUND, "unhandled_trigger"),
            SparrowError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            SparrowError::MalformedRecord { .. } => (StatusCode::BAD_REQUEST, "malformed_record"),

            // Everything else is retryable from the caller's point of view
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type SparrowResult<T> = Result<T, SparrowError>;

// Helper functions for creating common errors
impl SparrowError {
    pub fn query_failed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        SparrowError::StoreQuery {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    pub fn update_failed(
        collection: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        SparrowError::StoreUpdate {
            collection: collection.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        SparrowError::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        SparrowError::BadRequest(msg.into())
    }

    pub fn record_not_found(path: impl Into<String>) -> Self {
        SparrowError::RecordNotFound(path.into())
    }
}
