//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Server errors are captured
//! to Sentry before responding; clients get a JSON body without internal
//! details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::DispatchError;

/// Application-level error type for the dispatch service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Dispatch pass could not run.
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Dispatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let event_id = sentry::capture_error(&self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Request error"
        );

        // Don't expose internal error details to clients
        let body = ErrorBody {
            error: "Internal server error".to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    fn unavailable() -> AppError {
        DispatchError::Source(RepositoryError::Unavailable("connection refused".to_string())).into()
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            unavailable().to_string(),
            "Dispatch error: failed to read dispatch data: storage unavailable: connection refused"
        );
    }

    #[tokio::test]
    async fn test_dispatch_error_is_opaque_500() {
        let response = unavailable().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
