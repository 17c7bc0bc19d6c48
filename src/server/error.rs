//! Error-to-HTTP response conversion.
//!
//! Route handlers return `Result<T, ApiError>`; the wrapped [`SearchError`]
//! decides the status code and the JSON body is always `{"error", "code"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booksearch_common::{FetchError, SearchError};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct ApiError(pub SearchError);

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match &self.0 {
            SearchError::Validation(_) => "validation_error",
            SearchError::Upstream {
                cause: FetchError::Timeout(_),
                ..
            } => "upstream_timeout",
            SearchError::Upstream { .. } => "upstream_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.0, "Search failed");
        } else {
            tracing::debug!(status = %status, error = %self.0, "Rejected search");
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
