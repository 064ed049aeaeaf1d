//! API error handling.
//!
//! Translates engine and storage errors into HTTP responses with a stable
//! JSON shape:
//!
//! ```json
//! {
//!   "code": "INSUFFICIENT_STOCK",
//!   "message": "Insufficient stock for ...",
//!   "details": { "productId": "...", "requested": 3, "available": 1 }
//! }
//! ```

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use tindera_db::{EngineError, EngineResult};

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// An engine error paired with its HTTP mapping.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub EngineError);

impl From<tindera_db::DbError> for ApiError {
    fn from(err: tindera_db::DbError) -> Self {
        ApiError(EngineError::Db(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self.0 {
            EngineError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION", None),
            EngineError::UnknownProduct { product_id } => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_PRODUCT",
                Some(json!({ "productId": product_id })),
            ),
            EngineError::InsufficientStock {
                product_id,
                requested,
                available,
            } => (
                StatusCode::CONFLICT,
                "INSUFFICIENT_STOCK",
                Some(json!({
                    "productId": product_id,
                    "requested": requested,
                    "available": available,
                })),
            ),
            EngineError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            EngineError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT", None),
            EngineError::Db(e) => {
                error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", None)
            }
        };

        // Storage internals stay out of client-facing messages.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        let mut body = json!({ "code": code, "message": message });
        if let Some(details) = details {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

/// Runs an engine operation, retrying once after a short backoff when the
/// failure is transient (pool exhaustion, dropped connection). Anything
/// else propagates immediately.
pub async fn retry_transient<T, F, Fut>(op: F) -> ApiResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = EngineResult<T>>,
{
    match op().await {
        Err(EngineError::Db(e)) if e.is_transient() => {
            warn!(error = %e, "Transient storage error, retrying once");
            tokio::time::sleep(Duration::from_millis(50)).await;
            op().await.map_err(ApiError)
        }
        other => other.map_err(ApiError),
    }
}
