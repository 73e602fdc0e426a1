// Top-level handler error type: maps `a2a_core::Error` (and the handful of
// gateway-local failure modes) onto HTTP status codes. Handlers return
// `Result<T, GatewayError>` and let `?` do the conversion; nothing below this
// module should ever construct a raw `StatusCode` by hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use a2a_core::Error as CoreError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl GatewayError {
    fn status(&self) -> StatusCode {
        match self {
            GatewayError::Core(CoreError::Validation(_)) => StatusCode::BAD_REQUEST,
            GatewayError::Core(CoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            GatewayError::Core(CoreError::Conflict { .. }) => StatusCode::CONFLICT,
            GatewayError::Core(CoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            GatewayError::Core(CoreError::Cancelled(_)) => StatusCode::CONFLICT,
            GatewayError::Core(CoreError::Internal(_))
            | GatewayError::Core(CoreError::Io(_))
            | GatewayError::Core(CoreError::Serde(_))
            | GatewayError::Core(CoreError::Yaml(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "unhandled gateway error");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
