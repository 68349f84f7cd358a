use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Failures from one snapshot fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0} is not set.")]
    ConfigMissing(&'static str),

    #[error("Timed out trying to reach Massive screener (over {seconds} seconds).")]
    Timeout { seconds: f64 },

    #[error("Error calling Massive screener: {0}")]
    RequestFailed(String),

    #[error("Unexpected screener response from Massive: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    /// Soft failures can fall back to a response without screener data
    pub fn is_soft(&self) -> bool {
        !matches!(self, FetchError::ConfigMissing(_))
    }
}

/// Errors surfaced by the HTTP layer as `{"detail": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadGateway(String),

    #[error("Invalid or missing API key")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        ApiError::BadGateway(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
