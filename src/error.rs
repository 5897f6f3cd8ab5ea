use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errors surfaced at the HTTP boundary. Only two outcomes reach the caller:
/// a 400 with the validation message, or a 500 with a generic message.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn failed(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Failed { message, source: source.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                tracing::debug!(%message, "request rejected");
                (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": message }))).into_response()
            }
            ApiError::Failed { message, source } => {
                tracing::error!(error = ?source, "{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": message }))).into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Attaches the generic failure message for a route to any error.
pub trait OrFail<T> {
    fn or_fail(self, message: &'static str) -> ApiResult<T>;
}

impl<T, E: Into<anyhow::Error>> OrFail<T> for Result<T, E> {
    fn or_fail(self, message: &'static str) -> ApiResult<T> {
        self.map_err(|e| ApiError::failed(message, e))
    }
}
