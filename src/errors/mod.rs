/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Failures that abort a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no light curve data found for {0}")]
    NotFound(String),
    #[error("light curve retrieval failed: {message}")]
    Retrieval {
        status: Option<u16>,
        message: String,
    },
    #[error("light curve for {0} has no usable flux samples")]
    EmptySeries(String),
    #[error("failed to render light curve: {0}")]
    Render(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PipelineError {
    /// Provider answered, but with data we cannot use
    pub fn malformed(message: impl Into<String>) -> Self {
        PipelineError::Retrieval {
            status: None,
            message: format!("malformed provider data: {}", message.into()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::EmptySeries(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Retrieval { .. } => StatusCode::BAD_GATEWAY,
            PipelineError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "INVALID_INPUT",
            PipelineError::NotFound(_) => "NOT_FOUND",
            PipelineError::EmptySeries(_) => "EMPTY_SERIES",
            PipelineError::Retrieval { status, .. } => match status {
                Some(404) => "UPSTREAM_404",
                Some(429) => "UPSTREAM_429",
                Some(500..=599) => "UPSTREAM_5XX",
                _ => "UPSTREAM_ERROR",
            },
            PipelineError::Render(_) => "RENDER_ERROR",
        }
    }

    /// Whether the caller can fix the request themselves
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Retrieval {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (self.status_code(), Json(error_response)).into_response()
    }
}

/// Type alias for pipeline results
pub type ApiResult<T> = Result<T, PipelineError>;
