//! Errors surfaced to HTTP callers.
//!
//! Every failure in a request cycle ends up as one of these variants, and each
//! variant maps onto exactly one status code with a short plain-text body.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body could not be decoded into the expected JSON shape.
    #[error("Invalid request body")]
    InvalidBody,

    /// A required string field was absent or empty.
    #[error("Missing '{0}' in request body")]
    MissingField(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Page not found")]
    NotFound,

    /// No credential was configured for the completion service.
    #[error("OpenAI API key not set")]
    MissingCredential,

    /// The completion service could not be reached, or answered with an error.
    #[error("OpenAI API error: {0}")]
    Upstream(String),

    /// The completion service answered successfully but with no choices.
    #[error("No response from OpenAI")]
    EmptyCompletion,

    #[error("Failed to encode JSON")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MissingCredential
            | ApiError::Upstream(_)
            | ApiError::EmptyCompletion
            | ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = ?self, "Request failed with {}", status);
        }
        (status, self.to_string()).into_response()
    }
}
