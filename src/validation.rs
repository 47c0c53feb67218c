//! Request body validation.
//!
//! Bodies are read as raw bytes and decoded regardless of `Content-Type`, then
//! checked for required fields. Handlers only ever see bodies that passed both
//! steps.
use crate::errors::ApiError;
use crate::models::{MessageBody, ModelRequestBody};
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Presence checks run after a body decodes.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

impl Validate for ModelRequestBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("text", &self.text)
    }
}

impl Validate for MessageBody {
    fn validate(&self) -> Result<(), ApiError> {
        require_text("text", &self.text)
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        return Err(ApiError::MissingField(field));
    }
    Ok(())
}

/// Decode `bytes` as `T` and validate it.
pub fn decode_body<T: DeserializeOwned + Validate>(bytes: &[u8]) -> Result<T, ApiError> {
    let body: T = serde_json::from_slice(bytes).map_err(|e| {
        debug!(error = %e, "Rejecting undecodable request body");
        ApiError::InvalidBody
    })?;
    body.validate()?;
    Ok(body)
}

/// Extractor yielding a decoded and validated JSON body.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::InvalidBody)?;
        decode_body(&bytes).map(ValidatedJson)
    }
}
