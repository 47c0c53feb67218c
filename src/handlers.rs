//! Axum handlers for the public endpoints
use crate::AppState;
use crate::client::HttpClient;
use crate::errors::ApiError;
use crate::models::{MessageBody, ModelRequestBody};
use crate::validation::ValidatedJson;
use axum::{
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

pub const TAGLINE: &str = "generated ui for <i>you</i>, coming soon";

/// Placeholder conversation shown by the frontend until messages are stored somewhere.
/// Each entry is `[sender, body, date, time]`.
pub fn sample_messages() -> BTreeMap<&'static str, [&'static str; 4]> {
    BTreeMap::from([
        (
            "text",
            ["Jody Gillette", "Hey how are you doing?", "6/17/2025", "10:50"],
        ),
        (
            "event",
            ["Jody Gillette", "Free for a call later?", "6/17/2025", "10:50"],
        ),
    ])
}

#[instrument]
pub async fn tagline() -> &'static str {
    TAGLINE
}

#[instrument]
pub async fn get_messages() -> Result<Response, ApiError> {
    let body = serde_json::to_vec(&sample_messages()).map_err(ApiError::Encode)?;
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

/// Accepts a message and drops it. Nothing is stored yet.
#[instrument(skip(body))]
pub async fn set_messages(ValidatedJson(body): ValidatedJson<MessageBody>) -> StatusCode {
    debug!(length = body.text.len(), "Accepted message");
    StatusCode::OK
}

/// Replies to the user's text with the completion model's answer, as plain text.
#[instrument(skip(state, body))]
pub async fn model<T: HttpClient + Clone + Send + Sync + 'static>(
    State(state): State<AppState<T>>,
    ValidatedJson(body): ValidatedJson<ModelRequestBody>,
) -> Result<String, ApiError> {
    info!(
        text_length = body.text.len(),
        context_length = body.context.len(),
        "Received model request"
    );
    state.gateway.complete(&body.text, &body.context).await
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_messages_encode_with_sorted_keys() {
        let encoded = serde_json::to_string(&sample_messages()).unwrap();
        assert_eq!(
            encoded,
            r#"{"event":["Jody Gillette","Free for a call later?","6/17/2025","10:50"],"text":["Jody Gillette","Hey how are you doing?","6/17/2025","10:50"]}"#
        );
    }
}
