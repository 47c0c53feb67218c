//! Forwarding of user text to the OpenAI chat completions API.
//!
//! The gateway turns `(text, context)` into a two message exchange, sends it
//! upstream and returns the first reply. Failures are never retried; each one
//! becomes an [`ApiError`] for the current request.
use crate::client::HttpClient;
use crate::errors::ApiError;
use crate::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, UpstreamErrorBody};
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{
        Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use bon::Builder;
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, instrument};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";

/// Upstream bodies larger than this are treated as a failed call.
const MAX_UPSTREAM_BODY_BYTES: usize = 16 * 1024 * 1024;

/// How to reach the completion service. Fixed at process start.
#[derive(Debug, Clone, Builder)]
pub struct CompletionSettings {
    /// Bearer credential. Requests fail with a configuration error while unset.
    #[builder(into)]
    pub api_key: Option<String>,
    #[builder(default = default_base_url())]
    pub base_url: Url,
    #[builder(into, default = DEFAULT_MODEL.to_string())]
    pub model: String,
    /// Upper bound on one upstream round trip, body included.
    pub timeout: Option<Duration>,
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_BASE_URL).expect("default base URL should be valid")
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone)]
pub struct CompletionGateway<T: HttpClient> {
    http_client: T,
    settings: Arc<CompletionSettings>,
}

impl<T: HttpClient + Send + Sync> CompletionGateway<T> {
    pub fn new(http_client: T, settings: CompletionSettings) -> Self {
        Self {
            http_client,
            settings: Arc::new(settings),
        }
    }

    /// Ask the model to reply to `text` with `context` as the system instruction.
    #[instrument(skip_all, fields(model = %self.settings.model))]
    pub async fn complete(&self, text: &str, context: &str) -> Result<String, ApiError> {
        let Some(api_key) = self.settings.api_key.as_deref() else {
            error!("Completion requested but no API key is configured");
            return Err(ApiError::MissingCredential);
        };

        let payload = ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::system(context), ChatMessage::user(text)],
        };
        let body = serde_json::to_vec(&payload).map_err(ApiError::Encode)?;

        let uri = self
            .settings
            .base_url
            .join(CHAT_COMPLETIONS_PATH)
            .map_err(|e| ApiError::Upstream(format!("invalid base URL: {e}")))?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri.as_str())
            .header(AUTHORIZATION, format!("Bearer {api_key}"))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .map_err(|e| ApiError::Upstream(format!("failed to build request: {e}")))?;

        let (status, bytes) = match self.settings.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(req))
                .await
                .map_err(|_| {
                    error!("Upstream call to {} timed out", uri);
                    ApiError::Upstream(format!(
                        "request timed out after {}s",
                        limit.as_secs_f32()
                    ))
                })??,
            None => self.send(req).await?,
        };

        if !status.is_success() {
            let detail = serde_json::from_slice::<UpstreamErrorBody>(&bytes)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            error!(status = %status, "Upstream returned an error: {}", detail);
            return Err(ApiError::Upstream(format!(
                "status code: {}, message: {}",
                status.as_u16(),
                detail
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::Upstream(format!("invalid response body: {e}")))?;

        debug!(choices = completion.choices.len(), "Received completion");

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or(ApiError::EmptyCompletion)
    }

    async fn send(&self, req: Request) -> Result<(StatusCode, Bytes), ApiError> {
        let response = self.http_client.request(req).await.map_err(|e| {
            error!("Error calling completion service: {}", e);
            ApiError::Upstream(e.to_string())
        })?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), MAX_UPSTREAM_BODY_BYTES)
            .await
            .map_err(|e| ApiError::Upstream(format!("failed to read response body: {e}")))?;
        Ok((status, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FailingHttpClient, MockHttpClient, PendingHttpClient};
    use serde_json::json;

    fn settings() -> CompletionSettings {
        CompletionSettings::builder().api_key("sk-test").build()
    }

    fn reply(content: &str) -> String {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network_io() {
        let mock_client = MockHttpClient::new(StatusCode::OK, &reply("Hello"));
        let gateway = CompletionGateway::new(mock_client.clone(), CompletionSettings::default());

        let err = gateway.complete("hi", "").await.unwrap_err();

        assert!(matches!(err, ApiError::MissingCredential));
        assert!(mock_client.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_first_choice_content_is_returned() {
        let mock_client = MockHttpClient::new(StatusCode::OK, &reply("Hello"));
        let gateway = CompletionGateway::new(mock_client.clone(), settings());

        assert_eq!(gateway.complete("hi", "be brief").await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_request_carries_system_then_user_message() {
        let mock_client = MockHttpClient::new(StatusCode::OK, &reply("Hello"));
        let gateway = CompletionGateway::new(
            mock_client.clone(),
            CompletionSettings::builder()
                .api_key("sk-test")
                .base_url("https://llm.example.com/".parse().unwrap())
                .model("test-model")
                .build(),
        );

        gateway.complete("What is up?", "You are terse.").await.unwrap();

        let requests = mock_client.get_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.uri, "https://llm.example.com/v1/chat/completions");

        let auth_header = request
            .headers
            .iter()
            .find(|(key, _)| key == "authorization")
            .map(|(_, value)| value);
        assert_eq!(auth_header, Some(&"Bearer sk-test".to_string()));

        let forwarded: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(
            forwarded,
            json!({
                "model": "test-model",
                "messages": [
                    {"role": "system", "content": "You are terse."},
                    {"role": "user", "content": "What is up?"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_zero_choices_is_an_error() {
        let mock_client = MockHttpClient::new(StatusCode::OK, r#"{"choices": []}"#);
        let gateway = CompletionGateway::new(mock_client, settings());

        let err = gateway.complete("hi", "").await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyCompletion));
    }

    #[tokio::test]
    async fn test_null_content_becomes_empty_reply() {
        let mock_client = MockHttpClient::new(
            StatusCode::OK,
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#,
        );
        let gateway = CompletionGateway::new(mock_client, settings());

        assert_eq!(gateway.complete("hi", "").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_upstream_error_message_is_surfaced() {
        let mock_client = MockHttpClient::new(
            StatusCode::UNAUTHORIZED,
            r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#,
        );
        let gateway = CompletionGateway::new(mock_client, settings());

        let err = gateway.complete("hi", "").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "OpenAI API error: status code: 401, message: Incorrect API key provided"
        );
    }

    #[tokio::test]
    async fn test_unparseable_success_body_is_upstream_error() {
        let mock_client = MockHttpClient::new(StatusCode::OK, "<html>gateway</html>");
        let gateway = CompletionGateway::new(mock_client, settings());

        let err = gateway.complete("hi", "").await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_transport_failure_is_upstream_error() {
        let gateway =
            CompletionGateway::new(FailingHttpClient::new("connection refused"), settings());

        let err = gateway.complete("hi", "").await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API error: connection refused");
    }

    #[tokio::test]
    async fn test_hung_upstream_is_cut_off_by_timeout() {
        let gateway = CompletionGateway::new(
            PendingHttpClient,
            CompletionSettings::builder()
                .api_key("sk-test")
                .timeout(Duration::from_millis(20))
                .build(),
        );

        let err = gateway.complete("hi", "").await.unwrap_err();
        assert!(err.to_string().contains("timed out"), "got {err}");
    }
}
