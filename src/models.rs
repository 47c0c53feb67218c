//! Request bodies accepted by the public endpoints, and the subset of the OpenAI chat completions
//! wire format the gateway speaks.
use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /model`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelRequestBody {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    /// Used as the system instruction. Absent or null means empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub context: String,
}

/// Body of `POST /message`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MessageBody {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// Frontends send `null` for unset fields; treat it like an absent one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Request body for POST /v1/chat/completions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Response body for POST /v1/chat/completions. Fields we don't read are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    /// Null when the model refused or only called tools.
    pub content: Option<String>,
}

/// The error envelope OpenAI wraps non-2xx responses in.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorBody {
    pub error: UpstreamErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamErrorDetail {
    pub message: String,
}
