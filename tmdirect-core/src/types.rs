//! Core types for tmdirect operations.

use crate::telemetry::TelemetryContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }

    /// Create a new system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }
}

/// A request for a structured object.
///
/// `schema` and `object_name` are optional at the type level because requests
/// usually arrive deserialized from an upstream orchestration layer; their
/// absence is reported as a validation error by the runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Messages in the conversation
    pub messages: Vec<Message>,

    /// JSON schema the produced object must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<serde_json::Value>,

    /// Name of the object, used for tracing and as the repair fallback key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,

    /// Model identifier; falls back to the provider's environment default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    /// Base URL override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Command that issued the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_hash: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief_id: Option<String>,
}

impl GenerationRequest {
    /// Create a new request with messages
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Set the schema
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Set the object name
    pub fn with_object_name(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    /// Set the model identifier
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Set the base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the command name
    pub fn with_command(mut self, command_name: impl Into<String>) -> Self {
        self.command_name = Some(command_name.into());
        self
    }

    /// Set the output type
    pub fn with_output_type(mut self, output_type: impl Into<String>) -> Self {
        self.output_type = Some(output_type.into());
        self
    }

    /// Set the tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the project hash
    pub fn with_project_hash(mut self, project_hash: impl Into<String>) -> Self {
        self.project_hash = Some(project_hash.into());
        self
    }

    /// Set the user id
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the brief id
    pub fn with_brief_id(mut self, brief_id: impl Into<String>) -> Self {
        self.brief_id = Some(brief_id.into());
        self
    }
}

/// Token counts as reported by an endpoint.
///
/// OpenAI-style endpoints report `prompt_tokens`/`completion_tokens`, newer
/// SDKs report `input_tokens`/`output_tokens`; any of them may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawUsage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

impl RawUsage {
    /// Collapse the reported fields into normalized usage.
    ///
    /// Missing counts are 0; a missing total is input + output.
    pub fn normalize(&self) -> Usage {
        let input_tokens = self.input_tokens.or(self.prompt_tokens).unwrap_or(0);
        let output_tokens = self.output_tokens.or(self.completion_tokens).unwrap_or(0);
        let total_tokens = self
            .total_tokens
            .unwrap_or_else(|| input_tokens.saturating_add(output_tokens));

        Usage {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// Finish reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

/// Structured generation result.
///
/// `object` is always a JSON object; bare arrays returned by the endpoint
/// have been re-wrapped before the result is handed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub object: serde_json::Map<String, serde_json::Value>,
    pub usage: Usage,
    pub model: String,
}

/// Provider information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

// ============================================================================
// Chat Completion Types (Provider Interface)
// ============================================================================

/// Response format for chat completions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Plain text response
    Text,
    /// JSON object response (basic JSON mode, no schema validation)
    JsonObject,
    /// JSON Schema response (with strict schema validation)
    JsonSchema {
        name: String,
        schema: serde_json::Value,
        strict: bool,
    },
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    /// Telemetry attached to this call; never sent over the wire
    #[serde(skip)]
    pub telemetry: Option<Arc<TelemetryContext>>,
}

impl ChatCompletionRequest {
    /// Create a new chat completion request
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
            telemetry: None,
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set response format
    pub fn with_response_format(mut self, response_format: ResponseFormat) -> Self {
        self.response_format = Some(response_format);
        self
    }

    /// Attach telemetry
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryContext>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }
}

/// Single choice in chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: Message,
    pub finish_reason: FinishReason,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<RawUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_from_prompt_completion_names() {
        let raw = RawUsage {
            prompt_tokens: Some(10),
            completion_tokens: Some(5),
            ..Default::default()
        };

        assert_eq!(
            raw.normalize(),
            Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            }
        );
    }

    #[test]
    fn test_usage_defaults_to_zero() {
        assert_eq!(RawUsage::default().normalize(), Usage::default());
    }

    #[test]
    fn test_usage_prefers_input_names_and_reported_total() {
        let raw = RawUsage {
            input_tokens: Some(7),
            prompt_tokens: Some(100),
            output_tokens: Some(3),
            total_tokens: Some(12),
            ..Default::default()
        };

        let usage = raw.normalize();
        assert_eq!(usage.input_tokens, 7);
        assert_eq!(usage.output_tokens, 3);
        assert_eq!(usage.total_tokens, 12);
    }

    #[test]
    fn test_raw_usage_uses_snake_case_names() {
        let raw: RawUsage =
            serde_json::from_value(serde_json::json!({"promptTokens": 1})).unwrap();
        assert_eq!(raw, RawUsage::default());

        let raw: RawUsage = serde_json::from_value(
            serde_json::json!({"prompt_tokens": 4, "completion_tokens": 2}),
        )
        .unwrap();
        assert_eq!(raw.normalize().total_tokens, 6);
    }

    #[test]
    fn test_chat_request_serializes_only_wire_fields() {
        let req = ChatCompletionRequest::new("glm-4.7", vec![Message::user("hi")])
            .with_temperature(0.5)
            .with_max_tokens(64)
            .with_response_format(ResponseFormat::JsonObject);

        let json = serde_json::to_value(&req).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();

        assert_eq!(
            keys,
            ["model", "messages", "temperature", "max_tokens", "response_format"]
        );
    }

    #[test]
    fn test_request_deserializes_without_optional_fields() {
        let req: GenerationRequest = serde_json::from_value(serde_json::json!({
            "messages": [{"role": "user", "content": "hi"}]
        }))
        .unwrap();

        assert_eq!(req.messages, vec![Message::user("hi")]);
        assert!(req.schema.is_none());
        assert!(req.object_name.is_none());
    }
}
