//! JSON output strategies for different providers.
//!
//! - JsonSchemaStrategy: endpoints that enforce a strict JSON Schema
//! - JsonModeStrategy: endpoints that only follow prompt instructions (TM direct)

use crate::error::TmError;
use crate::types::{ChatCompletionRequest, Message, ResponseFormat, Role};
use std::fmt::Debug;

/// Strategy for requesting JSON output in a chat completion request.
pub trait JsonOutputStrategy: Send + Sync + Debug {
    /// Get the strategy name for debugging
    fn name(&self) -> &str;

    /// Prepare the request so the model answers with a JSON value for
    /// `schema`, named `object_name`.
    fn apply(
        &self,
        req: &mut ChatCompletionRequest,
        schema: &serde_json::Value,
        object_name: &str,
    ) -> Result<(), TmError>;
}

/// JSON Schema strategy for endpoints that support strict JSON Schema.
#[derive(Debug, Clone)]
pub struct JsonSchemaStrategy {
    /// Whether to enable strict mode
    pub strict: bool,
}

impl JsonSchemaStrategy {
    /// Create a new JSON Schema strategy with strict mode enabled
    pub fn new() -> Self {
        Self { strict: true }
    }

    /// Create a new JSON Schema strategy with configurable strict mode
    pub fn with_strict(strict: bool) -> Self {
        Self { strict }
    }
}

impl Default for JsonSchemaStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputStrategy for JsonSchemaStrategy {
    fn name(&self) -> &str {
        "JsonSchemaStrategy"
    }

    fn apply(
        &self,
        req: &mut ChatCompletionRequest,
        schema: &serde_json::Value,
        object_name: &str,
    ) -> Result<(), TmError> {
        req.response_format = Some(ResponseFormat::JsonSchema {
            name: object_name.to_string(),
            schema: schema.clone(),
            strict: self.strict,
        });

        Ok(())
    }
}

/// Plain JSON mode: the schema is requested through the prompt only.
///
/// The instruction is injected as a leading system message (or appended to
/// the last user message). `response_format` is set to `json_object` only
/// when `send_response_format` is on; endpoints such as TM direct reject
/// or mishandle that parameter.
#[derive(Debug, Clone)]
pub struct JsonModeStrategy {
    /// Inject the instruction as a system message (true) or append it to the
    /// last user message (false)
    pub use_system_message: bool,
    /// Send `response_format: json_object` alongside the instruction
    pub send_response_format: bool,
}

impl JsonModeStrategy {
    /// JSON mode with a system message and `json_object` response format
    pub fn new() -> Self {
        Self {
            use_system_message: true,
            send_response_format: true,
        }
    }

    /// JSON mode without any response format parameter
    pub fn prompt_only() -> Self {
        Self {
            use_system_message: true,
            send_response_format: false,
        }
    }

    /// Create a new JSON Mode strategy with configurable message injection
    pub fn with_system_message(mut self, use_system_message: bool) -> Self {
        self.use_system_message = use_system_message;
        self
    }

    /// Build the JSON instruction for a schema
    pub fn build_json_instruction(
        schema: &serde_json::Value,
        object_name: &str,
    ) -> Result<String, TmError> {
        let schema_str = serde_json::to_string_pretty(schema)?;
        Ok(format!(
            "Generate a valid JSON object for {object_name}.\n\
            Respond with raw JSON only. Do not wrap it in markdown code fences \
            and do not add any text before or after it.\n\
            The JSON must match this schema:\n{schema_str}"
        ))
    }
}

impl Default for JsonModeStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonOutputStrategy for JsonModeStrategy {
    fn name(&self) -> &str {
        "JsonModeStrategy"
    }

    fn apply(
        &self,
        req: &mut ChatCompletionRequest,
        schema: &serde_json::Value,
        object_name: &str,
    ) -> Result<(), TmError> {
        req.response_format = self
            .send_response_format
            .then_some(ResponseFormat::JsonObject);

        let instruction = Self::build_json_instruction(schema, object_name)?;

        if self.use_system_message {
            req.messages.insert(0, Message::system(instruction));
        } else if let Some(last_msg) = req
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::User)
        {
            last_msg.content.push_str("\n\n");
            last_msg.content.push_str(&instruction);
        } else {
            req.messages.push(Message::user(instruction));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"}
            }
        })
    }

    #[test]
    fn test_json_schema_strategy() {
        let strategy = JsonSchemaStrategy::new();
        let mut req = ChatCompletionRequest::new("test-model", vec![]);

        strategy.apply(&mut req, &schema(), "person").unwrap();

        match req.response_format {
            Some(ResponseFormat::JsonSchema {
                name,
                schema: s,
                strict,
            }) => {
                assert_eq!(name, "person");
                assert_eq!(s, schema());
                assert!(strict);
            }
            other => panic!("Expected JsonSchema response format, got {other:?}"),
        }
    }

    #[test]
    fn test_json_mode_strategy() {
        let strategy = JsonModeStrategy::new();
        let mut req = ChatCompletionRequest::new("test-model", vec![Message::user("Hello")]);

        strategy.apply(&mut req, &schema(), "person").unwrap();

        assert_eq!(req.response_format, Some(ResponseFormat::JsonObject));
        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[0].role, Role::System);
        assert!(req.messages[0]
            .content
            .starts_with("Generate a valid JSON object for person."));
    }

    #[test]
    fn test_prompt_only_sends_no_response_format() {
        let strategy = JsonModeStrategy::prompt_only();
        let mut req = ChatCompletionRequest::new("test-model", vec![Message::user("Hello")]);

        strategy.apply(&mut req, &schema(), "person").unwrap();

        assert_eq!(req.response_format, None);
        assert!(req.messages[0].content.contains("markdown code fences"));
        assert_eq!(req.messages[1], Message::user("Hello"));
    }

    #[test]
    fn test_append_to_last_user_message() {
        let strategy = JsonModeStrategy::prompt_only().with_system_message(false);
        let mut req = ChatCompletionRequest::new(
            "test-model",
            vec![
                Message::system("You are a planner"),
                Message::user("first"),
                Message::assistant("ok"),
                Message::user("second"),
            ],
        );

        strategy.apply(&mut req, &schema(), "plan").unwrap();

        assert_eq!(req.messages.len(), 4);
        assert_eq!(req.messages[1].content, "first");
        assert!(req.messages[3]
            .content
            .starts_with("second\n\nGenerate a valid JSON object for plan."));
    }

    #[test]
    fn test_append_without_user_message() {
        let strategy = JsonModeStrategy::prompt_only().with_system_message(false);
        let mut req = ChatCompletionRequest::new("test-model", vec![Message::system("sys")]);

        strategy.apply(&mut req, &schema(), "plan").unwrap();

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.messages[1].role, Role::User);
    }
}
