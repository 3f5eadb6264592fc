//! OpenAI-compatible client implementation using the async-openai crate.
//!
//! The client only issues chat completions; object generation and response
//! repair live in the runtime. A new client is built for every call by
//! [`OpenAiClientFactory`] from the connection parameters resolved for it.
//!
//! async-openai's built-in backoff is switched off: a rate-limited call
//! fails immediately with [`TmError::RateLimit`], and retrying is left to
//! `RetryLayer`.

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    ResponseFormat as OpenAIResponseFormat,
    ResponseFormatJsonSchema as OpenAIResponseFormatJsonSchema,
};
use async_openai::Client;
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::Arc;
use std::time::Duration;
use tmdirect_core::config::ResolvedClientConfig;
use tmdirect_core::error::TmError;
use tmdirect_core::provider::{ClientFactory, Provider};
use tmdirect_core::types::*;

/// Chat completion client for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    info: Arc<ProviderInfo>,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("info", &self.info)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a client for a resolved connection
    pub fn new(info: Arc<ProviderInfo>, config: &ResolvedClientConfig) -> Self {
        // An empty key keeps async-openai from falling back to OPENAI_API_KEY
        let openai_config = OpenAIConfig::new()
            .with_api_base(config.base_url.clone())
            .with_api_key(config.api_key.clone().unwrap_or_default());

        Self {
            client: Client::with_config(openai_config).with_backoff(no_retry_backoff()),
            info,
        }
    }

    /// Convert our Message type to OpenAI's ChatCompletionRequestMessage
    fn convert_message(msg: &Message) -> Result<ChatCompletionRequestMessage, TmError> {
        let content = msg.content.clone();

        match msg.role {
            Role::System => {
                let msg = ChatCompletionRequestSystemMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        TmError::provider(format!("Failed to build system message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::System(msg))
            }
            Role::User => {
                let msg = ChatCompletionRequestUserMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        TmError::provider(format!("Failed to build user message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::User(msg))
            }
            Role::Assistant => {
                let msg = ChatCompletionRequestAssistantMessageArgs::default()
                    .content(content)
                    .build()
                    .map_err(|e| {
                        TmError::provider(format!("Failed to build assistant message: {}", e))
                    })?;
                Ok(ChatCompletionRequestMessage::Assistant(msg))
            }
        }
    }

    /// Convert our ResponseFormat to OpenAI's ResponseFormat
    fn convert_response_format(format: &ResponseFormat) -> OpenAIResponseFormat {
        match format {
            ResponseFormat::Text => OpenAIResponseFormat::Text,
            ResponseFormat::JsonObject => OpenAIResponseFormat::JsonObject,
            ResponseFormat::JsonSchema {
                name,
                schema,
                strict,
            } => OpenAIResponseFormat::JsonSchema {
                json_schema: OpenAIResponseFormatJsonSchema {
                    name: name.clone(),
                    schema: Some(schema.clone()),
                    strict: Some(*strict),
                    description: None,
                },
            },
        }
    }

    /// Build CreateChatCompletionRequest from our ChatCompletionRequest.
    ///
    /// Optional parameters that are `None` are left out of the request body
    /// entirely.
    fn build_request(req: &ChatCompletionRequest) -> Result<CreateChatCompletionRequest, TmError> {
        let messages = req
            .messages
            .iter()
            .map(Self::convert_message)
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&req.model).messages(messages);

        if let Some(max_tokens) = req.max_tokens {
            #[allow(deprecated)]
            builder.max_tokens(max_tokens);
        }
        if let Some(temperature) = req.temperature {
            builder.temperature(temperature);
        }
        if let Some(response_format) = &req.response_format {
            builder.response_format(Self::convert_response_format(response_format));
        }

        builder
            .build()
            .map_err(|e| TmError::provider(format!("Failed to build request: {}", e)))
    }

    /// Convert OpenAI response to our ChatCompletionResponse
    fn convert_response(
        response: async_openai::types::CreateChatCompletionResponse,
    ) -> ChatCompletionResponse {
        let choices = response
            .choices
            .into_iter()
            .map(|choice| {
                let message = Message {
                    role: match choice.message.role {
                        async_openai::types::Role::System => Role::System,
                        async_openai::types::Role::User => Role::User,
                        _ => Role::Assistant,
                    },
                    content: choice.message.content.unwrap_or_default(),
                };

                let finish_reason = choice
                    .finish_reason
                    .map_or(FinishReason::Stop, |r| match r {
                        async_openai::types::FinishReason::Stop => FinishReason::Stop,
                        async_openai::types::FinishReason::Length => FinishReason::Length,
                        async_openai::types::FinishReason::ToolCalls => FinishReason::ToolCalls,
                        async_openai::types::FinishReason::ContentFilter => {
                            FinishReason::ContentFilter
                        }
                        other => FinishReason::Other(format!("{:?}", other)),
                    });

                Choice {
                    index: choice.index,
                    message,
                    finish_reason,
                }
            })
            .collect();

        let usage = response.usage.map(|u| RawUsage {
            prompt_tokens: Some(u.prompt_tokens),
            completion_tokens: Some(u.completion_tokens),
            total_tokens: Some(u.total_tokens),
            ..Default::default()
        });

        ChatCompletionResponse {
            id: response.id,
            model: response.model,
            choices,
            usage,
            created: Some(response.created as u64),
        }
    }
}

/// Backoff with no retry budget, so the client gives up on the first 429.
fn no_retry_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Classify an async-openai error.
pub(crate) fn map_openai_error(provider: &str, err: OpenAIError) -> TmError {
    match err {
        OpenAIError::Reqwest(e) => TmError::Network(e),
        OpenAIError::ApiError(api) => {
            let kind = api
                .r#type
                .as_deref()
                .or(api.code.as_deref())
                .unwrap_or_default()
                .to_ascii_lowercase();
            let message = format!("{} API error: {}", provider, api.message);

            if kind.contains("rate_limit") || api.message.to_ascii_lowercase().contains("rate limit")
            {
                TmError::rate_limit(message)
            } else if kind.contains("auth") || kind.contains("api_key") {
                TmError::authentication(message)
            } else {
                TmError::provider(message)
            }
        }
        other => TmError::provider(format!("{} API error: {}", provider, other)),
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError> {
        let openai_req = Self::build_request(&req)?;

        let response = self
            .client
            .chat()
            .create(openai_req)
            .await
            .map_err(|e| map_openai_error(&self.info.name, e))?;

        Ok(Self::convert_response(response))
    }
}

/// Builds an [`OpenAiProvider`] for each resolved connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiClientFactory;

impl ClientFactory for OpenAiClientFactory {
    type Client = OpenAiProvider;

    fn build_client(
        &self,
        info: Arc<ProviderInfo>,
        config: &ResolvedClientConfig,
    ) -> Result<OpenAiProvider, TmError> {
        if config.model_id.is_none() {
            return Err(TmError::configuration(format!(
                "{} model id is required",
                info.name
            )));
        }

        tracing::debug!(provider = %info.id, base_url = %config.base_url, "Building client");
        Ok(OpenAiProvider::new(info, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> Arc<ProviderInfo> {
        Arc::new(ProviderInfo {
            id: "tm-direct".to_string(),
            name: "TM-Direct".to_string(),
        })
    }

    fn resolved(model_id: Option<&str>) -> ResolvedClientConfig {
        ResolvedClientConfig {
            base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
            model_id: model_id.map(str::to_string),
            api_key: Some("key".to_string()),
        }
    }

    #[test]
    fn test_factory_rejects_missing_model() {
        let err = OpenAiClientFactory
            .build_client(info(), &resolved(None))
            .unwrap_err();

        assert!(matches!(err, TmError::Configuration(_)));
        assert!(err.to_string().contains("TM-Direct model id is required"));
    }

    #[test]
    fn test_factory_builds_client() {
        let client = OpenAiClientFactory
            .build_client(info(), &resolved(Some("glm-4.7")))
            .unwrap();

        assert_eq!(client.info().id, "tm-direct");
    }

    #[test]
    fn test_client_backoff_has_no_budget() {
        use backoff::backoff::Backoff;

        let mut backoff = no_retry_backoff();
        assert_eq!(backoff.max_elapsed_time, Some(Duration::ZERO));

        std::thread::sleep(Duration::from_millis(1));
        assert_eq!(backoff.next_backoff(), None);
    }

    #[test]
    fn test_build_request_omits_unset_parameters() {
        let req = ChatCompletionRequest::new(
            "glm-4.7",
            vec![Message::system("Return JSON"), Message::user("hi")],
        );

        let body = serde_json::to_value(OpenAiProvider::build_request(&req).unwrap()).unwrap();

        assert_eq!(body["model"], "glm-4.7");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("temperature").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_build_request_maps_parameters() {
        let req = ChatCompletionRequest::new("glm-4.7", vec![Message::user("hi")])
            .with_max_tokens(512)
            .with_temperature(0.3)
            .with_response_format(ResponseFormat::JsonObject);

        let body = serde_json::to_value(OpenAiProvider::build_request(&req).unwrap()).unwrap();

        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["temperature"].as_f64().is_some());
    }

    #[test]
    fn test_map_api_errors() {
        let api = |r#type: Option<&str>, message: &str| {
            OpenAIError::ApiError(async_openai::error::ApiError {
                message: message.to_string(),
                r#type: r#type.map(str::to_string),
                param: None,
                code: None,
            })
        };

        assert!(matches!(
            map_openai_error("TM-Direct", api(Some("rate_limit_exceeded"), "slow down")),
            TmError::RateLimit(_)
        ));
        assert!(matches!(
            map_openai_error("TM-Direct", api(Some("invalid_api_key"), "bad key")),
            TmError::Authentication(_)
        ));

        let err = map_openai_error("TM-Direct", api(None, "model overloaded"));
        assert!(matches!(err, TmError::Provider(_)));
        assert_eq!(
            err.to_string(),
            "Provider error: TM-Direct API error: model overloaded"
        );
    }
}
