//! Logging layer for provider calls.

use async_trait::async_trait;
use tmdirect_core::error::TmError;
use tmdirect_core::impl_layered_provider;
use tmdirect_core::layer::{Layer, LayeredProvider};
use tmdirect_core::provider::Provider;
use tmdirect_core::types::*;

/// Logging layer that logs every chat completion with timing and usage.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    prefix: String,
}

impl LoggingLayer {
    /// Create a new logging layer
    pub fn new() -> Self {
        Self {
            prefix: "[tmdirect]".to_string(),
        }
    }

    /// Create a logging layer with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for LoggingLayer {
    type LayeredProvider = LoggingProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        LoggingProvider {
            inner,
            prefix: self.prefix.clone(),
        }
    }
}

/// Provider wrapped with logging
#[derive(Debug)]
pub struct LoggingProvider<P> {
    inner: P,
    prefix: String,
}

#[async_trait]
impl<P: Provider> LayeredProvider for LoggingProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError> {
        let function_id = req
            .telemetry
            .as_ref()
            .map(|t| t.function_id.clone())
            .unwrap_or_default();

        tracing::debug!(
            function_id = %function_id,
            "{} chat_completion request: model={}, messages={}, max_tokens={:?}",
            self.prefix,
            req.model,
            req.messages.len(),
            req.max_tokens
        );

        let start = std::time::Instant::now();
        let result = self.inner.chat_completion(req).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(response) => {
                let usage = response
                    .usage
                    .as_ref()
                    .map(RawUsage::normalize)
                    .unwrap_or_default();
                tracing::debug!(
                    function_id = %function_id,
                    "{} chat_completion success: id={}, tokens={}, elapsed={:?}",
                    self.prefix,
                    response.id,
                    usage.total_tokens,
                    elapsed
                );
            }
            Err(e) => {
                tracing::error!(
                    function_id = %function_id,
                    "{} chat_completion error: {}, elapsed={:?}",
                    self.prefix,
                    e,
                    elapsed
                );
            }
        }

        result
    }
}

impl_layered_provider!(LoggingProvider<P>);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Echo;

    #[async_trait]
    impl Provider for Echo {
        fn info(&self) -> Arc<ProviderInfo> {
            Arc::new(ProviderInfo {
                id: "echo".to_string(),
                name: "Echo".to_string(),
            })
        }

        async fn chat_completion(
            &self,
            req: ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, TmError> {
            if req.messages.is_empty() {
                return Err(TmError::provider("no messages"));
            }
            Ok(ChatCompletionResponse {
                id: "echo-1".to_string(),
                model: req.model,
                choices: vec![Choice {
                    index: 0,
                    message: req.messages[0].clone(),
                    finish_reason: FinishReason::Stop,
                }],
                usage: None,
                created: None,
            })
        }
    }

    #[tokio::test]
    async fn test_logging_is_transparent() {
        let provider = LoggingLayer::with_prefix("[test]").layer(Echo);

        assert_eq!(provider.info().id, "echo");

        let response = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![Message::user("{}")]))
            .await
            .unwrap();
        assert_eq!(response.first_text(), Some("{}"));

        let err = provider
            .chat_completion(ChatCompletionRequest::new("m", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TmError::Provider(_)));
    }
}
