//! Provider traits and the per-endpoint profile.

use crate::config::{ProviderConfig, ResolvedClientConfig};
use crate::error::TmError;
use crate::strategy::{
    JsonModeStrategy, JsonOutputStrategy, OmitTokenParam, StandardTokenParam, TokenParamStrategy,
};
use crate::types::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Core provider trait for chat completion endpoints.
///
/// Providers only issue chat completions. Object generation, validation and
/// response repair are handled by the runtime.
#[async_trait]
pub trait Provider: Send + Sync + Debug + 'static {
    /// Get provider information
    fn info(&self) -> Arc<ProviderInfo>;

    /// Chat completion (non-streaming)
    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError>;
}

#[async_trait]
impl<P: Provider + ?Sized> Provider for Arc<P> {
    fn info(&self) -> Arc<ProviderInfo> {
        (**self).info()
    }

    async fn chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError> {
        (**self).chat_completion(req).await
    }
}

/// Builds a client for a resolved connection.
///
/// Called once per generation so that every call sees the current
/// environment. Implementations reject a config without a model id.
pub trait ClientFactory: Send + Sync + 'static {
    /// The client type produced
    type Client: Provider;

    fn build_client(
        &self,
        info: Arc<ProviderInfo>,
        config: &ResolvedClientConfig,
    ) -> Result<Self::Client, TmError>;
}

/// Object-safe form of [`ClientFactory`], used after building.
pub(crate) trait DynClientFactory: Send + Sync {
    fn build_dyn(
        &self,
        info: Arc<ProviderInfo>,
        config: &ResolvedClientConfig,
    ) -> Result<Arc<dyn Provider>, TmError>;
}

impl<F: ClientFactory> DynClientFactory for F {
    fn build_dyn(
        &self,
        info: Arc<ProviderInfo>,
        config: &ResolvedClientConfig,
    ) -> Result<Arc<dyn Provider>, TmError> {
        Ok(Arc::new(self.build_client(info, config)?))
    }
}

/// How a concrete endpoint deviates from the OpenAI-compatible defaults.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub config: ProviderConfig,
    pub json_output: Arc<dyn JsonOutputStrategy>,
    pub token_param: Arc<dyn TokenParamStrategy>,
    /// Re-wrap bare array replies into an object
    pub repair_arrays: bool,
}

impl ProviderProfile {
    /// Profile with standard token handling, prompt-only JSON mode and no
    /// array repair
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            json_output: Arc::new(JsonModeStrategy::prompt_only()),
            token_param: Arc::new(StandardTokenParam),
            repair_arrays: false,
        }
    }

    /// Set the JSON output strategy
    pub fn with_json_output(mut self, strategy: impl JsonOutputStrategy + 'static) -> Self {
        self.json_output = Arc::new(strategy);
        self
    }

    /// Set the token parameter strategy
    pub fn with_token_param(mut self, strategy: impl TokenParamStrategy + 'static) -> Self {
        self.token_param = Arc::new(strategy);
        self
    }

    /// Enable or disable bare array repair
    pub fn with_array_repair(mut self, enabled: bool) -> Self {
        self.repair_arrays = enabled;
        self
    }

    /// Provider information derived from the config
    pub fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: self.config.id.clone(),
            name: self.config.name.clone(),
        }
    }
}

/// Profile for the TM direct endpoint.
///
/// - `TM_API_KEY`, `TM_BASE_URL` and `TM_MODEL` are read on every call
/// - JSON is requested through the prompt only, with no `response_format`
/// - `max_tokens` is never sent; the endpoint rejects it
/// - bare array replies are wrapped back into the requested object
pub fn tm_direct_profile() -> ProviderProfile {
    ProviderProfile::new(ProviderConfig {
        id: "tm-direct".to_string(),
        name: "TM-Direct".to_string(),
        api_key_env_var: "TM_API_KEY".to_string(),
        base_url_env_var: Some("TM_BASE_URL".to_string()),
        model_env_var: Some("TM_MODEL".to_string()),
        default_base_url: "https://open.bigmodel.cn/api/paas/v4".to_string(),
        requires_api_key: true,
        supports_temperature: true,
    })
    .with_json_output(JsonModeStrategy::prompt_only())
    .with_token_param(OmitTokenParam)
    .with_array_repair(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tm_direct_profile() {
        let profile = tm_direct_profile();

        assert_eq!(profile.info().name, "TM-Direct");
        assert_eq!(profile.json_output.name(), "JsonModeStrategy");
        assert!(profile.token_param.token_param(Some(4096)).is_empty());
        assert!(profile.repair_arrays);
        assert_eq!(
            profile.config.default_base_url,
            "https://open.bigmodel.cn/api/paas/v4"
        );
    }

    #[test]
    fn test_default_profile_passes_token_limit() {
        let profile = ProviderProfile::new(tm_direct_profile().config);
        assert_eq!(
            profile.token_param.token_param(Some(4096)).max_tokens,
            Some(4096)
        );
        assert!(!profile.repair_arrays);
    }
}
