//! RuntimeExecutor implementation.
//!
//! The executor drives structured object generation against a provider
//! profile: it validates the request, resolves connection parameters,
//! builds a client, shapes the chat completion request with the profile's
//! strategies and repairs the reply into a JSON object.

use crate::config::{EnvSource, ParameterResolver, ProcessEnv};
use crate::error::TmError;
use crate::layer::{Layer, LayeredFactory};
use crate::provider::{ClientFactory, DynClientFactory, Provider, ProviderProfile};
use crate::repair::{into_object, parse_json_payload, wrap_payload};
use crate::strategy::{JsonOutputStrategy, TokenParamStrategy};
use crate::telemetry::{build_context, TelemetrySink, TracingTelemetry, UNKNOWN};
use crate::types::*;
use std::sync::Arc;
use tracing::Instrument;

/// Operation name carried by errors from [`RuntimeExecutor::generate_object`]
pub const OBJECT_GENERATION: &str = "object generation";

/// Builder for composing a profile, a client factory and layers.
///
/// # Example
///
/// ```ignore
/// let executor = RuntimeExecutor::builder(tm_direct_profile(), OpenAiClientFactory)
///     .layer(RetryLayer::new())
///     .layer(LoggingLayer::new())
///     .finish();
/// ```
pub struct RuntimeExecutorBuilder<F> {
    profile: ProviderProfile,
    factory: F,
    env: Arc<dyn EnvSource>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl<F: ClientFactory> RuntimeExecutorBuilder<F> {
    /// Create a new builder
    pub fn new(profile: ProviderProfile, factory: F) -> Self {
        Self {
            profile,
            factory,
            env: Arc::new(ProcessEnv),
            telemetry: Arc::new(TracingTelemetry),
        }
    }

    /// Wrap every client the factory builds with a layer.
    ///
    /// Each call creates a new concrete factory type; the last layer added
    /// is the outermost.
    pub fn layer<L>(self, layer: L) -> RuntimeExecutorBuilder<LayeredFactory<F, L>>
    where
        L: Layer<F::Client> + Send + Sync + 'static,
    {
        RuntimeExecutorBuilder {
            profile: self.profile,
            factory: LayeredFactory::new(self.factory, layer),
            env: self.env,
            telemetry: self.telemetry,
        }
    }

    /// Read configuration from a custom environment instead of the process
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Set the telemetry sink
    pub fn telemetry(mut self, sink: impl TelemetrySink) -> Self {
        self.telemetry = Arc::new(sink);
        self
    }

    /// Override the profile's JSON output strategy
    pub fn json_strategy(mut self, strategy: impl JsonOutputStrategy + 'static) -> Self {
        self.profile.json_output = Arc::new(strategy);
        self
    }

    /// Override the profile's token parameter strategy
    pub fn token_strategy(mut self, strategy: impl TokenParamStrategy + 'static) -> Self {
        self.profile.token_param = Arc::new(strategy);
        self
    }

    /// Finish building and create a RuntimeExecutor
    pub fn finish(self) -> RuntimeExecutor {
        RuntimeExecutor {
            info: Arc::new(self.profile.info()),
            resolver: ParameterResolver::with_env(self.profile.config.clone(), self.env),
            profile: self.profile,
            factory: Arc::new(self.factory),
            telemetry: self.telemetry,
        }
    }
}

/// Runtime executor for structured object generation.
///
/// Holds no per-call state; share it behind an `Arc` and call it
/// concurrently.
pub struct RuntimeExecutor {
    profile: ProviderProfile,
    info: Arc<ProviderInfo>,
    resolver: ParameterResolver<Arc<dyn EnvSource>>,
    factory: Arc<dyn DynClientFactory>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for RuntimeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeExecutor")
            .field("info", &self.info)
            .field("json_output", &self.profile.json_output.name())
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl RuntimeExecutor {
    /// Create a new builder
    pub fn builder<F: ClientFactory>(
        profile: ProviderProfile,
        factory: F,
    ) -> RuntimeExecutorBuilder<F> {
        RuntimeExecutorBuilder::new(profile, factory)
    }

    /// Get provider information
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.info.clone()
    }

    /// Get the provider profile
    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Generate a JSON object for `request.schema`.
    ///
    /// Every failure, including validation, is returned as
    /// [`TmError::Generation`] with operation `"object generation"`; use
    /// [`TmError::is_validation`] to tell caller errors apart.
    pub async fn generate_object(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, TmError> {
        self.try_generate_object(request)
            .await
            .map_err(|e| TmError::generation(OBJECT_GENERATION, e))
    }

    async fn try_generate_object(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, TmError> {
        let (schema, object_name) = validate_request(&request)?;
        let config = self.resolver.resolve(&request)?;
        let provider_name = &self.profile.config.name;

        tracing::debug!(
            "Generating {} object ('{}') with model: {}",
            provider_name,
            object_name,
            config.model_id.as_deref().unwrap_or(UNKNOWN)
        );

        let client = self.factory.build_dyn(self.info.clone(), &config)?;
        let model = config.model_id.clone().ok_or_else(|| {
            TmError::configuration(format!("{provider_name} model id is required"))
        })?;

        let telemetry = Arc::new(build_context(provider_name, Some(&model), &request));
        let span = self.telemetry.configure(&telemetry);

        let mut chat_req = ChatCompletionRequest::new(model.clone(), request.messages.clone());
        let token_param = self.profile.token_param.token_param(request.max_tokens);
        chat_req.max_tokens = token_param.max_tokens;
        if self.profile.config.supports_temperature {
            chat_req.temperature = request.temperature;
        }
        self.profile
            .json_output
            .apply(&mut chat_req, schema, object_name)?;

        let response = match span {
            Some(span) => {
                chat_req.telemetry = Some(telemetry);
                client.chat_completion(chat_req).instrument(span).await?
            }
            None => client.chat_completion(chat_req).await?,
        };

        tracing::debug!(
            "{} generateObject completed successfully for model: {}",
            provider_name,
            model
        );

        let usage = response
            .usage
            .as_ref()
            .map(RawUsage::normalize)
            .unwrap_or_default();
        let text = response
            .first_text()
            .ok_or_else(|| TmError::no_object("no choices in response"))?;
        let payload = parse_json_payload(text)?;
        let object = if self.profile.repair_arrays {
            wrap_payload(payload, schema, object_name)?
        } else {
            into_object(payload, object_name)?
        };

        Ok(GenerationResult {
            object,
            usage,
            model: response.model,
        })
    }
}

/// Check the request before anything touches the network.
///
/// Returns the schema and object name on success.
fn validate_request(
    request: &GenerationRequest,
) -> Result<(&serde_json::Value, &str), TmError> {
    if request.messages.is_empty() {
        return Err(TmError::validation(
            "Invalid or empty messages array provided",
        ));
    }
    if request.messages.iter().any(|m| m.content.is_empty()) {
        return Err(TmError::validation(
            "Invalid message format. Each message must have role and content",
        ));
    }

    let schema = request
        .schema
        .as_ref()
        .filter(|s| !s.is_null())
        .ok_or_else(|| TmError::validation("Schema is required for object generation"))?;
    let object_name = request
        .object_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| TmError::validation("Object name is required for object generation"))?;

    if let Some(temperature) = request.temperature {
        if !(0.0..=1.0).contains(&temperature) {
            return Err(TmError::validation("Temperature must be between 0 and 1"));
        }
    }
    if request.max_tokens == Some(0) {
        return Err(TmError::validation("max_tokens must be greater than zero"));
    }

    Ok((schema, object_name))
}
