//! # tmdirect core
//!
//! Core abstractions and runtime for structured object generation against
//! OpenAI-compatible endpoints that do not honor structured-output
//! conventions, such as the TM direct API.
//!
//! A [`ProviderProfile`] describes an endpoint's quirks, a
//! [`ClientFactory`] builds the client for each call, and the
//! [`RuntimeExecutor`] validates, calls and repairs.

pub mod config;
pub mod error;
pub mod layer;
pub mod provider;
pub mod repair;
pub mod runtime;
pub mod schema;
pub mod strategy;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-exports
pub use config::{
    resolve_base_url, resolve_model_id, EnvSource, ParameterResolver, ProcessEnv, ProviderConfig,
    ResolvedClientConfig, StaticEnv,
};
pub use error::TmError;
pub use layer::{Layer, LayeredFactory, LayeredProvider};
pub use provider::{tm_direct_profile, ClientFactory, Provider, ProviderProfile};
pub use runtime::{RuntimeExecutor, RuntimeExecutorBuilder, OBJECT_GENERATION};
pub use schema::{find_array_field, IntrospectionError, SchemaShape};
pub use strategy::{
    JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy, OmitTokenParam, StandardTokenParam,
    TokenParam, TokenParamStrategy,
};
pub use telemetry::{
    build_context, NoTelemetry, TelemetryContext, TelemetryMetadata, TelemetrySink,
    TracingTelemetry,
};
pub use types::*;

/// Result type alias for tmdirect operations
pub type Result<T> = std::result::Result<T, TmError>;
