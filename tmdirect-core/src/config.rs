//! Provider configuration and connection parameter resolution.
//!
//! Every value is resolved on each call by precedence: explicit request
//! argument, then environment, then provider default. Nothing is cached, so
//! environment changes made by a long-running host are picked up by the
//! next call.

use crate::error::TmError;
use crate::types::GenerationRequest;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;

/// Static description of an OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Short identifier, e.g. `tm-direct`
    pub id: String,
    /// Display name, used in logs and telemetry function ids
    pub name: String,
    /// Environment variable holding the API key
    pub api_key_env_var: String,
    /// Environment variable overriding the base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url_env_var: Option<String>,
    /// Environment variable supplying a default model id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_env_var: Option<String>,
    pub default_base_url: String,
    #[serde(default = "default_true")]
    pub requires_api_key: bool,
    #[serde(default = "default_true")]
    pub supports_temperature: bool,
}

fn default_true() -> bool {
    true
}

/// Source of environment values.
pub trait EnvSource: Send + Sync + Debug {
    fn var(&self, key: &str) -> Option<String>;
}

impl<E: EnvSource + ?Sized> EnvSource for Arc<E> {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}

/// Reads the process environment on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed set of values, populated by the host or by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Connection parameters for one call.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedClientConfig {
    pub base_url: String,
    pub model_id: Option<String>,
    pub api_key: Option<String>,
}

impl Debug for ResolvedClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedClientConfig")
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Empty strings count as unset.
fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Explicit argument, else environment value, else the provider default.
///
/// The URL is not validated; a malformed one surfaces as a connection error.
pub fn resolve_base_url(explicit: Option<&str>, env: Option<&str>, default: &str) -> String {
    present(explicit)
        .or(present(env))
        .unwrap_or(default)
        .to_string()
}

/// Explicit argument, else environment value, else `None`.
pub fn resolve_model_id(explicit: Option<&str>, env: Option<&str>) -> Option<String> {
    present(explicit).or(present(env)).map(str::to_string)
}

/// Resolves connection parameters for a provider against an environment.
#[derive(Debug, Clone)]
pub struct ParameterResolver<E = ProcessEnv> {
    config: ProviderConfig,
    env: E,
}

impl ParameterResolver<ProcessEnv> {
    /// Resolver backed by the process environment
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            env: ProcessEnv,
        }
    }
}

impl<E: EnvSource> ParameterResolver<E> {
    /// Resolver backed by a custom environment
    pub fn with_env(config: ProviderConfig, env: E) -> Self {
        Self { config, env }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn env_var(&self, key: Option<&str>) -> Option<String> {
        key.and_then(|k| self.env.var(k))
    }

    pub fn base_url(&self, explicit: Option<&str>) -> String {
        let env = self.env_var(self.config.base_url_env_var.as_deref());
        resolve_base_url(explicit, env.as_deref(), &self.config.default_base_url)
    }

    pub fn model_id(&self, explicit: Option<&str>) -> Option<String> {
        let env = self.env_var(self.config.model_env_var.as_deref());
        resolve_model_id(explicit, env.as_deref())
    }

    /// Explicit key, else the provider's key variable.
    ///
    /// Fails with a validation error when the provider requires a key and
    /// none is available.
    pub fn api_key(&self, explicit: Option<&str>) -> Result<Option<String>, TmError> {
        let env = self.env_var(Some(&self.config.api_key_env_var));
        let key = present(explicit).or(present(env.as_deref())).map(str::to_string);

        if key.is_none() && self.config.requires_api_key {
            return Err(TmError::validation(format!(
                "{} API key is required",
                self.config.name
            )));
        }
        Ok(key)
    }

    /// Resolve every connection parameter for a request
    pub fn resolve(&self, request: &GenerationRequest) -> Result<ResolvedClientConfig, TmError> {
        Ok(ResolvedClientConfig {
            base_url: self.base_url(request.base_url.as_deref()),
            model_id: self.model_id(request.model_id.as_deref()),
            api_key: self.api_key(request.api_key.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig {
            id: "test".to_string(),
            name: "Test".to_string(),
            api_key_env_var: "TEST_API_KEY".to_string(),
            base_url_env_var: Some("TEST_BASE_URL".to_string()),
            model_env_var: Some("TEST_MODEL".to_string()),
            default_base_url: "https://c".to_string(),
            requires_api_key: true,
            supports_temperature: true,
        }
    }

    #[test]
    fn test_base_url_precedence() {
        assert_eq!(
            resolve_base_url(Some("https://a"), Some("https://b"), "https://c"),
            "https://a"
        );
        assert_eq!(
            resolve_base_url(None, Some("https://b"), "https://c"),
            "https://b"
        );
        assert_eq!(resolve_base_url(None, None, "https://c"), "https://c");
    }

    #[test]
    fn test_empty_values_are_unset() {
        assert_eq!(resolve_base_url(Some(""), Some(""), "https://c"), "https://c");
        assert_eq!(resolve_model_id(Some(""), Some("glm")), Some("glm".to_string()));
    }

    #[test]
    fn test_model_id_precedence() {
        assert_eq!(
            resolve_model_id(Some("explicit"), Some("env")),
            Some("explicit".to_string())
        );
        assert_eq!(resolve_model_id(None, Some("env")), Some("env".to_string()));
        assert_eq!(resolve_model_id(None, None), None);
    }

    #[test]
    fn test_resolver_reads_env() {
        let env = StaticEnv::new()
            .with("TEST_BASE_URL", "https://b")
            .with("TEST_MODEL", "glm-env")
            .with("TEST_API_KEY", "secret");
        let resolver = ParameterResolver::with_env(config(), env);

        let resolved = resolver.resolve(&GenerationRequest::default()).unwrap();
        assert_eq!(resolved.base_url, "https://b");
        assert_eq!(resolved.model_id.as_deref(), Some("glm-env"));
        assert_eq!(resolved.api_key.as_deref(), Some("secret"));

        let req = GenerationRequest::default()
            .with_base_url("https://a")
            .with_model("glm-explicit")
            .with_api_key("override");
        let resolved = resolver.resolve(&req).unwrap();
        assert_eq!(resolved.base_url, "https://a");
        assert_eq!(resolved.model_id.as_deref(), Some("glm-explicit"));
        assert_eq!(resolved.api_key.as_deref(), Some("override"));
    }

    #[test]
    fn test_missing_required_key() {
        let resolver = ParameterResolver::with_env(config(), StaticEnv::new());
        let err = resolver.resolve(&GenerationRequest::default()).unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("Test API key is required"));
    }

    #[test]
    fn test_optional_key() {
        let mut cfg = config();
        cfg.requires_api_key = false;
        let resolver = ParameterResolver::with_env(cfg, StaticEnv::new());

        let resolved = resolver.resolve(&GenerationRequest::default()).unwrap();
        assert_eq!(resolved.api_key, None);
        assert_eq!(resolved.base_url, "https://c");
        assert_eq!(resolved.model_id, None);
    }

    #[test]
    fn test_debug_redacts_key() {
        let resolved = ResolvedClientConfig {
            base_url: "https://a".to_string(),
            model_id: None,
            api_key: Some("sk-very-secret".to_string()),
        };

        let debug = format!("{resolved:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_config_from_json_defaults() {
        let cfg: ProviderConfig = serde_json::from_value(serde_json::json!({
            "id": "x",
            "name": "X",
            "api_key_env_var": "X_KEY",
            "default_base_url": "https://x"
        }))
        .unwrap();

        assert!(cfg.requires_api_key);
        assert!(cfg.supports_temperature);
        assert_eq!(cfg.model_env_var, None);
    }
}
