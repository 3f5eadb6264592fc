//! Layer trait and abstractions.
//!
//! Layers wrap a provider with cross-cutting concerns such as logging and
//! retry. Since clients are built per call, layers are applied to the
//! [`ClientFactory`]: every client it builds comes out wrapped.

use crate::config::ResolvedClientConfig;
use crate::error::TmError;
use crate::provider::{ClientFactory, Provider};
use crate::types::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Layer trait for wrapping providers.
pub trait Layer<P: Provider> {
    /// The type of the layered provider
    type LayeredProvider: Provider;

    /// Wrap the inner provider with this layer
    fn layer(&self, inner: P) -> Self::LayeredProvider;
}

/// Helper trait for layered providers.
///
/// Provides forwarding implementations; implementers only override the
/// methods they intercept.
#[async_trait]
pub trait LayeredProvider: Sized + Provider {
    /// The inner provider type
    type Inner: Provider;

    /// Get a reference to the inner provider
    fn inner(&self) -> &Self::Inner;

    /// Default implementation for info - forwards to inner
    fn layered_info(&self) -> Arc<ProviderInfo> {
        self.inner().info()
    }

    /// Default implementation for chat_completion - forwards to inner
    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError> {
        self.inner().chat_completion(req).await
    }
}

/// Macro to implement Provider trait by forwarding to LayeredProvider methods.
#[macro_export]
macro_rules! impl_layered_provider {
    ($type:ty) => {
        #[async_trait::async_trait]
        impl<P: $crate::provider::Provider> $crate::provider::Provider for $type {
            fn info(&self) -> std::sync::Arc<$crate::types::ProviderInfo> {
                $crate::layer::LayeredProvider::layered_info(self)
            }

            async fn chat_completion(
                &self,
                req: $crate::types::ChatCompletionRequest,
            ) -> Result<$crate::types::ChatCompletionResponse, $crate::error::TmError> {
                $crate::layer::LayeredProvider::layered_chat_completion(self, req).await
            }
        }
    };
}

/// A client factory whose clients are wrapped by a layer.
#[derive(Debug, Clone)]
pub struct LayeredFactory<F, L> {
    inner: F,
    layer: L,
}

impl<F, L> LayeredFactory<F, L> {
    pub fn new(inner: F, layer: L) -> Self {
        Self { inner, layer }
    }
}

impl<F, L> ClientFactory for LayeredFactory<F, L>
where
    F: ClientFactory,
    L: Layer<F::Client> + Send + Sync + 'static,
{
    type Client = L::LayeredProvider;

    fn build_client(
        &self,
        info: Arc<ProviderInfo>,
        config: &ResolvedClientConfig,
    ) -> Result<Self::Client, TmError> {
        let client = self.inner.build_client(info, config)?;
        Ok(self.layer.layer(client))
    }
}
