//! Retry layer with exponential backoff.
//!
//! Only errors reported as retryable (network, timeout, rate limit) are
//! retried; everything else is returned on the first failure.

use async_trait::async_trait;
use std::time::Duration;
use tmdirect_core::error::TmError;
use tmdirect_core::impl_layered_provider;
use tmdirect_core::layer::{Layer, LayeredProvider};
use tmdirect_core::provider::Provider;
use tmdirect_core::types::*;

/// Retry layer configuration
#[derive(Debug, Clone)]
pub struct RetryLayer {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryLayer {
    /// Create a new retry layer with default settings
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }

    /// Set maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set initial delay
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Set maximum delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set backoff multiplier
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry number `attempt + 1`, capped at `max_delay`
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        if !factor.is_finite() {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Provider> Layer<P> for RetryLayer {
    type LayeredProvider = RetryProvider<P>;

    fn layer(&self, inner: P) -> Self::LayeredProvider {
        RetryProvider {
            inner,
            config: self.clone(),
        }
    }
}

/// Provider wrapped with retry logic
#[derive(Debug)]
pub struct RetryProvider<P> {
    inner: P,
    config: RetryLayer,
}

#[async_trait]
impl<P: Provider> LayeredProvider for RetryProvider<P> {
    type Inner = P;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn layered_chat_completion(
        &self,
        req: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, TmError> {
        let function_id = req.telemetry.as_ref().map(|t| t.function_id.clone());

        let mut attempt = 0;

        loop {
            let err = match self.inner.chat_completion(req.clone()).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            if !err.is_retryable() || attempt >= self.config.max_retries {
                return Err(err);
            }

            let delay = self.config.backoff(attempt);
            tracing::warn!(
                function_id = function_id.as_deref(),
                error = %err,
                "Retrying {} call ({}/{}) in {:?}",
                self.inner.info().name,
                attempt + 1,
                self.config.max_retries,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl_layered_provider!(RetryProvider<P>);
