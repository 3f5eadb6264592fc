//! # tmdirect providers
//!
//! Client implementations for OpenAI-compatible endpoints.

pub mod openai;

// Re-exports
pub use openai::{OpenAiClientFactory, OpenAiProvider};

use tmdirect_core::provider::tm_direct_profile;
use tmdirect_core::runtime::{RuntimeExecutor, RuntimeExecutorBuilder};

/// Start building an executor for the TM direct endpoint.
///
/// Connection parameters come from the request or from `TM_API_KEY`,
/// `TM_BASE_URL` and `TM_MODEL`, read on every call.
///
/// # Example
///
/// ```ignore
/// use tmdirect_provider::tm_direct;
///
/// let executor = tm_direct().finish();
/// ```
pub fn tm_direct() -> RuntimeExecutorBuilder<OpenAiClientFactory> {
    RuntimeExecutor::builder(tm_direct_profile(), OpenAiClientFactory)
}
