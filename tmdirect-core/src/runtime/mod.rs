//! Runtime layer for tmdirect.
//!
//! The runtime sits between the high-level `generate_object` API and the
//! low-level provider interface (`chat_completion`). It is responsible for:
//! - Validating requests before any client is built
//! - Resolving connection parameters per call
//! - Applying the provider profile's JSON and token strategies
//! - Normalizing usage and repairing the reply into a JSON object

pub mod executor;

pub use executor::{RuntimeExecutor, RuntimeExecutorBuilder, OBJECT_GENERATION};
