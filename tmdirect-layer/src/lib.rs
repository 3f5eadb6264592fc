//! # tmdirect layers
//!
//! Built-in client layers.
//!
//! - `LoggingLayer`: Logs every chat completion with timing and usage
//! - `RetryLayer`: Retries retryable errors with exponential backoff
//!
//! ## Usage
//!
//! ```ignore
//! use tmdirect_layer::{LoggingLayer, RetryLayer};
//! use tmdirect_provider::tm_direct;
//!
//! let executor = tm_direct()
//!     .layer(RetryLayer::new().with_max_retries(3))
//!     .layer(LoggingLayer::new())
//!     .finish();
//! ```

pub mod logging;
pub mod retry;

// Re-exports
pub use logging::{LoggingLayer, LoggingProvider};
pub use retry::{RetryLayer, RetryProvider};
