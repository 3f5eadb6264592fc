//! # tmdirect
//!
//! Structured object generation for OpenAI-compatible endpoints that ignore
//! structured-output conventions, starting with the TM direct API.
//!
//! The endpoint rejects `max_tokens`, cannot be forced into JSON mode and
//! sometimes answers with a bare array where an object was asked for.
//! tmdirect shapes the request around those quirks and repairs the reply,
//! so callers always get back a JSON object matching their schema along
//! with normalized token usage.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tmdirect = { version = "0.1", features = ["full"] }
//! ```
//!
//! ```ignore
//! use tmdirect::prelude::*;
//! use tmdirect::layer::{LoggingLayer, RetryLayer};
//! use tmdirect::provider::tm_direct;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = tm_direct()
//!     .layer(RetryLayer::new())
//!     .layer(LoggingLayer::new())
//!     .finish();
//!
//! let request = GenerationRequest::new(vec![Message::user("Plan the release")])
//!     .with_schema(serde_json::json!({
//!         "type": "object",
//!         "properties": { "tasks": { "type": "array" } }
//!     }))
//!     .with_object_name("tasks")
//!     .with_command("parse-prd");
//!
//! let result = executor.generate_object(request).await?;
//! println!("{} tokens", result.usage.total_tokens);
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: `openai` and `layers`
//! - `openai`: OpenAI-compatible client via async-openai
//! - `layers`: Built-in layers (logging, retry)
//! - `schema`: Schema introspection for `schemars` schemas
//! - `full`: All features enabled

// Re-export core types and traits
pub use tmdirect_core::*;

// Re-export providers under `provider` module
#[cfg(feature = "tmdirect-provider")]
pub mod provider {
    //! OpenAI-compatible client implementations.
    pub use tmdirect_provider::*;
}

// Re-export layers under `layer` module
#[cfg(feature = "tmdirect-layer")]
pub mod layer {
    //! Built-in client layers.
    pub use tmdirect_layer::*;
}

// Re-export schemars when schema feature is enabled
#[cfg(feature = "schema")]
pub mod schemars {
    pub use ::schemars::*;
}

/// Prelude module for convenient imports
pub mod prelude {
    //! Prelude module containing the most commonly used types and traits.
    //!
    //! ```
    //! use tmdirect::prelude::*;
    //! ```

    pub use crate::{
        EnvSource, GenerationRequest, GenerationResult, Layer, Message, Provider, Result, Role,
        RuntimeExecutor, TmError, Usage,
    };

    #[cfg(feature = "tmdirect-provider")]
    pub use crate::provider::tm_direct;

    #[cfg(feature = "tmdirect-layer")]
    pub use crate::layer::{LoggingLayer, RetryLayer};
}
