//! Strategy layer for provider-specific behaviors.
//!
//! Strategies capture how an endpoint deviates from the OpenAI-compatible
//! defaults: how JSON output is requested and which token-limit parameter
//! it accepts.

pub mod json_output;
pub mod token_param;

pub use json_output::{JsonModeStrategy, JsonOutputStrategy, JsonSchemaStrategy};
pub use token_param::{OmitTokenParam, StandardTokenParam, TokenParam, TokenParamStrategy};
