//! Token limit parameter strategies.
//!
//! Most OpenAI-compatible endpoints accept `max_tokens`; some reject it
//! outright. The strategy on a provider profile decides what is sent.

use std::fmt::Debug;

/// Token-limit parameters for an outbound request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenParam {
    pub max_tokens: Option<u32>,
}

impl TokenParam {
    /// No token parameter at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.max_tokens.is_none()
    }
}

/// Computes the token parameter for a requested limit.
pub trait TokenParamStrategy: Send + Sync + Debug {
    fn token_param(&self, requested: Option<u32>) -> TokenParam;
}

/// Passes the requested limit through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTokenParam;

impl TokenParamStrategy for StandardTokenParam {
    fn token_param(&self, requested: Option<u32>) -> TokenParam {
        TokenParam {
            max_tokens: requested,
        }
    }
}

/// Never sends a token limit; for endpoints that reject `max_tokens`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OmitTokenParam;

impl TokenParamStrategy for OmitTokenParam {
    fn token_param(&self, _requested: Option<u32>) -> TokenParam {
        TokenParam::empty()
    }
}
