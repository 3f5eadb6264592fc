//! Error types for tmdirect operations.

/// The main error type for tmdirect operations.
#[derive(Debug, thiserror::Error)]
pub enum TmError {
    /// The request is missing required fields or carries out-of-range values
    #[error("Validation error: {0}")]
    Validation(String),

    /// A high-level operation failed; wraps the underlying cause
    #[error("{operation} failed: {source}")]
    Generation {
        operation: &'static str,
        #[source]
        source: Box<TmError>,
    },

    /// Provider-specific errors
    #[error("Provider error: {0}")]
    Provider(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Rate limit errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// The endpoint answered but produced nothing usable as an object
    #[error("No object generated: {0}")]
    NoObjectGenerated(String),

    /// Timeout errors
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors
    #[error("Error: {0}")]
    Other(String),
}

impl TmError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an error as the failure of the named operation.
    ///
    /// Wrapping is idempotent: an error that already is a `Generation` error
    /// is returned unchanged.
    pub fn generation(operation: &'static str, source: TmError) -> Self {
        match source {
            err @ TmError::Generation { .. } => err,
            other => Self::Generation {
                operation,
                source: Box::new(other),
            },
        }
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Self::RateLimit(msg.into())
    }

    /// Create a no-object error
    pub fn no_object(msg: impl Into<String>) -> Self {
        Self::NoObjectGenerated(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// The innermost cause, looking through `Generation` wrappers.
    pub fn root_cause(&self) -> &TmError {
        match self {
            TmError::Generation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Name of the failed operation, if this error was wrapped by one
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            TmError::Generation { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Whether this is (or wraps) a caller-side validation failure
    pub fn is_validation(&self) -> bool {
        matches!(self.root_cause(), TmError::Validation(_))
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.root_cause(),
            TmError::Network(_) | TmError::Timeout(_) | TmError::RateLimit(_)
        )
    }
}

impl From<String> for TmError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for TmError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
