use thiserror::Error;

/// Core error types for OpenConsent domain operations
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid consent type: {0}")]
    InvalidConsentType(String),

    #[error("Invalid consent status: {0}")]
    InvalidStatus(String),

    #[error("Invalid intent id: {0}")]
    InvalidIntentId(String),

    #[error("Invalid API version: {0}")]
    InvalidApiVersion(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time parsing error: {0}")]
    TimeError(#[from] time::error::Parse),
}

impl CoreError {
    /// Create a new InvalidConsentType error
    pub fn invalid_consent_type(consent_type: impl Into<String>) -> Self {
        Self::InvalidConsentType(consent_type.into())
    }

    /// Create a new InvalidStatus error
    pub fn invalid_status(status: impl Into<String>) -> Self {
        Self::InvalidStatus(status.into())
    }

    /// Create a new InvalidIntentId error
    pub fn invalid_intent_id(id: impl Into<String>) -> Self {
        Self::InvalidIntentId(id.into())
    }

    /// Create a new InvalidApiVersion error
    pub fn invalid_api_version(version: impl Into<String>) -> Self {
        Self::InvalidApiVersion(version.into())
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
