use openconsent_core::{ApiVersion, ConsentStatus};
use openconsent_storage::StoreError;
use thiserror::Error;

/// Errors surfaced by the consent lifecycle engine.
///
/// Every variant except `Store` indicates a caller or data error and is
/// non-retryable. `Store` wraps infrastructure failures propagated from the
/// backend unmodified.
#[derive(Debug, Error)]
pub enum ConsentError {
    /// The consent id is absent from the store, or present but soft-deleted.
    #[error("Consent not found: {id}")]
    NotFound { id: String },

    /// The consent exists but belongs to a different API client.
    #[error("Consent {id} does not belong to the calling API client")]
    InvalidPermissions { id: String },

    /// The consent's request version is incompatible with the caller's
    /// bound API version.
    #[error(
        "Consent {id} created under API version {created} cannot be accessed using version {requested}"
    )]
    InvalidApiVersion {
        id: String,
        created: ApiVersion,
        requested: ApiVersion,
    },

    /// The requested status change is not in the consent type's transition
    /// table. The message names both statuses verbatim.
    #[error("Invalid state transition for consent {id}: {current} to {target}")]
    InvalidStateTransition {
        id: String,
        current: ConsentStatus,
        target: ConsentStatus,
    },

    /// A repeat request with a previously-seen idempotency key carried a
    /// payload that does not match the original.
    #[error("Idempotency error on consent {id}: {message}")]
    Idempotency { id: String, message: String },

    /// Structural/field-level violation on input arguments, raised before
    /// any store interaction.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Caller-supplied authorisation data is structurally incomplete for
    /// the consent subtype.
    #[error("Invalid consent decision: {message}")]
    InvalidConsentDecision { message: String },

    /// Infrastructure failure from the storage backend.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ConsentError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn invalid_permissions(id: impl Into<String>) -> Self {
        Self::InvalidPermissions { id: id.into() }
    }

    pub fn invalid_api_version(
        id: impl Into<String>,
        created: ApiVersion,
        requested: ApiVersion,
    ) -> Self {
        Self::InvalidApiVersion {
            id: id.into(),
            created,
            requested,
        }
    }

    pub fn invalid_state_transition(
        id: impl Into<String>,
        current: ConsentStatus,
        target: ConsentStatus,
    ) -> Self {
        Self::InvalidStateTransition {
            id: id.into(),
            current,
            target,
        }
    }

    pub fn idempotency(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Idempotency {
            id: id.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_consent_decision(message: impl Into<String>) -> Self {
        Self::InvalidConsentDecision {
            message: message.into(),
        }
    }

    /// The stable error code the HTTP layer maps to a status code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidPermissions { .. } => ErrorCode::InvalidPermissions,
            Self::InvalidApiVersion { .. } => ErrorCode::InvalidApiVersion,
            Self::InvalidStateTransition { .. } => ErrorCode::InvalidStateTransition,
            Self::Idempotency { .. } => ErrorCode::IdempotencyError,
            Self::Validation { .. } => ErrorCode::ValidationError,
            Self::InvalidConsentDecision { .. } => ErrorCode::InvalidConsentDecision,
            Self::Store(_) => ErrorCode::StoreError,
        }
    }

    /// The offending consent id, where one is known.
    pub fn consent_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { id }
            | Self::InvalidPermissions { id }
            | Self::InvalidApiVersion { id, .. }
            | Self::InvalidStateTransition { id, .. }
            | Self::Idempotency { id, .. } => Some(id),
            Self::Validation { .. } | Self::InvalidConsentDecision { .. } | Self::Store(_) => None,
        }
    }
}

/// Stable error codes for the caller-facing error surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotFound,
    InvalidPermissions,
    InvalidApiVersion,
    InvalidStateTransition,
    IdempotencyError,
    ValidationError,
    InvalidConsentDecision,
    StoreError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidPermissions => write!(f, "INVALID_PERMISSIONS"),
            Self::InvalidApiVersion => write!(f, "INVALID_API_VERSION"),
            Self::InvalidStateTransition => write!(f, "INVALID_STATE_TRANSITION"),
            Self::IdempotencyError => write!(f, "IDEMPOTENCY_ERROR"),
            Self::ValidationError => write!(f, "VALIDATION_ERROR"),
            Self::InvalidConsentDecision => write!(f, "INVALID_CONSENT_DECISION"),
            Self::StoreError => write!(f, "STORE_ERROR"),
        }
    }
}

/// Convenience result type for engine operations
pub type Result<T> = std::result::Result<T, ConsentError>;
