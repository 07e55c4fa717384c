//! Storage error types for the consent storage abstraction layer.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested consent was not found.
    #[error("Consent not found: {id}")]
    NotFound {
        /// The id of the consent that was not found.
        id: String,
    },

    /// A stale `entity_version` was presented on save.
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// The consent that was being saved.
        id: String,
        /// The entity version the caller held.
        expected: u64,
        /// The entity version currently persisted.
        actual: u64,
    },

    /// Attempted to insert a consent whose id already exists.
    #[error("Consent already exists: {id}")]
    AlreadyExists {
        /// The id of the consent that already exists.
        id: String,
    },

    /// The uniqueness constraint on (api_client_id, idempotency_key) fired.
    #[error("Duplicate idempotency key {idempotency_key} for client {api_client_id}")]
    DuplicateIdempotencyKey {
        /// The owning API client.
        api_client_id: String,
        /// The caller-supplied idempotency key.
        idempotency_key: String,
    },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a new `VersionConflict` error.
    #[must_use]
    pub fn version_conflict(id: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::VersionConflict {
            id: id.into(),
            expected,
            actual,
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::AlreadyExists { id: id.into() }
    }

    /// Creates a new `DuplicateIdempotencyKey` error.
    #[must_use]
    pub fn duplicate_idempotency_key(
        api_client_id: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self::DuplicateIdempotencyKey {
            api_client_id: api_client_id.into(),
            idempotency_key: idempotency_key.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
