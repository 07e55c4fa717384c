//! Storage traits for the consent storage abstraction layer.
//!
//! This module defines the contracts every consent storage backend must
//! implement. The engine never talks to a backend directly; it only sees
//! these traits.

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::error::StoreError;
use openconsent_core::{ConsentEntity, PaymentConsentEntity};

/// Keyed CRUD contract for a single consent product.
///
/// The store owns the bookkeeping the service must never fake:
/// `insert` assigns server-side timestamps and `entity_version = 1`, and
/// `save` performs a compare-and-swap on `entity_version` so a write holding
/// a stale entity fails with [`StoreError::VersionConflict`] instead of
/// silently overwriting. Implementations must be thread-safe (`Send + Sync`).
///
/// # Example
///
/// ```ignore
/// use openconsent_storage::{ConsentStore, StoreError};
///
/// async fn load<T: ConsentEntity>(
///     store: &dyn ConsentStore<T>,
///     id: &str,
/// ) -> Result<T, StoreError> {
///     store
///         .find_by_id(id)
///         .await?
///         .ok_or_else(|| StoreError::not_found(id))
/// }
/// ```
#[async_trait]
pub trait ConsentStore<T: ConsentEntity>: Send + Sync {
    /// Looks up a consent by id.
    ///
    /// Returns `None` if the id is absent. Soft-deleted consents are still
    /// returned; hiding them is a service-layer rule.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues, not for missing
    /// consents.
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError>;

    /// Inserts a new consent.
    ///
    /// Stamps `creation_date_time`/`status_updated_date_time` and sets
    /// `entity_version` to 1. The consent's id must already be assigned.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the id is taken, and
    /// `StoreError::DuplicateIdempotencyKey` if the backend maintains an
    /// idempotency uniqueness constraint and it fires.
    async fn insert(&self, consent: T) -> Result<T, StoreError>;

    /// Saves a mutated consent.
    ///
    /// The presented `entity_version` must match the persisted one; on
    /// success the store bumps it by exactly 1 and refreshes
    /// `status_updated_date_time`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the consent does not exist and
    /// `StoreError::VersionConflict` on a stale `entity_version`.
    async fn save(&self, consent: T) -> Result<T, StoreError>;

    /// Removes a consent unconditionally (hard delete).
    ///
    /// Reserved for the migration path; ordinary revocation is a soft
    /// delete performed through `save`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the consent does not exist.
    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError>;

    /// Returns the name of this storage backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Additional lookup contract for payment consent products.
#[async_trait]
pub trait PaymentConsentStore<T: PaymentConsentEntity>: ConsentStore<T> {
    /// Looks up the live consent for `(api_client_id, idempotency_key)`.
    ///
    /// Only matches entries whose `idempotency_key_expiration` is after
    /// `now`; expired keys behave as absent.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure issues.
    async fn find_by_idempotency_data(
        &self,
        api_client_id: &str,
        idempotency_key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<T>, StoreError>;
}
