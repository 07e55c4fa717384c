//! # openconsent-db-memory
//!
//! In-memory storage backend for the OpenConsent store.
//!
//! Implements [`openconsent_storage::ConsentStore`] and
//! [`openconsent_storage::PaymentConsentStore`] on top of a lock-free map,
//! with writes serialized so the `entity_version` compare-and-swap and the
//! `(api_client_id, idempotency_key)` uniqueness constraint hold under
//! concurrent callers. Intended for tests and single-node deployments.

mod store;

pub use store::InMemoryConsentStore;
