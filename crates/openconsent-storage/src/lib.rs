//! # openconsent-storage
//!
//! Storage abstraction layer for the OpenConsent consent store.
//!
//! This crate defines the traits and errors that all storage backends must
//! implement. It does not contain any implementations - those are provided
//! by separate crates.
//!
//! ## Overview
//!
//! The main trait is [`ConsentStore`], which defines the contract for:
//! - Keyed CRUD with server-assigned bookkeeping
//! - Optimistic concurrency (compare-and-swap on `entity_version`)
//! - Hard deletes for the migration path
//!
//! [`PaymentConsentStore`] extends it with the idempotency-key lookup used
//! by idempotent payment creation.
//!
//! ## Storage Backends
//!
//! To implement a storage backend, implement the [`ConsentStore`] trait:
//!
//! ```ignore
//! use async_trait::async_trait;
//! use openconsent_core::ConsentEntity;
//! use openconsent_storage::{ConsentStore, StoreError};
//!
//! struct MyStore {
//!     // ...
//! }
//!
//! #[async_trait]
//! impl<T: ConsentEntity> ConsentStore<T> for MyStore {
//!     async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
//!         // Implementation
//!     }
//!     // ... other methods
//! }
//! ```

mod error;
mod traits;

pub use error::StoreError;
pub use traits::{ConsentStore, PaymentConsentStore};
