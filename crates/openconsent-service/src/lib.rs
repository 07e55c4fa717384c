//! Consent lifecycle services
//!
//! The engine layer of the consent store: generic CRUD-with-lifecycle over
//! any [`openconsent_core::ConsentEntity`], plus the payment specialisation
//! (idempotent creation, consumption) and the file-payment upload step.
//! Instances are assembled per deployment by [`ConsentServiceFactory`] from
//! [`ConsentStoreSettings`].

pub mod args;
pub mod error;
pub mod factory;
pub mod file;
pub mod payment;
pub mod service;
pub mod settings;

pub use args::{
    AuthoriseArgs, AuthoriseConsentArgs, AuthoriseDataHook, DebtorAccountHook, FileUploadArgs,
    NoopAuthoriseHook, PaymentAuthoriseArgs,
};
pub use error::{ConsentError, ErrorCode, Result};
pub use factory::ConsentServiceFactory;
pub use file::FilePaymentConsentService;
pub use payment::{DEFAULT_IDEMPOTENCY_KEY_TTL, PaymentConsentService};
pub use service::{ConsentService, VersionAccessPolicy};
pub use settings::{ConsentStoreSettings, SettingsError};
