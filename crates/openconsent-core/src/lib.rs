pub mod consent;
pub mod consent_type;
pub mod error;
pub mod id;
pub mod state;
pub mod time;
pub mod version;

pub use consent::{
    AccountAccessConsent, ConsentBase, ConsentEntity, CustomerInfoConsent, DomesticPaymentConsent,
    DomesticScheduledPaymentConsent, DomesticStandingOrderConsent, FileFields, FilePaymentConsent,
    FilePaymentConsentEntity, InternationalPaymentConsent, InternationalScheduledPaymentConsent,
    InternationalStandingOrderConsent, PaymentConsentEntity, PaymentFields,
};
pub use consent_type::{ConsentStatus, ConsentType};
pub use error::{CoreError, Result};
pub use id::{generate_intent_id, validate_intent_id};
pub use state::ConsentStateModel;
pub use time::now_utc;
pub use version::{ApiVersion, ApiVersionValidator};
