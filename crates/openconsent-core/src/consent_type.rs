use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The consent products supported by the store, one per Open Banking intent type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsentType {
    AccountAccess,
    CustomerInfo,
    DomesticPayment,
    DomesticScheduledPayment,
    DomesticStandingOrder,
    InternationalPayment,
    InternationalScheduledPayment,
    InternationalStandingOrder,
    FilePayment,
}

impl ConsentType {
    /// The intent-id prefix for this consent type. Other parts of the system
    /// infer the consent type from the id alone, so the prefix must be stable.
    pub fn intent_id_prefix(&self) -> &'static str {
        match self {
            ConsentType::AccountAccess => "AAC_",
            ConsentType::CustomerInfo => "CIC_",
            ConsentType::DomesticPayment => "PDC_",
            ConsentType::DomesticScheduledPayment => "PDSC_",
            ConsentType::DomesticStandingOrder => "PDSOC_",
            ConsentType::InternationalPayment => "PIC_",
            ConsentType::InternationalScheduledPayment => "PISC_",
            ConsentType::InternationalStandingOrder => "PISOC_",
            ConsentType::FilePayment => "PFC_",
        }
    }

    /// Whether this type carries the payment-consent field set
    /// (idempotency key, debtor account, charges).
    pub fn is_payment(&self) -> bool {
        !matches!(self, ConsentType::AccountAccess | ConsentType::CustomerInfo)
    }

    /// All supported consent types.
    pub fn all() -> &'static [ConsentType] {
        &[
            ConsentType::AccountAccess,
            ConsentType::CustomerInfo,
            ConsentType::DomesticPayment,
            ConsentType::DomesticScheduledPayment,
            ConsentType::DomesticStandingOrder,
            ConsentType::InternationalPayment,
            ConsentType::InternationalScheduledPayment,
            ConsentType::InternationalStandingOrder,
            ConsentType::FilePayment,
        ]
    }
}

impl fmt::Display for ConsentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsentType::AccountAccess => "AccountAccessConsent",
            ConsentType::CustomerInfo => "CustomerInfoConsent",
            ConsentType::DomesticPayment => "DomesticPaymentConsent",
            ConsentType::DomesticScheduledPayment => "DomesticScheduledPaymentConsent",
            ConsentType::DomesticStandingOrder => "DomesticStandingOrderConsent",
            ConsentType::InternationalPayment => "InternationalPaymentConsent",
            ConsentType::InternationalScheduledPayment => "InternationalScheduledPaymentConsent",
            ConsentType::InternationalStandingOrder => "InternationalStandingOrderConsent",
            ConsentType::FilePayment => "FilePaymentConsent",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ConsentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AccountAccessConsent" => Ok(ConsentType::AccountAccess),
            "CustomerInfoConsent" => Ok(ConsentType::CustomerInfo),
            "DomesticPaymentConsent" => Ok(ConsentType::DomesticPayment),
            "DomesticScheduledPaymentConsent" => Ok(ConsentType::DomesticScheduledPayment),
            "DomesticStandingOrderConsent" => Ok(ConsentType::DomesticStandingOrder),
            "InternationalPaymentConsent" => Ok(ConsentType::InternationalPayment),
            "InternationalScheduledPaymentConsent" => Ok(ConsentType::InternationalScheduledPayment),
            "InternationalStandingOrderConsent" => Ok(ConsentType::InternationalStandingOrder),
            "FilePaymentConsent" => Ok(ConsentType::FilePayment),
            _ => Err(CoreError::invalid_consent_type(s)),
        }
    }
}

/// Consent lifecycle status. `Display` renders the exact wire strings used in
/// error messages and persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsentStatus {
    AwaitingUpload,
    AwaitingAuthorisation,
    Authorised,
    Rejected,
    Revoked,
    Consumed,
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConsentStatus::AwaitingUpload => "AwaitingUpload",
            ConsentStatus::AwaitingAuthorisation => "AwaitingAuthorisation",
            ConsentStatus::Authorised => "Authorised",
            ConsentStatus::Rejected => "Rejected",
            ConsentStatus::Revoked => "Revoked",
            ConsentStatus::Consumed => "Consumed",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ConsentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AwaitingUpload" => Ok(ConsentStatus::AwaitingUpload),
            "AwaitingAuthorisation" => Ok(ConsentStatus::AwaitingAuthorisation),
            "Authorised" => Ok(ConsentStatus::Authorised),
            "Rejected" => Ok(ConsentStatus::Rejected),
            "Revoked" => Ok(ConsentStatus::Revoked),
            "Consumed" => Ok(ConsentStatus::Consumed),
            _ => Err(CoreError::invalid_status(s)),
        }
    }
}
