use crate::consent_type::{ConsentStatus, ConsentType};
use crate::state::ConsentStateModel;
use crate::time::now_utc;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// Bookkeeping fields shared by every consent product.
///
/// `id`, `api_client_id` and `request_version` are immutable after creation;
/// `status` is only mutated through validated transitions in the service
/// layer; `entity_version` is maintained by the store and backs optimistic
/// concurrency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentBase {
    /// Intent id. Empty until the service assigns one at creation time.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "consentType")]
    pub consent_type: ConsentType,
    #[serde(rename = "apiClientId")]
    pub api_client_id: String,
    pub status: ConsentStatus,
    #[serde(rename = "requestVersion")]
    pub request_version: ApiVersion,
    /// The original creation payload, opaque to the engine.
    #[serde(rename = "requestObj")]
    pub request_obj: Value,
    /// The end-user who authorised or rejected the consent; None before that.
    #[serde(rename = "resourceOwnerId")]
    pub resource_owner_id: Option<String>,
    #[serde(rename = "creationDateTime", with = "time::serde::rfc3339")]
    pub creation_date_time: OffsetDateTime,
    #[serde(rename = "statusUpdatedDateTime", with = "time::serde::rfc3339")]
    pub status_updated_date_time: OffsetDateTime,
    /// Optimistic-concurrency counter, incremented by the store on every save.
    #[serde(rename = "entityVersion")]
    pub entity_version: u64,
    /// Soft-delete flag. A deleted consent is invisible to reads but the
    /// document survives for revocation audit trails.
    pub deleted: bool,
}

impl ConsentBase {
    pub fn new(
        consent_type: ConsentType,
        api_client_id: impl Into<String>,
        request_version: ApiVersion,
        request_obj: Value,
    ) -> Self {
        let now = now_utc();
        Self {
            id: String::new(),
            consent_type,
            api_client_id: api_client_id.into(),
            status: ConsentStateModel::for_type(consent_type).initial_status(),
            request_version,
            request_obj,
            resource_owner_id: None,
            creation_date_time: now,
            status_updated_date_time: now,
            entity_version: 0,
            deleted: false,
        }
    }
}

/// Fields carried by every payment consent product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFields {
    #[serde(rename = "idempotencyKey")]
    pub idempotency_key: String,
    #[serde(rename = "idempotencyKeyExpiration", with = "time::serde::rfc3339")]
    pub idempotency_key_expiration: OffsetDateTime,
    /// The debtor account the resource owner selected at authorise time.
    #[serde(rename = "authorisedDebtorAccountId")]
    pub authorised_debtor_account_id: Option<String>,
    /// Opaque pass-through blobs set by the payment plumbing, not the engine.
    pub charges: Option<Value>,
    #[serde(rename = "exchangeRateInformation")]
    pub exchange_rate_information: Option<Value>,
}

impl PaymentFields {
    /// The expiration is a placeholder until the service stamps the
    /// configured TTL at creation time.
    pub fn new(idempotency_key: impl Into<String>) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            idempotency_key_expiration: now_utc(),
            authorised_debtor_account_id: None,
            charges: None,
            exchange_rate_information: None,
        }
    }
}

/// Fields specific to file-payment consents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileFields {
    #[serde(rename = "fileContent")]
    pub file_content: Option<String>,
    #[serde(rename = "fileUploadIdempotencyKey")]
    pub file_upload_idempotency_key: Option<String>,
}

/// A persistable consent entity. The service layer is generic over this
/// trait; concrete products only expose their `ConsentBase`.
pub trait ConsentEntity: Clone + Send + Sync + 'static {
    fn base(&self) -> &ConsentBase;
    fn base_mut(&mut self) -> &mut ConsentBase;

    fn id(&self) -> &str {
        &self.base().id
    }

    fn consent_type(&self) -> ConsentType {
        self.base().consent_type
    }

    fn status(&self) -> ConsentStatus {
        self.base().status
    }

    /// The `(idempotency_key, expiration)` pair for products that carry one.
    ///
    /// Lets storage backends maintain their idempotency uniqueness
    /// constraint without knowing the concrete product.
    fn idempotency_data(&self) -> Option<(&str, OffsetDateTime)> {
        None
    }
}

/// A consent entity carrying the payment field set.
pub trait PaymentConsentEntity: ConsentEntity {
    fn payment(&self) -> &PaymentFields;
    fn payment_mut(&mut self) -> &mut PaymentFields;
}

/// A payment consent entity carrying uploaded file data.
pub trait FilePaymentConsentEntity: PaymentConsentEntity {
    fn file(&self) -> &FileFields;
    fn file_mut(&mut self) -> &mut FileFields;
}

macro_rules! impl_consent_entity {
    ($entity:ty) => {
        impl ConsentEntity for $entity {
            fn base(&self) -> &ConsentBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut ConsentBase {
                &mut self.base
            }
        }
    };
}

macro_rules! impl_payment_consent_entity {
    ($entity:ty) => {
        impl ConsentEntity for $entity {
            fn base(&self) -> &ConsentBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut ConsentBase {
                &mut self.base
            }

            fn idempotency_data(&self) -> Option<(&str, OffsetDateTime)> {
                Some((
                    self.payment.idempotency_key.as_str(),
                    self.payment.idempotency_key_expiration,
                ))
            }
        }

        impl PaymentConsentEntity for $entity {
            fn payment(&self) -> &PaymentFields {
                &self.payment
            }

            fn payment_mut(&mut self) -> &mut PaymentFields {
                &mut self.payment
            }
        }
    };
}

macro_rules! payment_consent {
    ($(#[$doc:meta])* $entity:ident, $consent_type:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $entity {
            #[serde(flatten)]
            pub base: ConsentBase,
            #[serde(flatten)]
            pub payment: PaymentFields,
        }

        impl $entity {
            pub fn new(
                api_client_id: impl Into<String>,
                request_version: ApiVersion,
                request_obj: Value,
                idempotency_key: impl Into<String>,
            ) -> Self {
                Self {
                    base: ConsentBase::new(
                        $consent_type,
                        api_client_id,
                        request_version,
                        request_obj,
                    ),
                    payment: PaymentFields::new(idempotency_key),
                }
            }
        }

        impl_payment_consent_entity!($entity);
    };
}

/// Account-access consent: grants read access to account data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountAccessConsent {
    #[serde(flatten)]
    pub base: ConsentBase,
}

impl AccountAccessConsent {
    pub fn new(
        api_client_id: impl Into<String>,
        request_version: ApiVersion,
        request_obj: Value,
    ) -> Self {
        Self {
            base: ConsentBase::new(
                ConsentType::AccountAccess,
                api_client_id,
                request_version,
                request_obj,
            ),
        }
    }
}

impl_consent_entity!(AccountAccessConsent);

/// Customer-info consent: grants read access to the customer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInfoConsent {
    #[serde(flatten)]
    pub base: ConsentBase,
}

impl CustomerInfoConsent {
    pub fn new(
        api_client_id: impl Into<String>,
        request_version: ApiVersion,
        request_obj: Value,
    ) -> Self {
        Self {
            base: ConsentBase::new(
                ConsentType::CustomerInfo,
                api_client_id,
                request_version,
                request_obj,
            ),
        }
    }

    /// Pre-assigns a caller-supplied intent id. Customer-info is the one
    /// product where a pre-assigned id is accepted at create time, and only
    /// when it carries the `CIC_` prefix.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.base.id = id.into();
        self
    }
}

impl_consent_entity!(CustomerInfoConsent);

payment_consent!(
    /// Domestic single immediate payment consent.
    DomesticPaymentConsent,
    ConsentType::DomesticPayment
);
payment_consent!(
    /// Domestic scheduled payment consent.
    DomesticScheduledPaymentConsent,
    ConsentType::DomesticScheduledPayment
);
payment_consent!(
    /// Domestic standing order consent.
    DomesticStandingOrderConsent,
    ConsentType::DomesticStandingOrder
);
payment_consent!(
    /// International single immediate payment consent.
    InternationalPaymentConsent,
    ConsentType::InternationalPayment
);
payment_consent!(
    /// International scheduled payment consent.
    InternationalScheduledPaymentConsent,
    ConsentType::InternationalScheduledPayment
);
payment_consent!(
    /// International standing order consent.
    InternationalStandingOrderConsent,
    ConsentType::InternationalStandingOrder
);

/// File-payment consent: a bulk payment instruction delivered as a file
/// uploaded between creation and authorisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilePaymentConsent {
    #[serde(flatten)]
    pub base: ConsentBase,
    #[serde(flatten)]
    pub payment: PaymentFields,
    #[serde(flatten)]
    pub file: FileFields,
}

impl FilePaymentConsent {
    pub fn new(
        api_client_id: impl Into<String>,
        request_version: ApiVersion,
        request_obj: Value,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            base: ConsentBase::new(
                ConsentType::FilePayment,
                api_client_id,
                request_version,
                request_obj,
            ),
            payment: PaymentFields::new(idempotency_key),
            file: FileFields::default(),
        }
    }
}

impl_payment_consent_entity!(FilePaymentConsent);

impl FilePaymentConsentEntity for FilePaymentConsent {
    fn file(&self) -> &FileFields {
        &self.file
    }

    fn file_mut(&mut self) -> &mut FileFields {
        &mut self.file
    }
}
