use crate::error::{ConsentError, Result};
use openconsent_core::{ConsentEntity, PaymentConsentEntity};

/// Caller-supplied authorisation data common to every consent product.
pub trait AuthoriseArgs: Send + Sync {
    fn consent_id(&self) -> &str;
    fn api_client_id(&self) -> &str;
    fn resource_owner_id(&self) -> &str;
}

/// Authorisation arguments for products with no subtype-specific data
/// (account access, customer info).
#[derive(Debug, Clone)]
pub struct AuthoriseConsentArgs {
    pub consent_id: String,
    pub api_client_id: String,
    pub resource_owner_id: String,
}

impl AuthoriseConsentArgs {
    pub fn new(
        consent_id: impl Into<String>,
        api_client_id: impl Into<String>,
        resource_owner_id: impl Into<String>,
    ) -> Self {
        Self {
            consent_id: consent_id.into(),
            api_client_id: api_client_id.into(),
            resource_owner_id: resource_owner_id.into(),
        }
    }
}

impl AuthoriseArgs for AuthoriseConsentArgs {
    fn consent_id(&self) -> &str {
        &self.consent_id
    }

    fn api_client_id(&self) -> &str {
        &self.api_client_id
    }

    fn resource_owner_id(&self) -> &str {
        &self.resource_owner_id
    }
}

/// Authorisation arguments for payment products: the resource owner picks
/// the debtor account to draw from.
#[derive(Debug, Clone)]
pub struct PaymentAuthoriseArgs {
    pub consent_id: String,
    pub api_client_id: String,
    pub resource_owner_id: String,
    pub debtor_account_id: Option<String>,
}

impl PaymentAuthoriseArgs {
    pub fn new(
        consent_id: impl Into<String>,
        api_client_id: impl Into<String>,
        resource_owner_id: impl Into<String>,
        debtor_account_id: impl Into<String>,
    ) -> Self {
        Self {
            consent_id: consent_id.into(),
            api_client_id: api_client_id.into(),
            resource_owner_id: resource_owner_id.into(),
            debtor_account_id: Some(debtor_account_id.into()),
        }
    }
}

impl AuthoriseArgs for PaymentAuthoriseArgs {
    fn consent_id(&self) -> &str {
        &self.consent_id
    }

    fn api_client_id(&self) -> &str {
        &self.api_client_id
    }

    fn resource_owner_id(&self) -> &str {
        &self.resource_owner_id
    }
}

/// Arguments for the file-payment upload step.
#[derive(Debug, Clone)]
pub struct FileUploadArgs {
    pub consent_id: String,
    pub api_client_id: String,
    pub file_content: String,
    pub file_upload_idempotency_key: String,
}

impl FileUploadArgs {
    pub fn new(
        consent_id: impl Into<String>,
        api_client_id: impl Into<String>,
        file_content: impl Into<String>,
        file_upload_idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            consent_id: consent_id.into(),
            api_client_id: api_client_id.into(),
            file_content: file_content.into(),
            file_upload_idempotency_key: file_upload_idempotency_key.into(),
        }
    }
}

/// Subtype hook that copies product-specific authorisation data into the
/// consent. The only required override point for concrete consent products.
pub trait AuthoriseDataHook<T, A>: Send + Sync {
    /// Applies `args` to `consent` after the status transition has been
    /// validated but before the consent is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::InvalidConsentDecision`] when the supplied
    /// authorisation data is structurally incomplete for the product.
    fn apply(&self, consent: &mut T, args: &A) -> Result<()>;
}

/// Hook for products with no subtype-specific authorisation data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuthoriseHook;

impl<T: ConsentEntity, A: AuthoriseArgs> AuthoriseDataHook<T, A> for NoopAuthoriseHook {
    fn apply(&self, _consent: &mut T, _args: &A) -> Result<()> {
        Ok(())
    }
}

/// Hook for payment products: records the authorised debtor account.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebtorAccountHook;

impl<T: PaymentConsentEntity> AuthoriseDataHook<T, PaymentAuthoriseArgs> for DebtorAccountHook {
    fn apply(&self, consent: &mut T, args: &PaymentAuthoriseArgs) -> Result<()> {
        let account = args.debtor_account_id.as_deref().ok_or_else(|| {
            ConsentError::invalid_consent_decision(
                "payment authorisation is missing the debtor account id",
            )
        })?;
        if account.is_empty() {
            return Err(ConsentError::invalid_consent_decision(
                "payment authorisation carries an empty debtor account id",
            ));
        }
        consent.payment_mut().authorised_debtor_account_id = Some(account.to_string());
        Ok(())
    }
}
