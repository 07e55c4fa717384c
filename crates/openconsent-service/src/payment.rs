use crate::args::{AuthoriseDataHook, DebtorAccountHook, PaymentAuthoriseArgs};
use crate::error::{ConsentError, Result};
use crate::service::{ConsentService, VersionAccessPolicy};
use openconsent_core::{ConsentEntity, ConsentType, PaymentConsentEntity, now_utc};
use openconsent_storage::{ConsentStore, PaymentConsentStore, StoreError};
use std::sync::Arc;
use time::Duration;
use tracing::{debug, info};

/// Default lifetime of a creation idempotency key.
pub const DEFAULT_IDEMPOTENCY_KEY_TTL: Duration = Duration::hours(24);

/// Lifecycle engine for payment consent products.
///
/// Wraps the generic [`ConsentService`] and adds the payment-specific
/// behaviour: idempotent creation keyed on `(apiClientId, idempotencyKey)`
/// and single-use consumption after execution.
pub struct PaymentConsentService<T: PaymentConsentEntity> {
    inner: ConsentService<T, PaymentAuthoriseArgs>,
    payment_store: Arc<dyn PaymentConsentStore<T>>,
    idempotency_key_ttl: Duration,
}

impl<T: PaymentConsentEntity> Clone for PaymentConsentService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            payment_store: Arc::clone(&self.payment_store),
            idempotency_key_ttl: self.idempotency_key_ttl,
        }
    }
}

impl<T: PaymentConsentEntity> PaymentConsentService<T> {
    /// Creates an unrestricted (internal) payment service.
    ///
    /// Both arguments are expected to be the same backend coerced to the
    /// two store traits; the split keeps [`ConsentService`] free of the
    /// payment lookup contract.
    pub fn new(
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
        consent_type: ConsentType,
    ) -> Self {
        Self {
            inner: ConsentService::new(store, consent_type, Arc::new(DebtorAccountHook)),
            payment_store,
            idempotency_key_ttl: DEFAULT_IDEMPOTENCY_KEY_TTL,
        }
    }

    #[must_use]
    pub fn with_version_policy(mut self, policy: VersionAccessPolicy) -> Self {
        self.inner = self.inner.with_version_policy(policy);
        self
    }

    #[must_use]
    pub fn with_idempotency_key_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_key_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_authorise_hook(
        mut self,
        hook: Arc<dyn AuthoriseDataHook<T, PaymentAuthoriseArgs>>,
    ) -> Self {
        self.inner = self.inner.with_hook(hook);
        self
    }

    pub fn consent_type(&self) -> ConsentType {
        self.inner.consent_type()
    }

    pub(crate) fn inner(&self) -> &ConsentService<T, PaymentAuthoriseArgs> {
        &self.inner
    }

    /// Persists a new payment consent, replaying instead of duplicating
    /// when the `(apiClientId, idempotencyKey)` pair was already seen.
    ///
    /// A replay with an identical `requestObj` returns the original consent
    /// untouched; a replay with a different payload is an idempotency
    /// error. Concurrent first-time requests race at the store's uniqueness
    /// constraint, and the loser retries once as a lookup.
    pub async fn create_consent(&self, mut consent: T) -> Result<T> {
        let key = consent.payment().idempotency_key.clone();
        if key.is_empty() {
            return Err(ConsentError::validation("idempotencyKey is required"));
        }
        let api_client_id = consent.base().api_client_id.clone();

        let now = now_utc();
        if let Some(existing) = self
            .payment_store
            .find_by_idempotency_data(&api_client_id, &key, now)
            .await?
        {
            return self.replay_or_conflict(existing, &consent);
        }

        consent.payment_mut().idempotency_key_expiration = now + self.idempotency_key_ttl;

        match self.inner.create_consent(consent.clone()).await {
            Ok(stored) => Ok(stored),
            Err(ConsentError::Store(StoreError::DuplicateIdempotencyKey { .. })) => {
                debug!(
                    api_client_id = %api_client_id,
                    "lost creation race on idempotency key, replaying as lookup"
                );
                let existing = self
                    .payment_store
                    .find_by_idempotency_data(&api_client_id, &key, now_utc())
                    .await?
                    .ok_or_else(|| {
                        StoreError::internal("idempotency key vanished during creation race")
                    })?;
                self.replay_or_conflict(existing, &consent)
            }
            Err(err) => Err(err),
        }
    }

    fn replay_or_conflict(&self, existing: T, incoming: &T) -> Result<T> {
        if existing.base().request_obj == incoming.base().request_obj {
            info!(id = %existing.base().id, "idempotent replay of consent creation");
            Ok(existing)
        } else {
            Err(ConsentError::idempotency(
                existing.base().id.clone(),
                "request payload differs from the original request for this idempotency key",
            ))
        }
    }

    /// Marks an executed payment consent as consumed. Legal only from the
    /// authorised status, which makes each payment consent single-use.
    pub async fn consume_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        let mut consent = self.inner.get_consent(id, api_client_id).await?;
        let target = openconsent_core::ConsentStatus::Consumed;
        self.inner.validate_transition(&consent, target)?;

        consent.base_mut().status = target;
        let stored = self.inner.store().save(consent).await?;
        info!(id = %stored.base().id, "consumed consent");
        Ok(stored)
    }

    pub async fn get_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        self.inner.get_consent(id, api_client_id).await
    }

    pub async fn authorise_consent(&self, args: &PaymentAuthoriseArgs) -> Result<T> {
        self.inner.authorise_consent(args).await
    }

    pub async fn reject_consent(
        &self,
        id: &str,
        api_client_id: &str,
        resource_owner_id: &str,
    ) -> Result<T> {
        self.inner.reject_consent(id, api_client_id, resource_owner_id).await
    }

    pub async fn delete_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        self.inner.delete_consent(id, api_client_id).await
    }

    pub async fn delete_consent_for_migration(&self, id: &str) -> Result<()> {
        self.inner.delete_consent_for_migration(id).await
    }

    pub fn can_transition_to_authorised_state(&self, consent: &T) -> bool {
        self.inner.can_transition_to_authorised_state(consent)
    }
}
