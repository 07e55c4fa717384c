use crate::args::{AuthoriseArgs, AuthoriseDataHook};
use crate::error::{ConsentError, Result};
use openconsent_core::{
    ApiVersion, ApiVersionValidator, ConsentEntity, ConsentStateModel, ConsentStatus, ConsentType,
    generate_intent_id, validate_intent_id,
};
use openconsent_storage::ConsentStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Version-validation strategy, fixed per service instance at construction.
///
/// Internal (server-to-server) instances are unrestricted; externally-facing
/// instances are bound to exactly one API version. Binding happens in the
/// factory, so no post-construction mutability is needed.
#[derive(Debug, Clone)]
pub enum VersionAccessPolicy {
    Unrestricted,
    Bound {
        version: ApiVersion,
        validator: Arc<ApiVersionValidator>,
    },
}

impl VersionAccessPolicy {
    fn check(&self, consent_id: &str, created: ApiVersion) -> Result<()> {
        match self {
            Self::Unrestricted => Ok(()),
            Self::Bound { version, validator } => {
                if validator.can_access_resource_using_api_version(created, *version) {
                    Ok(())
                } else {
                    Err(ConsentError::invalid_api_version(
                        consent_id, created, *version,
                    ))
                }
            }
        }
    }
}

/// The generic consent lifecycle engine.
///
/// Stateless per call: creates, fetches, authorises, rejects and deletes
/// consents of a single product, enforcing ownership, version gating and the
/// product's [`ConsentStateModel`]. All cross-request coordination is
/// delegated to the backing store.
pub struct ConsentService<T: ConsentEntity, A: AuthoriseArgs> {
    store: Arc<dyn ConsentStore<T>>,
    consent_type: ConsentType,
    state_model: Arc<ConsentStateModel>,
    version_policy: VersionAccessPolicy,
    hook: Arc<dyn AuthoriseDataHook<T, A>>,
}

impl<T: ConsentEntity, A: AuthoriseArgs> Clone for ConsentService<T, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            consent_type: self.consent_type,
            state_model: Arc::clone(&self.state_model),
            version_policy: self.version_policy.clone(),
            hook: Arc::clone(&self.hook),
        }
    }
}

impl<T: ConsentEntity, A: AuthoriseArgs> ConsentService<T, A> {
    /// Creates an unrestricted (internal) service instance.
    pub fn new(
        store: Arc<dyn ConsentStore<T>>,
        consent_type: ConsentType,
        hook: Arc<dyn AuthoriseDataHook<T, A>>,
    ) -> Self {
        Self {
            store,
            consent_type,
            state_model: Arc::new(ConsentStateModel::for_type(consent_type)),
            version_policy: VersionAccessPolicy::Unrestricted,
            hook,
        }
    }

    /// Fixes the version-validation strategy for this instance.
    #[must_use]
    pub fn with_version_policy(mut self, policy: VersionAccessPolicy) -> Self {
        self.version_policy = policy;
        self
    }

    /// Replaces the authorisation-data hook.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn AuthoriseDataHook<T, A>>) -> Self {
        self.hook = hook;
        self
    }

    pub fn consent_type(&self) -> ConsentType {
        self.consent_type
    }

    pub fn state_model(&self) -> &ConsentStateModel {
        &self.state_model
    }

    pub(crate) fn store(&self) -> &Arc<dyn ConsentStore<T>> {
        &self.store
    }

    /// Persists a new consent with the product's initial status and a
    /// server-generated, type-tagged id.
    ///
    /// A caller-supplied id is rejected, with one exception: customer-info
    /// consents may arrive with a pre-assigned `CIC_`-prefixed id, preserved
    /// verbatim.
    pub async fn create_consent(&self, mut consent: T) -> Result<T> {
        if consent.base().api_client_id.is_empty() {
            return Err(ConsentError::validation("apiClientId is required"));
        }
        if consent.consent_type() != self.consent_type {
            return Err(ConsentError::validation(format!(
                "expected a {} but got a {}",
                self.consent_type,
                consent.consent_type()
            )));
        }

        if consent.base().id.is_empty() {
            consent.base_mut().id = generate_intent_id(self.consent_type);
        } else if self.consent_type != ConsentType::CustomerInfo
            || validate_intent_id(&consent.base().id, ConsentType::CustomerInfo).is_err()
        {
            return Err(ConsentError::validation(format!(
                "consent id must not be supplied by the caller: {}",
                consent.base().id
            )));
        }

        let base = consent.base_mut();
        base.status = self.state_model.initial_status();
        base.resource_owner_id = None;
        base.deleted = false;

        let stored = self.store.insert(consent).await?;
        info!(
            id = %stored.base().id,
            api_client_id = %stored.base().api_client_id,
            status = %stored.status(),
            "created consent"
        );
        Ok(stored)
    }

    /// Fetches a consent, enforcing soft-delete visibility, ownership and
    /// the instance's version policy, in that order.
    ///
    /// Every mutating operation re-fetches through this method, so those
    /// rules hold uniformly.
    pub async fn get_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        let consent = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| ConsentError::not_found(id))?;

        if consent.base().deleted {
            debug!(id = %id, "consent is soft-deleted, reporting not found");
            return Err(ConsentError::not_found(id));
        }
        if consent.base().api_client_id != api_client_id {
            warn!(id = %id, api_client_id = %api_client_id, "ownership check failed");
            return Err(ConsentError::invalid_permissions(id));
        }
        self.version_policy
            .check(id, consent.base().request_version)?;
        Ok(consent)
    }

    /// Moves a consent to the authorised status, recording the resource
    /// owner and the product-specific authorisation data.
    pub async fn authorise_consent(&self, args: &A) -> Result<T> {
        let mut consent = self
            .get_consent(args.consent_id(), args.api_client_id())
            .await?;
        let target = self.state_model.authorised_status();
        self.validate_transition(&consent, target)?;

        {
            let base = consent.base_mut();
            base.status = target;
            base.resource_owner_id = Some(args.resource_owner_id().to_string());
        }
        self.hook.apply(&mut consent, args)?;

        let stored = self.store.save(consent).await?;
        info!(id = %stored.base().id, "authorised consent");
        Ok(stored)
    }

    /// Moves a consent to the rejected status, recording the resource owner.
    pub async fn reject_consent(
        &self,
        id: &str,
        api_client_id: &str,
        resource_owner_id: &str,
    ) -> Result<T> {
        let mut consent = self.get_consent(id, api_client_id).await?;
        let target = self.state_model.rejected_status();
        self.validate_transition(&consent, target)?;

        let base = consent.base_mut();
        base.status = target;
        base.resource_owner_id = Some(resource_owner_id.to_string());

        let stored = self.store.save(consent).await?;
        info!(id = %stored.base().id, "rejected consent");
        Ok(stored)
    }

    /// Revokes a consent: status becomes the revoked status and the consent
    /// turns invisible to subsequent reads, while the document survives for
    /// audit trails.
    ///
    /// Revocation is always legal from any live state - this deliberately
    /// bypasses the transition table.
    pub async fn delete_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        let mut consent = self.get_consent(id, api_client_id).await?;

        let base = consent.base_mut();
        base.status = self.state_model.revoked_status();
        base.deleted = true;

        let stored = self.store.save(consent).await?;
        info!(id = %stored.base().id, "revoked consent");
        Ok(stored)
    }

    /// Unconditional hard delete, bypassing ownership and lifecycle checks.
    ///
    /// Reserved for operational data migration; never expose this on a
    /// public-facing surface.
    pub async fn delete_consent_for_migration(&self, id: &str) -> Result<()> {
        self.store.delete_by_id(id).await?;
        warn!(id = %id, "hard-deleted consent for migration");
        Ok(())
    }

    /// Whether the authorised status is reachable from the consent's
    /// current status. Pure predicate, mutates nothing.
    pub fn can_transition_to_authorised_state(&self, consent: &T) -> bool {
        self.state_model.can_transition_to_authorised(consent.status())
    }

    pub(crate) fn validate_transition(&self, consent: &T, target: ConsentStatus) -> Result<()> {
        let current = consent.status();
        if self.state_model.is_valid_transition(current, target) {
            Ok(())
        } else {
            debug!(
                id = %consent.base().id,
                current = %current,
                target = %target,
                "state transition rejected"
            );
            Err(ConsentError::invalid_state_transition(
                consent.base().id.clone(),
                current,
                target,
            ))
        }
    }
}
