use crate::args::{AuthoriseArgs, AuthoriseDataHook, NoopAuthoriseHook};
use crate::payment::PaymentConsentService;
use crate::service::{ConsentService, VersionAccessPolicy};
use crate::settings::ConsentStoreSettings;
use crate::file::FilePaymentConsentService;
use openconsent_core::{
    ApiVersion, ApiVersionValidator, ConsentEntity, ConsentType, FilePaymentConsentEntity,
    PaymentConsentEntity,
};
use openconsent_storage::{ConsentStore, PaymentConsentStore};
use std::sync::Arc;
use time::Duration;

/// Builds consent service instances from deployment settings.
///
/// One factory per deployment; it owns the shared version validator and the
/// idempotency-key TTL, and stamps the right [`VersionAccessPolicy`] onto
/// each instance. Internal instances skip version gating; API instances are
/// bound to one supported version each.
#[derive(Clone)]
pub struct ConsentServiceFactory {
    supported_api_versions: Vec<ApiVersion>,
    validator: Arc<ApiVersionValidator>,
    idempotency_key_ttl: Duration,
}

impl ConsentServiceFactory {
    pub fn new(settings: &ConsentStoreSettings) -> Self {
        Self {
            supported_api_versions: settings.supported_api_versions.clone(),
            validator: Arc::new(settings.validator()),
            idempotency_key_ttl: settings.idempotency_key_ttl(),
        }
    }

    pub fn supported_api_versions(&self) -> &[ApiVersion] {
        &self.supported_api_versions
    }

    fn bound_policy(&self, version: ApiVersion) -> VersionAccessPolicy {
        VersionAccessPolicy::Bound {
            version,
            validator: Arc::clone(&self.validator),
        }
    }

    /// An unrestricted instance for server-to-server callers.
    pub fn internal_service<T: ConsentEntity, A: AuthoriseArgs>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        consent_type: ConsentType,
        hook: Arc<dyn AuthoriseDataHook<T, A>>,
    ) -> ConsentService<T, A> {
        ConsentService::new(store, consent_type, hook)
    }

    /// An instance bound to a single API version.
    pub fn api_service<T: ConsentEntity, A: AuthoriseArgs>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        consent_type: ConsentType,
        hook: Arc<dyn AuthoriseDataHook<T, A>>,
        version: ApiVersion,
    ) -> ConsentService<T, A> {
        ConsentService::new(store, consent_type, hook).with_version_policy(self.bound_policy(version))
    }

    /// One bound instance per supported API version, for deployments that
    /// mount every version side by side.
    pub fn api_services<T: ConsentEntity>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        consent_type: ConsentType,
    ) -> Vec<(ApiVersion, ConsentService<T, crate::args::AuthoriseConsentArgs>)> {
        self.supported_api_versions
            .iter()
            .map(|&version| {
                (
                    version,
                    self.api_service(
                        Arc::clone(&store),
                        consent_type,
                        Arc::new(NoopAuthoriseHook),
                        version,
                    ),
                )
            })
            .collect()
    }

    pub fn internal_payment_service<T: PaymentConsentEntity>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
        consent_type: ConsentType,
    ) -> PaymentConsentService<T> {
        PaymentConsentService::new(store, payment_store, consent_type)
            .with_idempotency_key_ttl(self.idempotency_key_ttl)
    }

    pub fn api_payment_service<T: PaymentConsentEntity>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
        consent_type: ConsentType,
        version: ApiVersion,
    ) -> PaymentConsentService<T> {
        self.internal_payment_service(store, payment_store, consent_type)
            .with_version_policy(self.bound_policy(version))
    }

    pub fn internal_file_payment_service<T: FilePaymentConsentEntity>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
    ) -> FilePaymentConsentService<T> {
        FilePaymentConsentService::new(store, payment_store)
            .with_idempotency_key_ttl(self.idempotency_key_ttl)
    }

    pub fn api_file_payment_service<T: FilePaymentConsentEntity>(
        &self,
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
        version: ApiVersion,
    ) -> FilePaymentConsentService<T> {
        self.internal_file_payment_service(store, payment_store)
            .with_version_policy(self.bound_policy(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AuthoriseConsentArgs;
    use crate::error::ErrorCode;
    use openconsent_core::AccountAccessConsent;
    use openconsent_db_memory::InMemoryConsentStore;
    use serde_json::json;
    use std::str::FromStr;

    fn factory() -> ConsentServiceFactory {
        let settings = ConsentStoreSettings::from_toml(
            r#"
            supported_api_versions = ["v3.1.10", "v4.0.0"]
            minimum_api_version = "v3.1.10"
            "#,
        )
        .unwrap();
        ConsentServiceFactory::new(&settings)
    }

    fn new_consent(version: &str) -> AccountAccessConsent {
        AccountAccessConsent::new(
            "c1",
            ApiVersion::from_str(version).unwrap(),
            json!({"Data": {"Permissions": []}}),
        )
    }

    #[tokio::test]
    async fn test_one_api_instance_per_supported_version() {
        let factory = factory();
        let store: Arc<InMemoryConsentStore<AccountAccessConsent>> =
            Arc::new(InMemoryConsentStore::new());
        let services = factory.api_services(
            store as Arc<dyn ConsentStore<AccountAccessConsent>>,
            ConsentType::AccountAccess,
        );
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].0, ApiVersion::from_str("v3.1.10").unwrap());
        assert_eq!(services[1].0, ApiVersion::from_str("v4.0.0").unwrap());
    }

    #[tokio::test]
    async fn test_bound_instances_share_the_store_with_internal_ones() {
        let factory = factory();
        let store: Arc<InMemoryConsentStore<AccountAccessConsent>> =
            Arc::new(InMemoryConsentStore::new());

        let internal: ConsentService<AccountAccessConsent, AuthoriseConsentArgs> = factory
            .internal_service(
                store.clone(),
                ConsentType::AccountAccess,
                Arc::new(NoopAuthoriseHook),
            );
        let bound: ConsentService<AccountAccessConsent, AuthoriseConsentArgs> = factory
            .api_service(
                store as Arc<dyn ConsentStore<AccountAccessConsent>>,
                ConsentType::AccountAccess,
                Arc::new(NoopAuthoriseHook),
                ApiVersion::from_str("v4.0.0").unwrap(),
            );

        let stored = internal.create_consent(new_consent("v3.1.10")).await.unwrap();
        let fetched = bound.get_consent(&stored.base.id, "c1").await.unwrap();
        assert_eq!(fetched.base.id, stored.base.id);
    }

    #[tokio::test]
    async fn test_floor_applies_to_bound_instances() {
        let factory = factory();
        let store: Arc<InMemoryConsentStore<AccountAccessConsent>> =
            Arc::new(InMemoryConsentStore::new());

        let internal: ConsentService<AccountAccessConsent, AuthoriseConsentArgs> = factory
            .internal_service(
                store.clone(),
                ConsentType::AccountAccess,
                Arc::new(NoopAuthoriseHook),
            );
        // Created below the configured floor of v3.1.10.
        let stored = internal.create_consent(new_consent("v3.1.4")).await.unwrap();

        let bound: ConsentService<AccountAccessConsent, AuthoriseConsentArgs> = factory
            .api_service(
                store as Arc<dyn ConsentStore<AccountAccessConsent>>,
                ConsentType::AccountAccess,
                Arc::new(NoopAuthoriseHook),
                ApiVersion::from_str("v4.0.0").unwrap(),
            );
        let err = bound.get_consent(&stored.base.id, "c1").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidApiVersion);

        // Internal callers are never gated.
        internal.get_consent(&stored.base.id, "c1").await.unwrap();
    }
}
