use crate::args::{FileUploadArgs, PaymentAuthoriseArgs};
use crate::error::{ConsentError, Result};
use crate::payment::PaymentConsentService;
use crate::service::VersionAccessPolicy;
use openconsent_core::{ConsentEntity, ConsentStatus, FilePaymentConsentEntity};
use openconsent_storage::{ConsentStore, PaymentConsentStore};
use std::sync::Arc;
use time::Duration;
use tracing::info;

/// Lifecycle engine for file-payment consents.
///
/// File payments add an upload step between creation and authorisation:
/// the consent is born awaiting its payment file, and only the upload
/// moves it into the awaiting-authorisation status.
pub struct FilePaymentConsentService<T: FilePaymentConsentEntity> {
    inner: PaymentConsentService<T>,
}

impl<T: FilePaymentConsentEntity> Clone for FilePaymentConsentService<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: FilePaymentConsentEntity> FilePaymentConsentService<T> {
    /// Creates an unrestricted (internal) file-payment service.
    pub fn new(
        store: Arc<dyn ConsentStore<T>>,
        payment_store: Arc<dyn PaymentConsentStore<T>>,
    ) -> Self {
        Self {
            inner: PaymentConsentService::new(
                store,
                payment_store,
                openconsent_core::ConsentType::FilePayment,
            ),
        }
    }

    #[must_use]
    pub fn with_version_policy(mut self, policy: VersionAccessPolicy) -> Self {
        self.inner = self.inner.with_version_policy(policy);
        self
    }

    #[must_use]
    pub fn with_idempotency_key_ttl(mut self, ttl: Duration) -> Self {
        self.inner = self.inner.with_idempotency_key_ttl(ttl);
        self
    }

    /// Attaches the payment file to the consent and moves it to the
    /// awaiting-authorisation status.
    ///
    /// Uploads carry their own idempotency key, independent of the creation
    /// key: re-sending the same key with the same content replays the
    /// original upload, while a repeat with different content or a second
    /// distinct upload is an idempotency error.
    pub async fn upload_file(&self, args: &FileUploadArgs) -> Result<T> {
        if args.file_upload_idempotency_key.is_empty() {
            return Err(ConsentError::validation(
                "fileUploadIdempotencyKey is required",
            ));
        }

        let mut consent = self
            .inner
            .get_consent(&args.consent_id, &args.api_client_id)
            .await?;

        if consent.status() == ConsentStatus::AwaitingAuthorisation {
            return self.replay_or_conflict(consent, args);
        }

        let target = ConsentStatus::AwaitingAuthorisation;
        self.inner.inner().validate_transition(&consent, target)?;

        consent.base_mut().status = target;
        {
            let file = consent.file_mut();
            file.file_content = Some(args.file_content.clone());
            file.file_upload_idempotency_key =
                Some(args.file_upload_idempotency_key.clone());
        }

        let stored = self.inner.inner().store().save(consent).await?;
        info!(id = %stored.base().id, "uploaded payment file");
        Ok(stored)
    }

    fn replay_or_conflict(&self, existing: T, args: &FileUploadArgs) -> Result<T> {
        let file = existing.file();
        let same_key =
            file.file_upload_idempotency_key.as_deref() == Some(args.file_upload_idempotency_key.as_str());
        let same_content = file.file_content.as_deref() == Some(args.file_content.as_str());
        if same_key && same_content {
            info!(id = %existing.base().id, "idempotent replay of file upload");
            Ok(existing)
        } else {
            Err(ConsentError::idempotency(
                existing.base().id.clone(),
                "a different file was already uploaded for this consent",
            ))
        }
    }

    /// Returns the uploaded file content, or a not-found error when no file
    /// has been uploaded yet.
    pub async fn get_file_content(&self, id: &str, api_client_id: &str) -> Result<String> {
        let consent = self.inner.get_consent(id, api_client_id).await?;
        consent
            .file()
            .file_content
            .clone()
            .ok_or_else(|| ConsentError::not_found(id))
    }

    pub async fn create_consent(&self, consent: T) -> Result<T> {
        self.inner.create_consent(consent).await
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

    pub async fn consume_consent(&self, id: &str, api_client_id: &str) -> Result<T> {
        self.inner.consume_consent(id, api_client_id).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use openconsent_core::{ApiVersion, FilePaymentConsent};
    use openconsent_db_memory::InMemoryConsentStore;
    use serde_json::json;
    use std::str::FromStr;

    fn service() -> FilePaymentConsentService<FilePaymentConsent> {
        let store: Arc<InMemoryConsentStore<FilePaymentConsent>> =
            Arc::new(InMemoryConsentStore::new());
        FilePaymentConsentService::new(store.clone(), store)
    }

    fn new_consent(api_client_id: &str, key: &str) -> FilePaymentConsent {
        FilePaymentConsent::new(
            api_client_id,
            ApiVersion::from_str("v3.1.10").unwrap(),
            json!({"Data": {"Initiation": {"FileType": "UK.OBIE.pain.001.001.08"}}}),
            key,
        )
    }

    fn upload(id: &str, content: &str, key: &str) -> FileUploadArgs {
        FileUploadArgs::new(id, "c1", content, key)
    }

    #[tokio::test]
    async fn test_created_consent_awaits_upload() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        assert!(stored.base.id.starts_with("PFC_"));
        assert_eq!(stored.base.status, ConsentStatus::AwaitingUpload);
        assert!(stored.file.file_content.is_none());
    }

    #[tokio::test]
    async fn test_upload_moves_consent_to_awaiting_authorisation() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        let uploaded = service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap();

        assert_eq!(uploaded.base.status, ConsentStatus::AwaitingAuthorisation);
        assert_eq!(uploaded.file.file_content.as_deref(), Some("<pain.001>"));
        assert_eq!(
            service.get_file_content(&stored.base.id, "c1").await.unwrap(),
            "<pain.001>"
        );
    }

    #[tokio::test]
    async fn test_upload_replay_with_same_key_and_content() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        let args = upload(&stored.base.id, "<pain.001>", "uk1");
        let first = service.upload_file(&args).await.unwrap();
        let second = service.upload_file(&args).await.unwrap();

        assert_eq!(second.base.entity_version, first.base.entity_version);
        assert_eq!(second.base.status, ConsentStatus::AwaitingAuthorisation);
    }

    #[tokio::test]
    async fn test_upload_replay_with_different_content_is_an_error() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap();
        let err = service
            .upload_file(&upload(&stored.base.id, "<different>", "uk1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IdempotencyError);
    }

    #[tokio::test]
    async fn test_second_upload_with_new_key_is_an_error() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap();
        let err = service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk2"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::IdempotencyError);
    }

    #[tokio::test]
    async fn test_authorise_before_upload_is_illegal() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        let args = PaymentAuthoriseArgs::new(&stored.base.id, "c1", "psu1", "acc-1");
        let err = service.authorise_consent(&args).await.unwrap_err();
        match err {
            ConsentError::InvalidStateTransition { current, .. } => {
                assert_eq!(current, ConsentStatus::AwaitingUpload);
            }
            other => panic!("expected InvalidStateTransition, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_full_file_payment_lifecycle() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap();
        let args = PaymentAuthoriseArgs::new(&stored.base.id, "c1", "psu1", "acc-1");
        let authorised = service.authorise_consent(&args).await.unwrap();
        assert_eq!(authorised.base.status, ConsentStatus::Authorised);

        let consumed = service.consume_consent(&stored.base.id, "c1").await.unwrap();
        assert_eq!(consumed.base.status, ConsentStatus::Consumed);
    }

    #[tokio::test]
    async fn test_upload_requires_idempotency_key() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        let err = service
            .upload_file(&upload(&stored.base.id, "<pain.001>", ""))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_upload_after_rejection_is_illegal() {
        let service = service();
        let stored = service.create_consent(new_consent("c1", "k1")).await.unwrap();

        service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap();
        service
            .reject_consent(&stored.base.id, "c1", "psu1")
            .await
            .unwrap();

        let err = service
            .upload_file(&upload(&stored.base.id, "<pain.001>", "uk1"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }
}
