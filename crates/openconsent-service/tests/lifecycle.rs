//! End-to-end lifecycle tests over the in-memory backend.
//!
//! Exercises the full path a deployment wires up: settings, factory,
//! version-bound service instances, and the payment and file-payment
//! engines on top of a shared store.

use openconsent_core::{
    ApiVersion, ConsentStatus, ConsentType, CustomerInfoConsent, DomesticPaymentConsent,
    FilePaymentConsent, validate_intent_id,
};
use openconsent_db_memory::InMemoryConsentStore;
use openconsent_service::{
    ConsentError, ConsentServiceFactory, ConsentStoreSettings, ErrorCode, FileUploadArgs,
    PaymentAuthoriseArgs,
};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

fn factory() -> ConsentServiceFactory {
    let settings = ConsentStoreSettings::from_toml(
        r#"
        supported_api_versions = ["v3.1.10", "v4.0.0"]
        minimum_api_version = "v3.1.10"
        idempotency_key_ttl_secs = 86400
        "#,
    )
    .expect("settings parse");
    ConsentServiceFactory::new(&settings)
}

fn v(s: &str) -> ApiVersion {
    ApiVersion::from_str(s).unwrap()
}

fn payment_consent(api_client_id: &str, key: &str) -> DomesticPaymentConsent {
    DomesticPaymentConsent::new(
        api_client_id,
        v("v3.1.10"),
        json!({"Data": {"Initiation": {"InstructedAmount": {"Amount": "25.00", "Currency": "GBP"}}}}),
        key,
    )
}

#[tokio::test]
async fn test_domestic_payment_end_to_end() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<DomesticPaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service = factory.api_payment_service(
        store.clone(),
        store,
        ConsentType::DomesticPayment,
        v("v3.1.10"),
    );

    // Create: server-assigned id, initial status, bookkeeping at version 1.
    let created = service
        .create_consent(payment_consent("tpp-1", "key-1"))
        .await
        .unwrap();
    assert!(validate_intent_id(&created.base.id, ConsentType::DomesticPayment).is_ok());
    assert_eq!(created.base.status, ConsentStatus::AwaitingAuthorisation);
    assert_eq!(created.base.entity_version, 1);

    // Replay of the same request returns the same consent.
    let replay = service
        .create_consent(payment_consent("tpp-1", "key-1"))
        .await
        .unwrap();
    assert_eq!(replay.base.id, created.base.id);

    // Authorise with the selected debtor account.
    let args = PaymentAuthoriseArgs::new(&created.base.id, "tpp-1", "psu-1", "acct-7");
    let authorised = service.authorise_consent(&args).await.unwrap();
    assert_eq!(authorised.base.status, ConsentStatus::Authorised);
    assert_eq!(authorised.base.resource_owner_id.as_deref(), Some("psu-1"));
    assert_eq!(
        authorised.payment.authorised_debtor_account_id.as_deref(),
        Some("acct-7")
    );
    assert_eq!(authorised.base.entity_version, 2);
    assert!(authorised.base.status_updated_date_time >= created.base.status_updated_date_time);
    assert_eq!(
        authorised.base.creation_date_time,
        created.base.creation_date_time
    );

    // Consume exactly once.
    let consumed = service
        .consume_consent(&created.base.id, "tpp-1")
        .await
        .unwrap();
    assert_eq!(consumed.base.status, ConsentStatus::Consumed);

    let err = service
        .consume_consent(&created.base.id, "tpp-1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    assert_eq!(
        err.to_string(),
        format!(
            "Invalid state transition for consent {}: Consumed to Consumed",
            created.base.id
        )
    );
}

#[tokio::test]
async fn test_version_gating_across_instances() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<DomesticPaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());

    let v3 = factory.api_payment_service(
        store.clone(),
        store.clone(),
        ConsentType::DomesticPayment,
        v("v3.1.10"),
    );
    let v4 = factory.api_payment_service(
        store.clone(),
        store,
        ConsentType::DomesticPayment,
        v("v4.0.0"),
    );

    // Created under v4, fetched by a v3 caller: forbidden.
    let mut consent = payment_consent("tpp-1", "key-newer");
    consent.base.request_version = v("v4.0.0");
    let created = v4.create_consent(consent).await.unwrap();

    let err = v3.get_consent(&created.base.id, "tpp-1").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidApiVersion);

    // Created under v3, fetched by a v4 caller: allowed.
    let older = v3
        .create_consent(payment_consent("tpp-1", "key-older"))
        .await
        .unwrap();
    v4.get_consent(&older.base.id, "tpp-1").await.unwrap();
}

#[tokio::test]
async fn test_ownership_isolation_between_api_clients() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<DomesticPaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service = factory.internal_payment_service(
        store.clone(),
        store,
        ConsentType::DomesticPayment,
    );

    let created = service
        .create_consent(payment_consent("tpp-1", "key-1"))
        .await
        .unwrap();

    for attempt in [
        service.get_consent(&created.base.id, "tpp-2").await.err(),
        service
            .reject_consent(&created.base.id, "tpp-2", "psu-1")
            .await
            .err(),
        service.delete_consent(&created.base.id, "tpp-2").await.err(),
    ] {
        let err = attempt.expect("foreign client must be refused");
        assert_eq!(err.code(), ErrorCode::InvalidPermissions);
    }

    // The owner remains unaffected.
    let fetched = service.get_consent(&created.base.id, "tpp-1").await.unwrap();
    assert_eq!(fetched.base.entity_version, 1);
}

#[tokio::test]
async fn test_revoked_consent_is_gone_for_every_caller() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<DomesticPaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service = factory.internal_payment_service(
        store.clone(),
        store,
        ConsentType::DomesticPayment,
    );

    let created = service
        .create_consent(payment_consent("tpp-1", "key-1"))
        .await
        .unwrap();
    let revoked = service
        .delete_consent(&created.base.id, "tpp-1")
        .await
        .unwrap();
    assert_eq!(revoked.base.status, ConsentStatus::Revoked);
    assert!(revoked.base.deleted);

    let err = service.get_consent(&created.base.id, "tpp-1").await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    // Mutations are refused the same way.
    let args = PaymentAuthoriseArgs::new(&created.base.id, "tpp-1", "psu-1", "acct-1");
    let err = service.authorise_consent(&args).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn test_customer_info_accepts_a_preassigned_id() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<CustomerInfoConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service: openconsent_service::ConsentService<
        CustomerInfoConsent,
        openconsent_service::AuthoriseConsentArgs,
    > = factory.internal_service(
        store as Arc<dyn openconsent_storage::ConsentStore<CustomerInfoConsent>>,
        ConsentType::CustomerInfo,
        Arc::new(openconsent_service::NoopAuthoriseHook),
    );

    let consent = CustomerInfoConsent::new("tpp-1", v("v3.1.10"), json!({"Data": {}}))
        .with_id("CIC_preassigned-from-account-access");
    let created = service.create_consent(consent).await.unwrap();
    assert_eq!(created.base.id, "CIC_preassigned-from-account-access");

    // Any other product still refuses caller-supplied ids.
    let mut rogue = CustomerInfoConsent::new("tpp-1", v("v3.1.10"), json!({"Data": {}}));
    rogue.base.id = "AAC_wrong-prefix".to_string();
    let err = service.create_consent(rogue).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[tokio::test]
async fn test_file_payment_end_to_end() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<FilePaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service = factory.api_file_payment_service(store.clone(), store, v("v3.1.10"));

    let consent = FilePaymentConsent::new(
        "tpp-1",
        v("v3.1.10"),
        json!({"Data": {"Initiation": {"FileType": "UK.OBIE.pain.001.001.08"}}}),
        "key-1",
    );
    let created = service.create_consent(consent).await.unwrap();
    assert_eq!(created.base.status, ConsentStatus::AwaitingUpload);

    let upload = FileUploadArgs::new(&created.base.id, "tpp-1", "<pain.001>", "upload-1");
    let uploaded = service.upload_file(&upload).await.unwrap();
    assert_eq!(uploaded.base.status, ConsentStatus::AwaitingAuthorisation);

    // Replaying the upload does not advance the consent.
    let replay = service.upload_file(&upload).await.unwrap();
    assert_eq!(replay.base.entity_version, uploaded.base.entity_version);

    let args = PaymentAuthoriseArgs::new(&created.base.id, "tpp-1", "psu-1", "acct-1");
    let authorised = service.authorise_consent(&args).await.unwrap();
    assert_eq!(authorised.base.status, ConsentStatus::Authorised);

    let content = service
        .get_file_content(&created.base.id, "tpp-1")
        .await
        .unwrap();
    assert_eq!(content, "<pain.001>");

    let consumed = service
        .consume_consent(&created.base.id, "tpp-1")
        .await
        .unwrap();
    assert_eq!(consumed.base.status, ConsentStatus::Consumed);
}

#[tokio::test]
async fn test_idempotency_conflict_names_the_original_consent() {
    let factory = factory();
    let store: Arc<InMemoryConsentStore<DomesticPaymentConsent>> =
        Arc::new(InMemoryConsentStore::new());
    let service = factory.internal_payment_service(
        store.clone(),
        store,
        ConsentType::DomesticPayment,
    );

    let original = service
        .create_consent(payment_consent("tpp-1", "key-1"))
        .await
        .unwrap();

    let mut conflicting = payment_consent("tpp-1", "key-1");
    conflicting.base.request_obj = json!({"Data": {"Initiation": {"InstructedAmount": {"Amount": "9999.00", "Currency": "GBP"}}}});
    let err = service.create_consent(conflicting).await.unwrap_err();

    match err {
        ConsentError::Idempotency { id, .. } => assert_eq!(id, original.base.id),
        other => panic!("expected Idempotency, got {other}"),
    }
}
