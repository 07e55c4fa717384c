use async_trait::async_trait;
use openconsent_core::{ConsentEntity, PaymentConsentEntity, now_utc};
use openconsent_storage::{ConsentStore, PaymentConsentStore, StoreError};
use papaya::HashMap as PapayaHashMap;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

/// Index key for the idempotency uniqueness constraint.
type IdempotencyKey = (String, String); // (api_client_id, idempotency_key)

/// In-memory consent storage backend using a papaya lock-free HashMap.
///
/// Reads are lock-free; all writes serialize on a single mutex, which is
/// what makes the compare-and-swap on `entity_version` and the uniqueness
/// constraint on `(api_client_id, idempotency_key)` atomic. Two concurrent
/// creates racing on the same idempotency key therefore resolve to exactly
/// one inserted consent, with the loser observing
/// [`StoreError::DuplicateIdempotencyKey`].
#[derive(Debug)]
pub struct InMemoryConsentStore<T: ConsentEntity> {
    data: PapayaHashMap<String, T>,
    /// (api_client_id, idempotency_key) -> consent id. Entries for expired
    /// keys go stale and are overwritten on the next insert.
    idempotency_index: PapayaHashMap<IdempotencyKey, String>,
    write_lock: Mutex<()>,
}

impl<T: ConsentEntity> InMemoryConsentStore<T> {
    pub fn new() -> Self {
        Self {
            data: PapayaHashMap::new(),
            idempotency_index: PapayaHashMap::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Number of stored consents, soft-deleted ones included.
    pub fn count(&self) -> usize {
        self.data.pin().iter().count()
    }

    /// Whether the consent referenced by an index entry still holds a live
    /// (unexpired) idempotency key. Caller must hold the write lock.
    fn index_entry_live(&self, consent_id: &str, now: OffsetDateTime) -> bool {
        let guard = self.data.pin();
        guard
            .get(consent_id)
            .and_then(|consent| consent.idempotency_data())
            .is_some_and(|(_, expiration)| expiration > now)
    }
}

impl<T: ConsentEntity> Default for InMemoryConsentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: ConsentEntity> ConsentStore<T> for InMemoryConsentStore<T> {
    async fn find_by_id(&self, id: &str) -> Result<Option<T>, StoreError> {
        let guard = self.data.pin();
        Ok(guard.get(id).cloned())
    }

    async fn insert(&self, mut consent: T) -> Result<T, StoreError> {
        let _write = self.write_lock.lock().await;

        let id = consent.base().id.clone();
        if id.is_empty() {
            return Err(StoreError::internal(
                "consent id must be assigned before insert",
            ));
        }
        if self.data.pin().get(&id).is_some() {
            return Err(StoreError::already_exists(id));
        }

        let now = now_utc();
        if let Some((key, expiration)) = consent.idempotency_data() {
            let index_key = (consent.base().api_client_id.clone(), key.to_string());
            let existing = self.idempotency_index.pin().get(&index_key).cloned();
            match existing {
                Some(existing_id) if self.index_entry_live(&existing_id, now) => {
                    return Err(StoreError::duplicate_idempotency_key(
                        index_key.0,
                        index_key.1,
                    ));
                }
                _ => {
                    // Absent or pointing at an expired key; claim the slot.
                    self.idempotency_index.pin().insert(index_key, id.clone());
                }
            }
            debug!(id = %id, expiration = %expiration, "claimed idempotency key");
        }

        let base = consent.base_mut();
        base.creation_date_time = now;
        base.status_updated_date_time = now;
        base.entity_version = 1;

        self.data.pin().insert(id, consent.clone());
        Ok(consent)
    }

    async fn save(&self, mut consent: T) -> Result<T, StoreError> {
        let _write = self.write_lock.lock().await;

        let id = consent.base().id.clone();
        let stored_version = {
            let guard = self.data.pin();
            guard
                .get(&id)
                .map(|stored| stored.base().entity_version)
                .ok_or_else(|| StoreError::not_found(&id))?
        };

        let presented = consent.base().entity_version;
        if presented != stored_version {
            return Err(StoreError::version_conflict(id, presented, stored_version));
        }

        let base = consent.base_mut();
        base.entity_version = stored_version + 1;
        base.status_updated_date_time = now_utc();

        self.data.pin().insert(id, consent.clone());
        Ok(consent)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StoreError> {
        let _write = self.write_lock.lock().await;

        let removed = self.data.pin().remove(id).cloned();
        let Some(removed) = removed else {
            return Err(StoreError::not_found(id));
        };

        if let Some((key, _)) = removed.idempotency_data() {
            let index_key = (removed.base().api_client_id.clone(), key.to_string());
            let guard = self.idempotency_index.pin();
            if guard.get(&index_key).is_some_and(|owner| owner == id) {
                guard.remove(&index_key);
            }
        }
        debug!(id = %id, "hard-deleted consent");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl<T: PaymentConsentEntity> PaymentConsentStore<T> for InMemoryConsentStore<T> {
    async fn find_by_idempotency_data(
        &self,
        api_client_id: &str,
        idempotency_key: &str,
        now: OffsetDateTime,
    ) -> Result<Option<T>, StoreError> {
        let index_key = (api_client_id.to_string(), idempotency_key.to_string());
        let consent_id = self.idempotency_index.pin().get(&index_key).cloned();
        let Some(consent_id) = consent_id else {
            return Ok(None);
        };

        let guard = self.data.pin();
        Ok(guard
            .get(&consent_id)
            .filter(|consent| {
                consent.base().api_client_id == api_client_id
                    && consent.payment().idempotency_key == idempotency_key
                    && consent.payment().idempotency_key_expiration > now
            })
            .cloned())
    }
}
