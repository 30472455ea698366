//! In-memory verification record store.
//!
//! Backs the service in single-node deployments and in tests. A single
//! async mutex over the map is what makes `admit_attempt` and
//! `mark_verified` atomic; no check-then-update ever happens outside it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ch_core::domain::{Identity, UserType, VerificationRecord};
use ch_core::errors::{DomainError, VerifyError};
use ch_core::repositories::record::{AttemptAdmission, RecordStore};

/// In-memory record store.
///
/// Cloneable; clones share the underlying map.
#[derive(Clone)]
pub struct MemoryRecordStore {
    records: Arc<Mutex<HashMap<Uuid, VerificationRecord>>>,
}

impl MemoryRecordStore {
    /// Create a new empty store
    pub fn new() -> Self {
        info!(event = "record_store_init", backend = "memory");
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Whether the store holds no records
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: VerificationRecord) -> Result<(), DomainError> {
        debug!(
            event = "record_insert",
            otp_id = %record.id,
            identity = %record.identity.masked(),
            user_type = %record.user_type,
        );
        let mut records = self.records.lock().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<VerificationRecord>, DomainError> {
        let records = self.records.lock().await;
        Ok(records.get(&id).cloned())
    }

    async fn latest_for_identity(
        &self,
        identity: &Identity,
        user_type: UserType,
    ) -> Result<Option<VerificationRecord>, DomainError> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .filter(|r| &r.identity == identity && r.user_type == user_type)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn admit_attempt(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<AttemptAdmission, DomainError> {
        let mut records = self.records.lock().await;
        let record = match records.get_mut(&id) {
            Some(r) => r,
            None => {
                debug!(event = "attempt_rejected", otp_id = %id, reason = "not_found");
                return Ok(AttemptAdmission::Rejected(VerifyError::NotFound));
            }
        };

        // Guard order is part of the contract: terminal verified state first,
        // then expiry, then the budget, and only then the increment.
        if record.verified {
            debug!(event = "attempt_rejected", otp_id = %id, reason = "already_verified");
            return Ok(AttemptAdmission::Rejected(VerifyError::AlreadyVerified));
        }
        if record.is_expired_at(now) {
            debug!(event = "attempt_rejected", otp_id = %id, reason = "expired");
            return Ok(AttemptAdmission::Rejected(VerifyError::Expired));
        }
        if record.is_exhausted() {
            warn!(
                event = "attempt_rejected",
                otp_id = %id,
                identity = %record.identity.masked(),
                reason = "exhausted",
            );
            return Ok(AttemptAdmission::Rejected(VerifyError::Exhausted));
        }

        record.attempts += 1;
        debug!(
            event = "attempt_admitted",
            otp_id = %id,
            attempts = record.attempts,
            max_attempts = record.max_attempts,
        );
        Ok(AttemptAdmission::Admitted {
            code: record.code.clone(),
            attempts: record.attempts,
            max_attempts: record.max_attempts,
            identity: record.identity.clone(),
            user_type: record.user_type,
            provider_correlation_id: record.provider_correlation_id.clone(),
        })
    }

    async fn mark_verified(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DomainError> {
        let mut records = self.records.lock().await;
        match records.get_mut(&id) {
            Some(record) if !record.verified => {
                record.verified = true;
                record.verified_at = Some(at);
                info!(
                    event = "record_verified",
                    otp_id = %id,
                    identity = %record.identity.masked(),
                );
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }

    async fn set_correlation_id(&self, id: Uuid, correlation_id: &str) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;
        match records.get_mut(&id) {
            Some(record) => {
                record.provider_correlation_id = Some(correlation_id.to_string());
                Ok(())
            }
            None => Err(DomainError::Internal {
                message: format!("record {} not found while attaching correlation id", id),
            }),
        }
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| r.created_at >= cutoff);
        let removed = before - records.len();
        if removed > 0 {
            info!(event = "records_purged", removed, %cutoff);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> VerificationRecord {
        VerificationRecord::new(
            Identity::Phone("+919876543210".to_string()),
            UserType::Student,
            15,
            3,
        )
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        let found = store.find(id).await.unwrap().expect("record present");
        assert_eq!(found.id, id);
        assert_eq!(found.attempts, 0);
    }

    #[tokio::test]
    async fn test_latest_for_identity_picks_newest() {
        let store = MemoryRecordStore::new();
        let mut older = record();
        older.created_at = Utc::now() - Duration::minutes(5);
        let newer = record();
        let newer_id = newer.id;
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let latest = store
            .latest_for_identity(
                &Identity::Phone("+919876543210".to_string()),
                UserType::Student,
            )
            .await
            .unwrap()
            .expect("a record exists");
        assert_eq!(latest.id, newer_id);
    }

    #[tokio::test]
    async fn test_admission_guard_order() {
        let store = MemoryRecordStore::new();
        let mut rec = record();
        rec.attempts = 3;
        rec.verified = true;
        let id = rec.id;
        let expiry = rec.expires_at;
        store.insert(rec).await.unwrap();

        // Verified wins even when the record is also expired and exhausted
        let admission = store
            .admit_attempt(id, expiry + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(
            admission,
            AttemptAdmission::Rejected(VerifyError::AlreadyVerified)
        );
    }

    #[tokio::test]
    async fn test_concurrent_admissions_respect_budget() {
        let store = MemoryRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.admit_attempt(id, Utc::now()).await.unwrap()
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            if matches!(handle.await.unwrap(), AttemptAdmission::Admitted { .. }) {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(store.find(id).await.unwrap().unwrap().attempts, 3);
    }

    #[tokio::test]
    async fn test_mark_verified_is_single_winner() {
        let store = MemoryRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        assert!(store.mark_verified(id, Utc::now()).await.unwrap());
        assert!(!store.mark_verified(id, Utc::now()).await.unwrap());
        assert!(!store.mark_verified(Uuid::new_v4(), Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_removes_only_old_records() {
        let store = MemoryRecordStore::new();
        let mut old = record();
        old.created_at = Utc::now() - Duration::hours(30);
        let fresh = record();
        let fresh_id = fresh.id;
        store.insert(old).await.unwrap();
        store.insert(fresh).await.unwrap();

        let removed = store
            .purge_older_than(Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.find(fresh_id).await.unwrap().is_some());
    }
}
