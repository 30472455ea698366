//! Mock implementation of RecordStore for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Identity, UserType, VerificationRecord};
use crate::errors::{DomainError, VerifyError};

use super::trait_::{AttemptAdmission, RecordStore};

/// Mock record store for testing.
///
/// A single mutex over the map makes `admit_attempt` and `mark_verified`
/// atomic, matching the contract production stores must honor.
pub struct MockRecordStore {
    records: Arc<Mutex<HashMap<Uuid, VerificationRecord>>>,
}

impl MockRecordStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Snapshot a record for test assertions
    pub async fn snapshot(&self, id: Uuid) -> Option<VerificationRecord> {
        self.records.lock().await.get(&id).cloned()
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

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn insert(&self, record: VerificationRecord) -> Result<(), DomainError> {
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
            None => return Ok(AttemptAdmission::Rejected(VerifyError::NotFound)),
        };

        if record.verified {
            return Ok(AttemptAdmission::Rejected(VerifyError::AlreadyVerified));
        }
        if record.is_expired_at(now) {
            return Ok(AttemptAdmission::Rejected(VerifyError::Expired));
        }
        if record.is_exhausted() {
            return Ok(AttemptAdmission::Rejected(VerifyError::Exhausted));
        }

        record.attempts += 1;
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
        Ok(before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> VerificationRecord {
        VerificationRecord::new(
            Identity::Phone("+919999999999".to_string()),
            UserType::Student,
            15,
            3,
        )
    }

    #[tokio::test]
    async fn test_admit_attempt_increments() {
        let store = MockRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        match store.admit_attempt(id, Utc::now()).await.unwrap() {
            AttemptAdmission::Admitted { attempts, .. } => assert_eq!(attempts, 1),
            other => panic!("expected admission, got {:?}", other),
        }
        assert_eq!(store.snapshot(id).await.unwrap().attempts, 1);
    }

    #[tokio::test]
    async fn test_admit_attempt_not_found() {
        let store = MockRecordStore::new();
        let admission = store.admit_attempt(Uuid::new_v4(), Utc::now()).await.unwrap();
        assert_eq!(admission, AttemptAdmission::Rejected(VerifyError::NotFound));
    }

    #[tokio::test]
    async fn test_admit_attempt_exhaustion_before_increment() {
        let store = MockRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        for _ in 0..3 {
            let admission = store.admit_attempt(id, Utc::now()).await.unwrap();
            assert!(matches!(admission, AttemptAdmission::Admitted { .. }));
        }
        let admission = store.admit_attempt(id, Utc::now()).await.unwrap();
        assert_eq!(admission, AttemptAdmission::Rejected(VerifyError::Exhausted));
        // The rejected call must not have bumped the counter
        assert_eq!(store.snapshot(id).await.unwrap().attempts, 3);
    }

    #[tokio::test]
    async fn test_expired_checked_before_exhausted() {
        let store = MockRecordStore::new();
        let mut rec = record();
        rec.attempts = 3;
        let id = rec.id;
        let expiry = rec.expires_at;
        store.insert(rec).await.unwrap();

        let admission = store
            .admit_attempt(id, expiry + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(admission, AttemptAdmission::Rejected(VerifyError::Expired));
    }

    #[tokio::test]
    async fn test_mark_verified_wins_once() {
        let store = MockRecordStore::new();
        let rec = record();
        let id = rec.id;
        store.insert(rec).await.unwrap();

        assert!(store.mark_verified(id, Utc::now()).await.unwrap());
        assert!(!store.mark_verified(id, Utc::now()).await.unwrap());

        let snapshot = store.snapshot(id).await.unwrap();
        assert!(snapshot.verified);
        assert!(snapshot.verified_at.is_some());
    }

    #[tokio::test]
    async fn test_purge_older_than() {
        let store = MockRecordStore::new();
        let mut old = record();
        old.created_at = Utc::now() - Duration::hours(48);
        let fresh = record();
        let fresh_id = fresh.id;
        store.insert(old).await.unwrap();
        store.insert(fresh).await.unwrap();

        let removed = store
            .purge_older_than(Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.snapshot(fresh_id).await.is_some());
    }
}
