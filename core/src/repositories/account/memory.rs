//! In-memory implementation of AccountDirectory.
//!
//! The shipped directory for deployments where the account store is not yet
//! integrated, and the test double everywhere else.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::Identity;
use crate::errors::DomainError;

use super::trait_::AccountDirectory;

/// Account directory backed by a set of registered identities
pub struct InMemoryAccountDirectory {
    registered: Arc<RwLock<HashSet<Identity>>>,
}

impl InMemoryAccountDirectory {
    /// Create an empty directory (no identity registered)
    pub fn new() -> Self {
        Self {
            registered: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Register an identity so subsequent `exists` calls return true
    pub async fn register(&self, identity: Identity) {
        self.registered.write().await.insert(identity);
    }
}

impl Default for InMemoryAccountDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn exists(&self, identity: &Identity) -> Result<bool, DomainError> {
        Ok(self.registered.read().await.contains(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_exists_after_register() {
        let directory = InMemoryAccountDirectory::new();
        let identity = Identity::Email("tpo@college.edu".to_string());

        assert!(!directory.exists(&identity).await.unwrap());
        directory.register(identity.clone()).await;
        assert!(directory.exists(&identity).await.unwrap());
    }
}
