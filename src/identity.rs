//! # Feature: Session Identity
//!
//! Opaque per-profile identifier attached to every outbound chat message.
//! Generated on first run and never rewritten afterwards.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use crate::storage::{Storage, USER_ID_KEY};
use log::{info, warn};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Read the stored identity, creating and persisting one on first run.
    ///
    /// Storage failures never block the client: an unreadable profile gets an
    /// ephemeral identity and an unwritable one keeps the generated value for
    /// this session only.
    pub async fn load_or_create(storage: &dyn Storage) -> Self {
        match storage.get(USER_ID_KEY).await {
            Ok(Some(existing)) if !existing.trim().is_empty() => return SessionIdentity(existing),
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read session identity, using an ephemeral one: {e}");
                return Self::generate();
            }
        }

        let identity = Self::generate();
        if let Err(e) = storage.set(USER_ID_KEY, identity.as_str()).await {
            warn!("Failed to persist session identity: {e}");
        } else {
            info!("Created session identity {identity}");
        }
        identity
    }

    fn generate() -> Self {
        SessionIdentity(format!("user_{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_identity_is_created_once() {
        let storage = MemoryStorage::new();
        let first = SessionIdentity::load_or_create(&storage).await;
        let second = SessionIdentity::load_or_create(&storage).await;

        assert!(first.as_str().starts_with("user_"));
        assert_eq!(first, second);
        assert_eq!(
            storage.get(USER_ID_KEY).await.unwrap().as_deref(),
            Some(first.as_str())
        );
    }

    #[tokio::test]
    async fn test_existing_identity_is_kept() {
        let storage = MemoryStorage::new();
        storage.set(USER_ID_KEY, "user_1700000000000").await.unwrap();
        let identity = SessionIdentity::load_or_create(&storage).await;
        assert_eq!(identity.as_str(), "user_1700000000000");
    }
}
