//! # Feature: Client Storage
//!
//! Key-value capability behind every piece of persisted client state (identity, theme, history).
//! Stores never reach for ambient globals; they receive a `Storage` handle at construction.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Added `MemoryStorage` for embedders without a database file
//! - 1.0.0: Initial release with named keys shared by the stores

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Key holding the persisted session identity
pub const USER_ID_KEY: &str = "user_id";

/// Key holding the persisted theme preference (`light` or `dark`)
pub const THEME_KEY: &str = "theme";

/// Key holding the serialized chat history
pub const CHAT_HISTORY_KEY: &str = "chatHistory";

/// Named-key string storage. Last write wins.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Read a value, `None` when the key was never written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local storage. Cloning shares the underlying map, so a clone
/// behaves like the same profile after a page reload.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_get_set_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get(THEME_KEY).await.unwrap(), None);

        storage.set(THEME_KEY, "light").await.unwrap();
        storage.set(THEME_KEY, "dark").await.unwrap();
        assert_eq!(storage.get(THEME_KEY).await.unwrap(), Some("dark".to_string()));

        storage.remove(THEME_KEY).await.unwrap();
        storage.remove(THEME_KEY).await.unwrap();
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_memory_storage_clone_shares_profile() {
        let storage = MemoryStorage::new();
        let reloaded = storage.clone();
        storage.set(USER_ID_KEY, "user_1").await.unwrap();
        assert_eq!(reloaded.get(USER_ID_KEY).await.unwrap(), Some("user_1".to_string()));
    }
}
