//! # Feature: Chat History
//!
//! Capacity-bounded, insertion-ordered log of chat entries kept in client storage.
//! Oldest entries are dropped first once the log grows past its capacity.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.1: A failed read no longer lets `append` overwrite the stored log
//! - 1.2.0: Added `HistoryPolicy` so session-scoped history is configuration, not code
//! - 1.1.0: Corrupt stored history degrades to an empty log
//! - 1.0.0: Initial release with FIFO truncation

use crate::storage::{Storage, CHAT_HISTORY_KEY};
use anyhow::Result;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default number of entries kept in the log
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Who wrote a chat entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }
}

/// A single message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub text: String,
    #[serde(rename = "type", alias = "role")]
    pub role: Role,
}

impl ChatEntry {
    pub fn new(text: impl Into<String>, role: Role) -> Self {
        ChatEntry {
            text: text.into(),
            role,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Role::User)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Role::Bot)
    }
}

/// Whether history outlives the running client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// History survives restarts
    #[default]
    Persistent,
    /// History is cleared when the client unloads
    Session,
}

impl fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPolicy::Persistent => f.write_str("persistent"),
            HistoryPolicy::Session => f.write_str("session"),
        }
    }
}

impl FromStr for HistoryPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "persistent" => Ok(HistoryPolicy::Persistent),
            "session" => Ok(HistoryPolicy::Session),
            other => anyhow::bail!("Unknown history policy '{}'. Use: persistent, session", other),
        }
    }
}

#[derive(Clone)]
pub struct HistoryStore {
    storage: Arc<dyn Storage>,
    capacity: usize,
    policy: HistoryPolicy,
}

impl HistoryStore {
    pub fn new(storage: Arc<dyn Storage>, capacity: usize, policy: HistoryPolicy) -> Self {
        HistoryStore {
            storage,
            capacity: capacity.max(1),
            policy,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> HistoryPolicy {
        self.policy
    }

    /// Append an entry, dropping the oldest ones past capacity.
    /// Storage failures are logged and swallowed; an unreadable log is left untouched.
    pub async fn append(&self, entry: ChatEntry) {
        let mut entries = match self.read().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to load chat history, not saving entry: {e}");
                return;
            }
        };
        entries.push(entry);
        if entries.len() > self.capacity {
            let overflow = entries.len() - self.capacity;
            entries.drain(..overflow);
            debug!("History over capacity, dropped {overflow} oldest entries");
        }

        if let Err(e) = self.write(&entries).await {
            error!("Failed to save chat history: {e}");
        }
    }

    /// Stored entries in original order; missing, unreadable or corrupt history reads as empty
    pub async fn load_all(&self) -> Vec<ChatEntry> {
        self.read().await.unwrap_or_else(|e| {
            error!("Failed to load chat history: {e}");
            Vec::new()
        })
    }

    /// Stored entries; only a storage failure is an error, corrupt JSON reads as empty
    pub async fn read(&self) -> Result<Vec<ChatEntry>> {
        let Some(raw) = self.storage.get(CHAT_HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<ChatEntry>>(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Stored chat history is corrupt, treating it as empty: {e}");
                Ok(Vec::new())
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.load_all().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove every stored entry. Callers confirm with the user first.
    pub async fn clear(&self) {
        match self.storage.remove(CHAT_HISTORY_KEY).await {
            Ok(()) => info!("Chat history cleared"),
            Err(e) => error!("Error clearing chat history: {e}"),
        }
    }

    /// Apply the unload policy
    pub async fn on_unload(&self) {
        if self.policy == HistoryPolicy::Session {
            debug!("Session-scoped history, clearing on unload");
            self.clear().await;
        }
    }

    async fn write(&self, entries: &[ChatEntry]) -> Result<()> {
        let serialized = serde_json::to_string(entries)?;
        self.storage.set(CHAT_HISTORY_KEY, &serialized).await
    }
}
