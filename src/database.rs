use crate::storage::Storage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use sqlite::{Connection, State};
use std::sync::Arc;
use tokio::sync::Mutex;

/// SQLite-backed client storage. One row per key, mirroring browser local storage.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        let connection = sqlite::open(database_path)
            .with_context(|| format!("Failed to open storage database: {database_path}"))?;
        let db = Database {
            connection: Arc::new(Mutex::new(connection)),
        };

        db.init_tables().await?;
        info!("Storage initialized at: {database_path}");
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        let conn = self.connection.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                storage_key TEXT PRIMARY KEY,
                storage_value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
        )?;

        Ok(())
    }

    /// All stored keys, sorted
    pub async fn keys(&self) -> Result<Vec<String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("SELECT storage_key FROM local_storage ORDER BY storage_key")?;

        let mut keys = Vec::new();
        while let State::Row = statement.next()? {
            keys.push(statement.read::<String, _>(0)?);
        }
        Ok(keys)
    }
}

#[async_trait]
impl Storage for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "SELECT storage_value FROM local_storage WHERE storage_key = ?"
        )?;
        statement.bind((1, key))?;

        match statement.next()? {
            State::Row => Ok(Some(statement.read::<String, _>(0)?)),
            State::Done => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare(
            "INSERT OR REPLACE INTO local_storage (storage_key, storage_value, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)"
        )?;
        statement.bind((1, key))?;
        statement.bind((2, value))?;
        statement.next()?;
        debug!("Stored {} bytes under '{key}'", value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection.lock().await;
        let mut statement = conn.prepare("DELETE FROM local_storage WHERE storage_key = ?")?;
        statement.bind((1, key))?;
        statement.next()?;
        debug!("Removed '{key}' from storage");
        Ok(())
    }
}
