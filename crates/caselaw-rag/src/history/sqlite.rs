//! SQLite chat history table

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::ChatHistoryRecord;

use super::HistorySink;

/// Appends interactions to a local `chat_history` table
#[derive(Clone)]
pub struct SqliteHistory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistory {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::storage(format!("Failed to open history database: {}", e)))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::storage(format!("Failed to open in-memory database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let history = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        history.migrate()?;
        Ok(history)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                query TEXT NOT NULL,
                response TEXT NOT NULL,
                citations TEXT NOT NULL,
                tags TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chat_history_user ON chat_history(user_id, timestamp);
            "#,
        )
        .map_err(|e| Error::storage(format!("Failed to create chat_history table: {}", e)))?;
        Ok(())
    }

    fn insert(&self, record: &ChatHistoryRecord) -> Result<()> {
        let citations = serde_json::to_string(&record.citations)?;
        let tags = serde_json::to_string(&record.tags)?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO chat_history (user_id, query, response, citations, tags, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.user_id,
                record.query,
                record.response,
                citations,
                tags,
                record.timestamp.to_rfc3339(),
            ],
        )
        .map_err(|e| Error::storage(format!("Failed to insert chat history: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl HistorySink for SqliteHistory {
    async fn record(&self, record: &ChatHistoryRecord) -> Result<()> {
        let history = self.clone();
        let record = record.clone();
        tokio::task::spawn_blocking(move || history.insert(&record))
            .await
            .map_err(|e| Error::internal(format!("History writer task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        "sqlite"
    }
}
