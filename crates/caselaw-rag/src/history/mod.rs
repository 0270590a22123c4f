//! Chat history sinks
//!
//! The pipeline emits one [`ChatHistoryRecord`] per answered query; where it
//! ends up is the sink's business.

pub mod sqlite;

pub use sqlite::SqliteHistory;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ChatHistoryRecord;

/// Destination for finished interactions
#[async_trait]
pub trait HistorySink: Send + Sync {
    async fn record(&self, record: &ChatHistoryRecord) -> Result<()>;

    fn name(&self) -> &str;
}

/// Sink that drops every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHistory;

#[async_trait]
impl HistorySink for NoopHistory {
    async fn record(&self, record: &ChatHistoryRecord) -> Result<()> {
        tracing::trace!(user_id = %record.user_id, "History disabled, record dropped");
        Ok(())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
