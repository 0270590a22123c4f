//! Query types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body of `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The legal research question
    pub query: String,
    /// Opaque requester identifier
    pub user_id: String,
}

/// One query flowing through the pipeline
#[derive(Debug, Clone)]
pub struct Query {
    /// Correlates log lines of one request
    pub id: Uuid,
    /// Query text as received
    pub text: String,
    /// Opaque requester identifier
    pub requester_id: String,
}

impl Query {
    pub fn new(text: impl Into<String>, requester_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            requester_id: requester_id.into(),
        }
    }

    /// Query text without surrounding whitespace
    pub fn trimmed(&self) -> &str {
        self.text.trim()
    }

    /// True if nothing but whitespace was submitted
    pub fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}
