//! Generation results and the external response shape

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::context::ContextEntry;
use super::NO_RELEVANT_CASES;

/// A source the answer actually referenced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Citation index as it appears in the answer, e.g. `[2]`
    pub index: usize,
    pub case_id: String,
    pub citation_string: String,
}

impl From<&ContextEntry> for Citation {
    fn from(entry: &ContextEntry) -> Self {
        Self {
            index: entry.index,
            case_id: entry.passage.candidate.case_id.clone(),
            citation_string: entry.passage.candidate.citation_string.clone(),
        }
    }
}

/// Terminal state of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A provider produced an answer
    Completed,
    /// Nothing relevant was retrieved; no generation attempted
    NoRelevantSources,
    /// An upstream stage or every provider failed
    Failed,
    /// The query was rejected before any network call
    Rejected,
}

/// How a single provider attempt ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum AttemptOutcome {
    Succeeded,
    Transient(String),
    Permanent(String),
}

/// One transition of the failover state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    pub model: String,
    /// 1-based attempt number against this provider
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub final_answer: String,
    /// Referenced citations in index order
    pub citations: Vec<Citation>,
    /// `provider/model` that produced the answer
    pub provider_used: Option<String>,
    /// Set only on the Failed and Rejected paths
    pub error: Option<String>,
    pub outcome: Outcome,
    pub attempts: Vec<ProviderAttempt>,
}

impl GenerationResult {
    pub fn completed(
        final_answer: String,
        citations: Vec<Citation>,
        provider_used: String,
        attempts: Vec<ProviderAttempt>,
    ) -> Self {
        Self {
            final_answer,
            citations,
            provider_used: Some(provider_used),
            error: None,
            outcome: Outcome::Completed,
            attempts,
        }
    }

    pub fn no_relevant_sources() -> Self {
        Self {
            final_answer: NO_RELEVANT_CASES.to_string(),
            citations: Vec::new(),
            provider_used: None,
            error: None,
            outcome: Outcome::NoRelevantSources,
            attempts: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>, attempts: Vec<ProviderAttempt>) -> Self {
        Self {
            final_answer: String::new(),
            citations: Vec::new(),
            provider_used: None,
            error: Some(error.into()),
            outcome: Outcome::Failed,
            attempts,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Rejected,
            ..Self::failed(error, Vec::new())
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Body of the `POST /api/query` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub final_answer: String,
    pub citations: Vec<Citation>,
    pub provider_used: Option<String>,
    pub error: Option<String>,
}

impl From<GenerationResult> for QueryResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            final_answer: result.final_answer,
            citations: result.citations,
            provider_used: result.provider_used,
            error: result.error,
        }
    }
}

/// Interaction record handed to the chat history collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryRecord {
    pub user_id: String,
    pub query: String,
    pub response: String,
    pub citations: Vec<String>,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChatHistoryRecord {
    pub fn from_result(user_id: &str, query: &str, result: &GenerationResult) -> Self {
        Self {
            user_id: user_id.to_string(),
            query: query.to_string(),
            response: result.final_answer.clone(),
            citations: result
                .citations
                .iter()
                .map(|c| c.citation_string.clone())
                .collect(),
            tags: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}
