//! Core types for the case-law RAG pipeline

pub mod context;
pub mod passage;
pub mod query;
pub mod response;

pub use context::{ContextBlock, ContextEntry};
pub use passage::{Candidate, RankedPassage, SourceMetadata};
pub use query::{Query, QueryRequest};
pub use response::{
    AttemptOutcome, ChatHistoryRecord, Citation, GenerationResult, Outcome, ProviderAttempt,
    QueryResponse,
};

/// Answer returned when no passage survives retrieval and rerank
pub const NO_RELEVANT_CASES: &str = "No relevant cases found.";

/// Dense query embedding
pub type EmbeddingVector = Vec<f32>;
