//! caselaw-rag: retrieval-augmented question answering over case law
//!
//! A query is embedded, matched against a vector index of judgment chunks,
//! reranked by a cross-encoder, assembled into a numbered context block and
//! answered by the first generation provider that succeeds. Answers carry the
//! citations they actually reference.

pub mod config;
pub mod error;
pub mod generation;
pub mod history;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{PipelineParts, QueryPipeline};
pub use types::{
    query::QueryRequest,
    response::{Citation, GenerationResult, Outcome, QueryResponse},
};
