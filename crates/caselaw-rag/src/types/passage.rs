//! Retrieved and reranked case-law passages

use serde::{Deserialize, Serialize};

/// Metadata stored with each indexed chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Vector id in the index
    pub vector_id: String,
    /// Case title, e.g. "Smith v Jones"
    pub case_title: Option<String>,
    /// Media neutral citation, e.g. "[2020] eKLR"
    pub neutral_citation: Option<String>,
    /// Position of the chunk within its judgment
    pub chunk_sequence: Option<i64>,
    /// Remaining metadata fields
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A chunk returned by vector retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub case_id: String,
    pub text_chunk: String,
    pub citation_string: String,
    /// Higher is more similar
    pub similarity_score: f32,
    pub source_metadata: SourceMetadata,
}

impl Candidate {
    /// Format the human-readable citation for a case
    ///
    /// "<title> <neutral citation>" when both are known, else whichever is
    /// known, else the case id.
    pub fn format_citation(
        case_id: &str,
        case_title: Option<&str>,
        neutral_citation: Option<&str>,
    ) -> String {
        let title = case_title.map(str::trim).filter(|t| !t.is_empty());
        let neutral = neutral_citation.map(str::trim).filter(|n| !n.is_empty());
        match (title, neutral) {
            (Some(t), Some(n)) => format!("{} {}", t, n),
            (Some(t), None) => t.to_string(),
            (None, Some(n)) => n.to_string(),
            (None, None) => case_id.to_string(),
        }
    }

    /// Whether the citation string carries a title or neutral citation
    /// rather than falling back to a bare identifier
    pub fn has_named_citation(&self) -> bool {
        let citation = self.citation_string.trim();
        !citation.is_empty()
            && citation != self.case_id.trim()
            && citation != self.source_metadata.vector_id.trim()
    }
}

/// A candidate with its cross-encoder relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub candidate: Candidate,
    /// Authoritative relevance, not comparable to `similarity_score`
    pub relevance_score: f32,
}

impl RankedPassage {
    pub fn new(candidate: Candidate, relevance_score: f32) -> Self {
        Self {
            candidate,
            relevance_score,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.candidate.case_id
    }
}
