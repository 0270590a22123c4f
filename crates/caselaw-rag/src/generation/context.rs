//! Context block assembly

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{ContextBlock, RankedPassage};

/// Deduplicates reranked passages and caps them at `max_citations`
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAssembler;

impl ContextAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt context
    ///
    /// One entry per case, keeping the most relevant passage. Passages
    /// without a case id are deduplicated on their normalized text instead.
    /// Fails with `EmptyContext` when nothing survives.
    pub fn assemble(
        &self,
        mut ranked: Vec<RankedPassage>,
        max_citations: usize,
    ) -> Result<ContextBlock> {
        if max_citations == 0 {
            return Err(Error::invalid_input("max_citations must be positive"));
        }

        // Stable, so equal scores keep reranker order
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        let mut seen = HashSet::new();
        let selected: Vec<RankedPassage> = ranked
            .into_iter()
            .filter(|passage| seen.insert(dedup_key(passage)))
            .take(max_citations)
            .collect();

        if selected.is_empty() {
            return Err(Error::EmptyContext);
        }

        Ok(ContextBlock::from_ordered(selected))
    }
}

#[derive(Hash, PartialEq, Eq)]
enum DedupKey {
    Case(String),
    Text(String),
}

fn dedup_key(passage: &RankedPassage) -> DedupKey {
    let case_id = passage.case_id().trim();
    if case_id.is_empty() {
        DedupKey::Text(normalize_text(&passage.candidate.text_chunk))
    } else {
        DedupKey::Case(case_id.to_string())
    }
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Render the context block as prompt text, one `[n]` headed block per entry
pub fn render_context(block: &ContextBlock) -> String {
    let mut context = String::new();

    for entry in block.entries() {
        let candidate = &entry.passage.candidate;
        context.push_str(&format!("[{}] {}", entry.index, candidate.citation_string));
        if let Some(sequence) = candidate.source_metadata.chunk_sequence {
            context.push_str(&format!(" (chunk {})", sequence));
        }
        context.push_str(&format!("\n{}\n\n---\n\n", candidate.text_chunk.trim()));
    }

    context
}
