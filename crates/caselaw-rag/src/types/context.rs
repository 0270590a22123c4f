//! Prompt context block

use serde::{Deserialize, Serialize};

use super::passage::RankedPassage;

/// A passage selected for the prompt with its citation index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// 1-based citation index, stable for the request
    pub index: usize,
    pub passage: RankedPassage,
}

/// Ordered, deduplicated passages handed to the generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextBlock {
    entries: Vec<ContextEntry>,
}

impl ContextBlock {
    /// Build from passages already in final order; indices are assigned 1..N
    pub(crate) fn from_ordered(passages: Vec<RankedPassage>) -> Self {
        let entries = passages
            .into_iter()
            .enumerate()
            .map(|(i, passage)| ContextEntry {
                index: i + 1,
                passage,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for a citation index
    pub fn get(&self, index: usize) -> Option<&ContextEntry> {
        index
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .filter(|entry| entry.index == index)
    }
}
