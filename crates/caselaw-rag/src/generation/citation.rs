//! Final answer extraction and referenced-citation detection

use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::types::{Citation, ContextBlock};

/// Parses raw model output into the user-facing answer and its citations
pub struct AnswerParser {
    final_header: Regex,
    loose_final_header: Regex,
    fallback_header: Regex,
    emphasis: Regex,
    marker: Regex,
}

impl AnswerParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str, case_insensitive: bool| {
            RegexBuilder::new(pattern)
                .case_insensitive(case_insensitive)
                .build()
                .map_err(|e| Error::internal(format!("Invalid answer pattern: {}", e)))
        };

        Ok(Self {
            final_header: compile(r"\n\s*Final Answer:\s*\n", false)?,
            loose_final_header: compile(r"Final Answer\s*:\s*", true)?,
            fallback_header: compile(r"(?:Answer|Conclusion)\s*:\s*", true)?,
            emphasis: compile(r"\*{2,}", false)?,
            marker: compile(r"\[\s*(\d+(?:\s*,\s*\d+)*)\s*\]", false)?,
        })
    }

    /// Text after the `Final Answer:` header
    ///
    /// Tries the exact header on its own line, then the first inline
    /// `Final Answer:`, then the first `Answer:` or `Conclusion:`, then falls
    /// back to the whole output. Markdown emphasis runs are removed.
    pub fn final_answer(&self, raw: &str) -> String {
        let normalized = raw.replace("\r\n", "\n");
        let stripped = self.emphasis.replace_all(&normalized, "");

        let header = self
            .final_header
            .find(&stripped)
            .or_else(|| self.loose_final_header.find(&stripped))
            .or_else(|| self.fallback_header.find(&stripped));

        let answer = if let Some(m) = header {
            &stripped[m.end()..]
        } else {
            tracing::warn!("Model output missing 'Final Answer:' header, using full output");
            &stripped[..]
        };

        let answer = answer.trim();
        if answer.is_empty() {
            stripped.trim().to_string()
        } else {
            answer.to_string()
        }
    }

    /// Context entries the answer refers to, in index order
    ///
    /// An entry counts when its `[n]` marker appears (including grouped forms
    /// such as `[1, 3]`) or its citation string is quoted verbatim. Bare ids
    /// are never matched verbatim. Markers outside `1..=len` are ignored.
    pub fn referenced_citations(&self, answer: &str, context: &ContextBlock) -> Vec<Citation> {
        let mut indices = BTreeSet::new();

        for cap in self.marker.captures_iter(answer) {
            let Some(group) = cap.get(1) else { continue };
            for number in group.as_str().split(',') {
                if let Ok(index) = number.trim().parse::<usize>() {
                    if context.get(index).is_some() {
                        indices.insert(index);
                    }
                }
            }
        }

        for entry in context.entries() {
            let candidate = &entry.passage.candidate;
            let citation = candidate.citation_string.trim();
            if candidate.has_named_citation() && answer.contains(citation) {
                indices.insert(entry.index);
            }
        }

        indices
            .into_iter()
            .filter_map(|index| context.get(index))
            .map(Citation::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::test_support::candidate;
    use crate::types::RankedPassage;

    fn block(n: usize) -> ContextBlock {
        ContextBlock::from_ordered(
            (1..=n)
                .map(|i| RankedPassage::new(candidate(&format!("case-{}", i), 0.5), 0.5))
                .collect(),
        )
    }

    #[test]
    fn test_strict_final_answer_split() {
        let parser = AnswerParser::new().unwrap();
        let raw =
            "Reasoning:\nThe issue is costs.\r\n\r\nFinal Answer:\r\nCosts follow the event [1].";
        assert_eq!(parser.final_answer(raw), "Costs follow the event [1].");
    }

    #[test]
    fn test_fallback_header_and_emphasis() {
        let parser = AnswerParser::new().unwrap();
        let raw = "**Reasoning:** ...\n**Conclusion:** The appeal **fails** [2].";
        assert_eq!(parser.final_answer(raw), "The appeal fails [2].");
    }

    #[test]
    fn test_inline_conclusion_does_not_truncate_answer() {
        let parser = AnswerParser::new().unwrap();
        let context = block(2);
        let raw = "Reasoning: ...\nFinal Answer: The objection fails [1]. \
                   In conclusion: costs to the respondent [2].";

        let answer = parser.final_answer(raw);
        assert_eq!(
            answer,
            "The objection fails [1]. In conclusion: costs to the respondent [2]."
        );
        assert_eq!(parser.referenced_citations(&answer, &context).len(), 2);
    }

    #[test]
    fn test_first_fallback_header_wins() {
        let parser = AnswerParser::new().unwrap();
        let raw = "Answer: The plaintiff succeeds. Conclusion: damages follow.";
        assert_eq!(
            parser.final_answer(raw),
            "The plaintiff succeeds. Conclusion: damages follow."
        );
    }

    #[test]
    fn test_missing_header_uses_full_output() {
        let parser = AnswerParser::new().unwrap();
        assert_eq!(parser.final_answer("  The suit is time barred.  "), "The suit is time barred.");
    }

    #[test]
    fn test_referenced_markers_in_index_order() {
        let parser = AnswerParser::new().unwrap();
        let context = block(4);
        let answer = "Held [3]. See also [1, 3] and [ 9 ] and [0].";

        let cited: Vec<usize> = parser
            .referenced_citations(answer, &context)
            .iter()
            .map(|c| c.index)
            .collect();
        assert_eq!(cited, vec![1, 3]);
    }

    #[test]
    fn test_verbatim_citation_string_counts() {
        let parser = AnswerParser::new().unwrap();
        let context = block(3);
        let answer = "As held in case-2 [2020] eKLR, the objection fails.";

        let cited = parser.referenced_citations(answer, &context);
        assert_eq!(cited.len(), 1);
        assert_eq!(cited[0].case_id, "case-2");
        assert_eq!(cited[0].index, 2);
    }

    #[test]
    fn test_bare_id_citation_is_not_matched_verbatim() {
        let parser = AnswerParser::new().unwrap();
        let mut bare = candidate("12", 0.5);
        bare.citation_string = "12".to_string();
        let context = ContextBlock::from_ordered(vec![RankedPassage::new(bare, 0.5)]);

        let answer = "The limitation period is 12 years.";
        assert!(parser.referenced_citations(answer, &context).is_empty());
        assert_eq!(parser.referenced_citations("Barred [1].", &context).len(), 1);
    }

    #[test]
    fn test_no_markers_no_citations() {
        let parser = AnswerParser::new().unwrap();
        assert!(parser.referenced_citations("No authority given.", &block(2)).is_empty());
    }
}
