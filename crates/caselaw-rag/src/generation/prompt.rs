//! Prompt templates for legal answer generation

use crate::types::ContextBlock;

use super::context::render_context;

/// Prompt builder for case-law queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the chain-of-thought legal prompt
    ///
    /// The model must answer under `Reasoning:` and `Final Answer:` headers and
    /// cite sources by their `[n]` marker.
    pub fn build_legal_prompt(query: &str, context: &ContextBlock) -> String {
        format!(
            r#"You are a legal expert answering a query based on court case context. Follow these instructions exactly to produce a professional, accurate response with proper citations. Your response MUST include the headers 'Reasoning:' and 'Final Answer:' as shown below.

1. CONTEXT ANALYSIS
The context consists of numbered excerpts from court judgments. Each excerpt is headed by its citation marker, case title and neutral citation, for example "[1] Smith v Jones [2020] eKLR".

2. REASONING STEP BY STEP
- Identify the legal issue raised by the query.
- Extract the relevant legal principles and facts from the context, citing each with its marker, e.g. [1].
- Apply the law to the query in a logical argument, citing the context.
- Consider counterarguments where applicable and explain why they do not apply.

3. FINAL ANSWER
- Give a concise, authoritative answer in formal legal language.
- Support every claim with the citation marker of the excerpt it comes from, e.g. [2] or [1, 3].
- Use ONLY the context. Never cite a case that is not in the context.
- Exclude speculative statements and reasoning steps.

4. OUTPUT FORMAT (MANDATORY)
Reasoning:
<your step-by-step analysis>

Final Answer:
<your answer with citation markers>

If the context is insufficient, give a partial answer under 'Final Answer:' and state the limitation.

---
CONTEXT:
{context}
---
QUERY:
{query}
---
"#,
            context = render_context(context),
            query = query.trim()
        )
    }
}
