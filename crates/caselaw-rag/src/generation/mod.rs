//! Context assembly and answer generation with citation handling

pub mod citation;
pub mod context;
pub mod orchestrator;
pub mod prompt;

pub use citation::AnswerParser;
pub use context::{render_context, ContextAssembler};
pub use orchestrator::{GenerationOrchestrator, RetryPolicy};
pub use prompt::PromptBuilder;
