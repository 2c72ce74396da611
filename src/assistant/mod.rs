//! Model-driven dialogue over the leave tools.

pub mod controller;
pub mod llm;
pub mod mock;
pub mod openai;
pub mod prompt;
pub mod tools;

pub use controller::{DialogueController, FALLBACK_REPLY, TurnOutcome};
pub use llm::{LlmClient, LlmDecision, ToolSpec};
pub use tools::{ToolCatalog, ToolContext};
