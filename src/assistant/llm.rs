//! The language-model capability the dialogue controller drives.
//!
//! Given a system prompt, the conversation so far and the tool catalog, a
//! model either answers in text or asks for one or more tools to be run.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::LeaveError;
use crate::model::conversation::{ToolInvocation, Turn};

/// Name, description and JSON schema of one tool, as shown to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// One model decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlmDecision {
    /// Assistant text; the final answer when `tool_calls` is empty.
    pub content: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl LlmDecision {
    pub fn answer(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tools(calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: String::new(),
            tool_calls: calls,
        }
    }

    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn invoke(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LlmDecision, LeaveError>;
}
