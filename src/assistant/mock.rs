//! Scripted model used by tests and offline runs.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::assistant::llm::{LlmClient, LlmDecision, ToolSpec};
use crate::error::LeaveError;
use crate::model::conversation::Turn;

/// What the mock saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system_prompt: String,
    pub history: Vec<Turn>,
    pub tool_names: Vec<String>,
}

/// Replays queued decisions in order. An exhausted script is a model
/// failure.
#[derive(Default)]
pub struct MockLlm {
    script: Mutex<VecDeque<Result<LlmDecision, LeaveError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl MockLlm {
    pub fn new(script: impl IntoIterator<Item = Result<LlmDecision, LeaveError>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Sleeps before every answer, for timeout tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, decision: Result<LlmDecision, LeaveError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(decision);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LlmDecision, LeaveError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                system_prompt: system_prompt.to_string(),
                history: history.to_vec(),
                tool_names: tools.iter().map(|t| t.name.clone()).collect(),
            });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(LeaveError::Model("mock script exhausted".to_string())))
    }
}
