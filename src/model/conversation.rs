use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ToolInvocation {
    #[schema(example = "call_1")]
    pub id: String,
    #[schema(example = "check_leave_balance")]
    pub name: String,
    /// JSON-encoded arguments as produced by the model.
    #[schema(example = "{}")]
    pub arguments: String,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Turn {
    pub role: TurnRole,
    #[schema(example = "How many annual leave days do I have left?")]
    pub content: String,

    /// Set on assistant turns that asked for tools.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,

    /// Set on tool-result turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant_tool_calls(content: impl Into<String>, calls: Vec<ToolInvocation>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            tool_calls: calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    /// Plain user or assistant text, i.e. what a chat window shows.
    pub fn is_visible(&self) -> bool {
        match self.role {
            TurnRole::User => true,
            TurnRole::Assistant => self.tool_calls.is_empty(),
            TurnRole::Tool => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_turns_serialize_without_tool_fields() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn tool_turns_are_hidden_from_transcript() {
        let call = ToolInvocation {
            id: "call_1".into(),
            name: "get_holidays".into(),
            arguments: "{}".into(),
        };
        assert!(!Turn::assistant_tool_calls("", vec![call]).is_visible());
        assert!(!Turn::tool_result("call_1", "Upcoming Holidays:").is_visible());
        assert!(Turn::assistant("Done.").is_visible());
    }
}
