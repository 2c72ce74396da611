//! Client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assistant::llm::{LlmClient, LlmDecision, ToolSpec};
use crate::config::Config;
use crate::error::LeaveError;
use crate::model::conversation::{ToolInvocation, Turn, TurnRole};

pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
}

impl OpenAiClient {
    pub fn from_config(config: &Config) -> Result<Self, LeaveError> {
        Self::new(
            &config.llm_base_url,
            config.llm_api_key.clone(),
            &config.llm_model,
            config.llm_temperature,
            config.llm_timeout(),
        )
    }

    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self, LeaveError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LeaveError::Model(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            temperature,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn invoke(
        &self,
        system_prompt: &str,
        history: &[Turn],
        tools: &[ToolSpec],
    ) -> Result<LlmDecision, LeaveError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: wire_messages(system_prompt, history),
            tools: tools.iter().map(WireTool::from).collect(),
            tool_choice: (!tools.is_empty()).then_some("auto"),
        };

        let mut request = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!(model = %self.model, turns = history.len(), "Calling chat completions");
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                LeaveError::Model("request timed out".to_string())
            } else {
                LeaveError::Model(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, body = %text, "Chat completions returned an error");
            return Err(LeaveError::Model(format!("HTTP {status}")));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LeaveError::Model(format!("unreadable completion: {e}")))?;
        decision_from(completion)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolFunction<'a>,
}

#[derive(Serialize)]
struct WireToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

impl<'a> From<&'a ToolSpec> for WireTool<'a> {
    fn from(spec: &'a ToolSpec) -> Self {
        Self {
            kind: "function",
            function: WireToolFunction {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.parameters,
            },
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

fn function_kind() -> String {
    "function".to_string()
}

fn wire_messages(system_prompt: &str, history: &[Turn]) -> Vec<WireMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(WireMessage {
        role: "system".to_string(),
        content: Some(system_prompt.to_string()),
        tool_calls: None,
        tool_call_id: None,
    });
    messages.extend(history.iter().map(|turn| match turn.role {
        TurnRole::User => WireMessage {
            role: "user".to_string(),
            content: Some(turn.content.clone()),
            tool_calls: None,
            tool_call_id: None,
        },
        TurnRole::Assistant => WireMessage {
            role: "assistant".to_string(),
            content: Some(turn.content.clone()),
            tool_calls: (!turn.tool_calls.is_empty()).then(|| {
                turn.tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        kind: function_kind(),
                        function: WireFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect()
            }),
            tool_call_id: None,
        },
        TurnRole::Tool => WireMessage {
            role: "tool".to_string(),
            content: Some(turn.content.clone()),
            tool_calls: None,
            tool_call_id: turn.tool_call_id.clone(),
        },
    }));
    messages
}

fn decision_from(completion: ChatCompletion) -> Result<LlmDecision, LeaveError> {
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| LeaveError::Model("completion has no choices".to_string()))?;

    let tool_calls: Vec<ToolInvocation> = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolInvocation {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        })
        .collect();
    let content = message.content.unwrap_or_default();

    if tool_calls.is_empty() && content.trim().is_empty() {
        return Err(LeaveError::Model(
            "completion has neither content nor tool calls".to_string(),
        ));
    }
    Ok(LlmDecision {
        content,
        tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn history_maps_to_openai_roles() {
        let call = ToolInvocation {
            id: "call_1".into(),
            name: "check_leave_balance".into(),
            arguments: "{}".into(),
        };
        let history = vec![
            Turn::user("balance?"),
            Turn::assistant_tool_calls("", vec![call]),
            Turn::tool_result("call_1", "Leave balance for Alice Smith"),
            Turn::assistant("You have 14 annual days."),
        ];
        let wire = serde_json::to_value(wire_messages("be helpful", &history)).unwrap();
        assert_eq!(
            wire,
            json!([
                {"role": "system", "content": "be helpful"},
                {"role": "user", "content": "balance?"},
                {"role": "assistant", "content": "", "tool_calls": [
                    {"id": "call_1", "type": "function",
                     "function": {"name": "check_leave_balance", "arguments": "{}"}}
                ]},
                {"role": "tool", "content": "Leave balance for Alice Smith", "tool_call_id": "call_1"},
                {"role": "assistant", "content": "You have 14 annual days."}
            ])
        );
    }

    #[test]
    fn tool_specs_are_wrapped_as_functions() {
        let spec = ToolSpec {
            name: "get_holidays".into(),
            description: "List holidays".into(),
            parameters: json!({"type": "object", "properties": {}}),
        };
        let wire = serde_json::to_value(WireTool::from(&spec)).unwrap();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["name"], "get_holidays");
    }

    #[test]
    fn completion_with_tool_calls() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{"id": "call_9", "type": "function",
                    "function": {"name": "get_holidays", "arguments": "{}"}}]
            }}]
        }))
        .unwrap();
        let decision = decision_from(completion).unwrap();
        assert!(!decision.is_final());
        assert_eq!(decision.tool_calls[0].name, "get_holidays");
        assert_eq!(decision.tool_calls[0].id, "call_9");
    }

    #[test]
    fn completion_with_text_answer() {
        let completion: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hi Alice"}}]
        }))
        .unwrap();
        assert_eq!(decision_from(completion).unwrap(), LlmDecision::answer("Hi Alice"));
    }

    #[test]
    fn empty_completions_are_failures() {
        let none: ChatCompletion = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(decision_from(none), Err(LeaveError::Model(_))));

        let blank: ChatCompletion = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "  "}}]
        }))
        .unwrap();
        assert!(matches!(decision_from(blank), Err(LeaveError::Model(_))));
    }
}
