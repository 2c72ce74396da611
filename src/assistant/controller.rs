use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::assistant::llm::{LlmClient, LlmDecision, ToolSpec};
use crate::assistant::prompt::system_prompt;
use crate::assistant::tools::{ToolCatalog, ToolContext};
use crate::error::{ErrorKind, LeaveError};
use crate::ledger::LeaveEngine;
use crate::model::conversation::{ToolInvocation, Turn};
use crate::policy::PolicyCatalog;

/// Reply used whenever the model cannot produce an answer.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an issue. Could you try again?";

/// Result of one chat turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    /// The history passed in, extended with the user turn, any tool-call and
    /// tool-result turns, and the final assistant turn.
    pub history: Vec<Turn>,
}

enum State {
    AwaitingModel,
    ExecutingTools(Vec<ToolInvocation>),
    Terminal(Result<String, LeaveError>),
}

/// Alternates between asking the model and running the tools it requests
/// until the model answers in text, fails, or uses up `max_steps` calls.
pub struct DialogueController {
    llm: Arc<dyn LlmClient>,
    catalog: ToolCatalog,
    engine: LeaveEngine,
    policies: PolicyCatalog,
    max_steps: usize,
    model_timeout: Duration,
}

impl DialogueController {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        catalog: ToolCatalog,
        engine: LeaveEngine,
        policies: PolicyCatalog,
        max_steps: usize,
        model_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            catalog,
            engine,
            policies,
            max_steps,
            model_timeout,
        }
    }

    pub fn engine(&self) -> &LeaveEngine {
        &self.engine
    }

    pub async fn handle_turn(
        &self,
        employee_id: &str,
        history: Vec<Turn>,
        new_message: &str,
    ) -> Result<TurnOutcome, LeaveError> {
        self.handle_turn_on(Local::now().date_naive(), employee_id, history, new_message)
            .await
    }

    /// [`handle_turn`](Self::handle_turn) with an explicit current date.
    #[instrument(skip_all, fields(employee_id = %employee_id, today = %today))]
    pub async fn handle_turn_on(
        &self,
        today: NaiveDate,
        employee_id: &str,
        mut history: Vec<Turn>,
        new_message: &str,
    ) -> Result<TurnOutcome, LeaveError> {
        let name = self
            .engine
            .store()
            .record_name(employee_id)
            .ok_or_else(|| LeaveError::EmployeeNotFound(employee_id.to_string()))?;

        let prompt = system_prompt(today, &name, employee_id);
        let specs = self.catalog.specs();
        let ctx = ToolContext {
            engine: &self.engine,
            policies: &self.policies,
            employee_id,
            today,
        };

        history.push(Turn::user(new_message));
        let mut steps = 0;
        let mut last_tool_output = None;
        let mut state = State::AwaitingModel;

        let result = loop {
            state = match state {
                State::AwaitingModel => {
                    if steps >= self.max_steps {
                        State::Terminal(Err(LeaveError::StepBudgetExhausted(self.max_steps)))
                    } else {
                        steps += 1;
                        debug!(step = steps, turns = history.len(), "Asking model");
                        match self.decide(&prompt, &history, &specs).await {
                            Ok(decision) if decision.is_final() => {
                                State::Terminal(Ok(decision.content))
                            }
                            Ok(LlmDecision {
                                content,
                                tool_calls,
                            }) => {
                                history.push(Turn::assistant_tool_calls(content, tool_calls.clone()));
                                State::ExecutingTools(tool_calls)
                            }
                            Err(e) => State::Terminal(Err(e)),
                        }
                    }
                }
                State::ExecutingTools(calls) => {
                    for call in calls {
                        let output = self.run_tool(&ctx, &call);
                        last_tool_output = Some(output.clone());
                        history.push(Turn::tool_result(call.id, output));
                    }
                    State::AwaitingModel
                }
                State::Terminal(result) => break result,
            };
        };

        let response = match result {
            Ok(answer) => {
                info!(steps, "Dialogue turn answered");
                answer
            }
            Err(e) => {
                warn!(steps, error = %e, "Dialogue turn failed, replying with fallback");
                match last_tool_output {
                    Some(output) => format!(
                        "{FALLBACK_REPLY} Some actions may already have completed. Last result:\n{output}"
                    ),
                    None => FALLBACK_REPLY.to_string(),
                }
            }
        };
        history.push(Turn::assistant(response.clone()));
        Ok(TurnOutcome { response, history })
    }

    async fn decide(
        &self,
        prompt: &str,
        history: &[Turn],
        specs: &[ToolSpec],
    ) -> Result<LlmDecision, LeaveError> {
        let decision = tokio::time::timeout(self.model_timeout, self.llm.invoke(prompt, history, specs))
            .await
            .map_err(|_| LeaveError::ModelTimeout(self.model_timeout))??;
        if decision.is_final() && decision.content.trim().is_empty() {
            return Err(LeaveError::Model("empty answer".to_string()));
        }
        Ok(decision)
    }

    /// Tool failures become the tool's textual result so the model can react.
    fn run_tool(&self, ctx: &ToolContext<'_>, call: &ToolInvocation) -> String {
        match self.catalog.invoke(ctx, &call.name, &call.arguments) {
            Ok(output) => {
                debug!(tool = %call.name, "Tool succeeded");
                output
            }
            Err(e) => {
                match e.kind() {
                    ErrorKind::NotFound | ErrorKind::Validation => {
                        info!(tool = %call.name, error = %e, "Tool rejected call")
                    }
                    _ => warn!(tool = %call.name, error = %e, "Tool failed"),
                }
                format!("Error: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::mock::MockLlm;
    use crate::ledger::{LedgerStore, seed::demo_employees};
    use crate::model::conversation::TurnRole;
    use crate::model::leave_request::LeaveType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn call(id: &str, name: &str, args: &str) -> ToolInvocation {
        ToolInvocation {
            id: id.into(),
            name: name.into(),
            arguments: args.into(),
        }
    }

    fn controller(llm: Arc<MockLlm>, max_steps: usize) -> DialogueController {
        DialogueController::new(
            llm,
            ToolCatalog::default(),
            LeaveEngine::new(Arc::new(LedgerStore::new(demo_employees()))),
            PolicyCatalog,
            max_steps,
            Duration::from_secs(5),
        )
    }

    #[actix_web::test]
    async fn direct_answer_appends_two_turns() {
        let llm = Arc::new(MockLlm::new([Ok(LlmDecision::answer("Hi Alice!"))]));
        let ctl = controller(llm.clone(), 4);
        let prior = vec![Turn::assistant("Hello Alice Smith!")];

        let out = ctl
            .handle_turn_on(today(), "E001", prior, "hello")
            .await
            .unwrap();
        assert_eq!(out.response, "Hi Alice!");
        assert_eq!(
            out.history,
            vec![
                Turn::assistant("Hello Alice Smith!"),
                Turn::user("hello"),
                Turn::assistant("Hi Alice!"),
            ]
        );

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].system_prompt.contains("Alice Smith (Employee ID: E001)"));
        assert!(calls[0].system_prompt.contains("2025-06-01"));
        assert_eq!(calls[0].tool_names.len(), 7);
    }

    #[actix_web::test]
    async fn tool_results_are_fed_back_and_kept() {
        let llm = Arc::new(MockLlm::new([
            Ok(LlmDecision::tools(vec![call("c1", "check_leave_balance", "{}")])),
            Ok(LlmDecision::answer("You have 14 annual days left.")),
        ]));
        let ctl = controller(llm.clone(), 4);

        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "what is my balance?")
            .await
            .unwrap();
        assert_eq!(out.response, "You have 14 annual days left.");

        let roles: Vec<TurnRole> = out.history.iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            [TurnRole::User, TurnRole::Assistant, TurnRole::Tool, TurnRole::Assistant]
        );
        assert_eq!(out.history[2].tool_call_id.as_deref(), Some("c1"));
        assert!(out.history[2].content.starts_with("Leave balance for Alice Smith"));

        let second = &llm.calls()[1];
        assert_eq!(second.history.len(), 3);
        assert_eq!(second.history[2].role, TurnRole::Tool);
    }

    #[actix_web::test]
    async fn submission_through_tools_updates_ledger() {
        let llm = Arc::new(MockLlm::new([
            Ok(LlmDecision::tools(vec![call(
                "c1",
                "check_and_process_leave",
                r#"{"leave_type":"annual","start_date":"2025-07-07","end_date":"2025-07-11"}"#,
            )])),
            Ok(LlmDecision::answer("Approved, REQ2.")),
        ]));
        let ctl = controller(llm, 4);
        ctl.handle_turn_on(today(), "E001", Vec::new(), "book annual 7-11 July")
            .await
            .unwrap();

        let record = ctl.engine().store().lookup("E001").unwrap();
        assert_eq!(record.balances[&LeaveType::Annual], 9);
        assert_eq!(record.history.len(), 2);
    }

    #[actix_web::test]
    async fn unknown_tool_is_reported_to_the_model() {
        let llm = Arc::new(MockLlm::new([
            Ok(LlmDecision::tools(vec![call("c1", "fire_manager", "{}")])),
            Ok(LlmDecision::answer("I can't do that.")),
        ]));
        let ctl = controller(llm, 4);
        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "fire my manager")
            .await
            .unwrap();
        assert_eq!(out.history[2].content, "Error: Unknown tool 'fire_manager'.");
        assert_eq!(out.response, "I can't do that.");
    }

    #[actix_web::test]
    async fn model_failure_yields_fallback_without_mutation() {
        let llm = Arc::new(MockLlm::new([Err(LeaveError::Model("boom".into()))]));
        let ctl = controller(llm, 4);
        let before = ctl.engine().store().lookup("E001").unwrap();

        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "annual leave tomorrow")
            .await
            .unwrap();
        assert_eq!(out.response, FALLBACK_REPLY);
        assert_eq!(out.history.last(), Some(&Turn::assistant(FALLBACK_REPLY)));

        let after = ctl.engine().store().lookup("E001").unwrap();
        assert_eq!(before.balances, after.balances);
        assert_eq!(before.history, after.history);
    }

    #[actix_web::test]
    async fn empty_answer_is_a_failure() {
        let llm = Arc::new(MockLlm::new([Ok(LlmDecision::answer("   "))]));
        let out = controller(llm, 4)
            .handle_turn_on(today(), "E002", Vec::new(), "hi")
            .await
            .unwrap();
        assert_eq!(out.response, FALLBACK_REPLY);
    }

    #[actix_web::test]
    async fn slow_model_times_out() {
        let llm = Arc::new(
            MockLlm::new([Ok(LlmDecision::answer("too late"))])
                .with_delay(Duration::from_millis(200)),
        );
        let ctl = DialogueController::new(
            llm,
            ToolCatalog::default(),
            LeaveEngine::new(Arc::new(LedgerStore::new(demo_employees()))),
            PolicyCatalog,
            4,
            Duration::from_millis(20),
        );
        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "hi")
            .await
            .unwrap();
        assert_eq!(out.response, FALLBACK_REPLY);
    }

    #[actix_web::test]
    async fn step_budget_bounds_the_loop() {
        let llm = Arc::new(MockLlm::default());
        for i in 0..10 {
            llm.push(Ok(LlmDecision::tools(vec![call(
                &format!("c{i}"),
                "get_holidays",
                "",
            )])));
        }
        let ctl = controller(llm.clone(), 3);
        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "holidays?")
            .await
            .unwrap();
        assert!(out.response.starts_with(FALLBACK_REPLY));
        assert_eq!(llm.calls().len(), 3);
    }

    #[actix_web::test]
    async fn failure_after_a_submission_reports_the_last_result() {
        let llm = Arc::new(MockLlm::new([
            Ok(LlmDecision::tools(vec![call(
                "c1",
                "check_and_process_leave",
                r#"{"leave_type":"annual","start_date":"2025-07-07","end_date":"2025-07-11"}"#,
            )])),
            Err(LeaveError::Model("connection reset".into())),
        ]));
        let ctl = controller(llm, 4);
        let out = ctl
            .handle_turn_on(today(), "E001", Vec::new(), "book annual 7-11 July")
            .await
            .unwrap();

        assert!(out.response.starts_with(FALLBACK_REPLY));
        assert!(out.response.contains("may already have completed"));
        assert!(out.response.contains("REQ2"));
        assert_eq!(out.history.last(), Some(&Turn::assistant(out.response.clone())));
        assert_eq!(ctl.engine().store().lookup("E001").unwrap().history.len(), 2);
    }

    #[actix_web::test]
    async fn unknown_employee_is_rejected_before_model_call() {
        let llm = Arc::new(MockLlm::new([Ok(LlmDecision::answer("hi"))]));
        let ctl = controller(llm.clone(), 4);
        let err = ctl
            .handle_turn_on(today(), "E404", Vec::new(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, LeaveError::EmployeeNotFound(_)));
        assert!(llm.calls().is_empty());
    }
}
