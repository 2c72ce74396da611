//! The fixed set of operations the model may ask for.
//!
//! Each tool is registered with a typed argument struct. Arguments arrive as
//! the model's JSON text and are deserialized into that struct before the
//! handler runs, so a handler never sees malformed input.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::assistant::llm::ToolSpec;
use crate::error::LeaveError;
use crate::ledger::LeaveEngine;
use crate::policy::PolicyCatalog;
use crate::utils::extractor;

/// What a tool runs against. The employee is the authenticated one; tools
/// never take an employee id from the model.
pub struct ToolContext<'a> {
    pub engine: &'a LeaveEngine,
    pub policies: &'a PolicyCatalog,
    pub employee_id: &'a str,
    pub today: NaiveDate,
}

type Handler = Box<dyn Fn(&ToolContext<'_>, Value) -> Result<String, LeaveError> + Send + Sync>;

struct Tool {
    spec: ToolSpec,
    handler: Handler,
}

pub struct ToolCatalog {
    tools: Vec<Tool>,
}

impl ToolCatalog {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    /// Adds a tool whose arguments deserialize into `A`. A later
    /// registration under the same name replaces the earlier one.
    pub fn register<A, F>(&mut self, name: &str, description: &str, parameters: Value, handler: F)
    where
        A: DeserializeOwned,
        F: Fn(&ToolContext<'_>, A) -> Result<String, LeaveError> + Send + Sync + 'static,
    {
        let tool_name = name.to_string();
        let handler: Handler = Box::new(move |ctx, raw| {
            let args = serde_json::from_value::<A>(raw).map_err(|e| {
                LeaveError::InvalidToolArguments {
                    tool: tool_name.clone(),
                    reason: e.to_string(),
                }
            })?;
            handler(ctx, args)
        });
        let spec = ToolSpec {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        };
        self.tools.retain(|t| t.spec.name != name);
        self.tools.push(Tool { spec, handler });
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec.clone()).collect()
    }

    /// Runs `name` with the model's raw JSON arguments. Blank arguments are
    /// read as `{}`.
    pub fn invoke(
        &self,
        ctx: &ToolContext<'_>,
        name: &str,
        raw_args: &str,
    ) -> Result<String, LeaveError> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.spec.name == name)
            .ok_or_else(|| LeaveError::UnknownTool(name.to_string()))?;

        let args = if raw_args.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(raw_args).map_err(|e| LeaveError::InvalidToolArguments {
                tool: name.to_string(),
                reason: e.to_string(),
            })?
        };
        (tool.handler)(ctx, args)
    }
}

impl Default for ToolCatalog {
    /// The leave assistant's catalog.
    fn default() -> Self {
        let mut catalog = Self::empty();

        catalog.register(
            "check_leave_balance",
            "Check the current leave balance of the employee.",
            no_parameters(),
            |ctx, _: NoArgs| ctx.engine.balance_report(ctx.employee_id),
        );

        catalog.register(
            "view_leave_history",
            "View the leave requests the employee has made, with their status.",
            no_parameters(),
            |ctx, _: NoArgs| ctx.engine.history_report(ctx.employee_id),
        );

        catalog.register(
            "get_leave_policy",
            "Get the policy for one leave type, or every policy when no type is given.",
            json!({
                "type": "object",
                "properties": {
                    "leave_type": leave_type_schema("Leave type to look up")
                }
            }),
            |ctx, args: PolicyArgs| Ok(ctx.policies.policy_text(args.leave_type.as_deref())),
        );

        catalog.register(
            "get_holidays",
            "List the upcoming company holidays.",
            no_parameters(),
            |ctx, _: NoArgs| Ok(ctx.policies.upcoming_holidays()),
        );

        catalog.register(
            "check_and_process_leave",
            "Check the balance and submit a leave request in one step. Only call this once leave type, start date and end date are all known.",
            json!({
                "type": "object",
                "properties": {
                    "leave_type": leave_type_schema("Type of leave"),
                    "start_date": {"type": "string", "description": "First day of leave, YYYY-MM-DD"},
                    "end_date": {"type": "string", "description": "Last day of leave, YYYY-MM-DD"},
                    "reason": {"type": "string", "description": "Reason for the leave"}
                },
                "required": ["leave_type", "start_date", "end_date"]
            }),
            |ctx, args: SubmitArgs| {
                ctx.engine
                    .submit(
                        ctx.employee_id,
                        &args.leave_type,
                        &args.start_date,
                        &args.end_date,
                        args.reason.as_deref(),
                    )
                    .map(|outcome| outcome.message)
            },
        );

        catalog.register(
            "update_leave_status",
            "Change the status of an existing leave request, adjusting the balance when it enters or leaves 'approved'.",
            json!({
                "type": "object",
                "properties": {
                    "request_id": {"type": "string", "description": "Request ID such as REQ1"},
                    "new_status": {"type": "string", "description": "New status, e.g. approved, rejected, cancelled"}
                },
                "required": ["request_id", "new_status"]
            }),
            |ctx, args: StatusArgs| {
                ctx.engine
                    .update_status(ctx.employee_id, &args.request_id, &args.new_status)
                    .map(|outcome| outcome.message)
            },
        );

        catalog.register(
            "parse_nlp_leave_request",
            "Read a leave request written in plain language and submit it when type and dates can be recognised.",
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "The employee's request, verbatim"}
                },
                "required": ["text"]
            }),
            |ctx, args: FreeTextArgs| {
                let request = extractor::extract(&args.text);
                let missing = request.missing_fields();
                if missing.is_empty() {
                    return ctx
                        .engine
                        .submit_request(ctx.employee_id, &request)
                        .map(|outcome| outcome.message);
                }
                let mut reply = LeaveError::MissingDetails(missing).to_string();
                if let Some(hints) = extractor::detect_hints(&args.text, ctx.today).summary() {
                    reply.push('\n');
                    reply.push_str(&hints);
                }
                Ok(reply)
            },
        );

        catalog
    }
}

#[derive(Deserialize)]
struct NoArgs {}

#[derive(Deserialize)]
struct PolicyArgs {
    #[serde(default)]
    leave_type: Option<String>,
}

#[derive(Deserialize)]
struct SubmitArgs {
    leave_type: String,
    start_date: String,
    end_date: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct StatusArgs {
    request_id: String,
    new_status: String,
}

#[derive(Deserialize)]
struct FreeTextArgs {
    text: String,
}

fn no_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

fn leave_type_schema(description: &str) -> Value {
    json!({
        "type": "string",
        "enum": crate::model::leave_request::LeaveType::names(),
        "description": description
    })
}
