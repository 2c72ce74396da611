use crate::api::chat::{ChatRequest, ChatResponse};
use crate::api::leave_request::{
    BalanceResponse, CreateLeave, ExtractLeave, ExtractResponse, HistoryResponse,
    HolidaysResponse, PolicyQuery, PolicyResponse, UpdateStatus,
};
use crate::ledger::engine::{StatusUpdateOutcome, SubmissionOutcome};
use crate::model::conversation::{ToolInvocation, Turn, TurnRole};
use crate::model::leave_request::{LeaveRecord, LeaveRequest, LeaveType};
use crate::models::{LoginReqDto, LoginResponse};
use crate::policy::Holiday;
use crate::utils::extractor::LeaveHints;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Assistant API",
        version = "1.0.0",
        description = r#"
## Conversational Leave Management

A chat assistant for employee leave, backed by a small set of deterministic operations.

### Key Features
- **Chat**
  - Ask about balances, history, policies and holidays, or request leave in plain language
- **Leave**
  - Direct endpoints for balance, history, policy and holiday lookups
  - Submit a request: auto-approved when the balance covers it, otherwise forwarded to the manager
  - Change a request's status; the balance follows transitions into and out of `approved`

### Security
Every `/api` endpoint needs a **JWT Bearer** token from `POST /auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::logout,

        crate::api::leave_request::leave_balance,
        crate::api::leave_request::leave_history,
        crate::api::leave_request::leave_policy,
        crate::api::leave_request::holidays,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::update_status,
        crate::api::leave_request::extract_leave,

        crate::api::chat::chat,
        crate::api::chat::chat_history,
        crate::api::chat::clear_chat
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            LeaveType,
            LeaveRecord,
            LeaveRequest,
            LeaveHints,
            Holiday,
            CreateLeave,
            UpdateStatus,
            ExtractLeave,
            PolicyQuery,
            BalanceResponse,
            HistoryResponse,
            PolicyResponse,
            HolidaysResponse,
            ExtractResponse,
            SubmissionOutcome,
            StatusUpdateOutcome,
            ChatRequest,
            ChatResponse,
            Turn,
            TurnRole,
            ToolInvocation
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and logout"),
        (name = "Leave", description = "Direct leave management APIs"),
        (name = "Chat", description = "Conversational assistant"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
