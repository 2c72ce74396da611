use std::collections::BTreeMap;

use crate::auth::{auth::AuthUser, handlers::greeting};
use crate::ledger::LeaveEngine;
use crate::ledger::engine::{StatusUpdateOutcome, SubmissionOutcome};
use crate::model::conversation::Turn;
use crate::model::leave_request::{LeaveRecord, LeaveRequest, LeaveType};
use crate::policy::{Holiday, PolicyCatalog};
use crate::utils::conversation_cache::ConversationStore;
use crate::utils::extractor::{self, LeaveHints};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2025-02-10", format = "date")]
    pub start_date: String,
    #[schema(example = "2025-02-14", format = "date")]
    pub end_date: String,
    #[schema(example = "Family trip", nullable = true)]
    pub reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStatus {
    #[schema(example = "rejected")]
    pub status: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ExtractLeave {
    #[schema(example = "I need sick leave from 2025-06-01 to 2025-06-03 because of a checkup")]
    pub text: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PolicyQuery {
    /// Leave type to look up; every policy when absent or unknown
    #[schema(example = "sick")]
    pub leave_type: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(example = "E001")]
    pub employee_id: String,
    #[schema(example = "Alice Smith")]
    pub name: String,
    #[schema(value_type = Object, example = json!({"annual": 14, "sick": 7, "personal": 3}))]
    pub balances: BTreeMap<LeaveType, u32>,
    pub report: String,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryResponse {
    #[schema(example = "E001")]
    pub employee_id: String,
    pub records: Vec<LeaveRecord>,
    pub report: String,
}

#[derive(Serialize, ToSchema)]
pub struct PolicyResponse {
    #[schema(example = "Sick Leave Policy: Sick leave can be taken as needed with notification to manager.")]
    pub policy: String,
}

#[derive(Serialize, ToSchema)]
pub struct HolidaysResponse {
    pub holidays: Vec<Holiday>,
    pub report: String,
}

#[derive(Serialize, ToSchema)]
pub struct ExtractResponse {
    pub request: LeaveRequest,
    /// Fields still needed before the request can be submitted
    #[schema(example = json!(["start date"]))]
    pub missing: Vec<&'static str>,
    pub hints: LeaveHints,
}

/// Adds a quick action to the chat transcript so later chat turns see it.
async fn record_exchange(
    conversations: &ConversationStore,
    auth: &AuthUser,
    asked: impl Into<String>,
    answer: impl Into<String>,
) {
    conversations
        .append(
            &auth.employee_id,
            greeting(&auth.name),
            vec![Turn::user(asked), Turn::assistant(answer)],
        )
        .await;
}

/// How the leave form reads in the transcript.
fn request_text(payload: &CreateLeave) -> String {
    let mut text = format!(
        "I'd like to request {} leave from {} to {}",
        payload.leave_type, payload.start_date, payload.end_date
    );
    if let Some(reason) = payload.reason.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        text.push_str(" because ");
        text.push_str(reason);
    }
    text
}

/* =========================
Balance
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/balance",
    responses(
        (status = 200, description = "Leave balance of the logged-in employee", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_balance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    conversations: web::Data<ConversationStore>,
) -> actix_web::Result<impl Responder> {
    let record = engine.store().lookup(&auth.employee_id)?;
    let report = engine.balance_report(&auth.employee_id)?;
    record_exchange(&conversations, &auth, "Check my leave balance", report.clone()).await;

    Ok(HttpResponse::Ok().json(BalanceResponse {
        employee_id: record.id,
        name: record.name,
        balances: record.balances,
        report,
    }))
}

/* =========================
History
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/history",
    responses(
        (status = 200, description = "Leave requests in submission order", body = HistoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_history(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    conversations: web::Data<ConversationStore>,
) -> actix_web::Result<impl Responder> {
    let record = engine.store().lookup(&auth.employee_id)?;
    let report = engine.history_report(&auth.employee_id)?;
    record_exchange(&conversations, &auth, "Show my leave history", report.clone()).await;

    Ok(HttpResponse::Ok().json(HistoryResponse {
        employee_id: record.id,
        records: record.history,
        report,
    }))
}

/* =========================
Policy and holidays
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/policy",
    params(PolicyQuery),
    responses(
        (status = 200, description = "Policy text", body = PolicyResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_policy(
    _auth: AuthUser,
    policies: web::Data<PolicyCatalog>,
    query: web::Query<PolicyQuery>,
) -> impl Responder {
    HttpResponse::Ok().json(PolicyResponse {
        policy: policies.policy_text(query.leave_type.as_deref()),
    })
}

#[utoipa::path(
    get,
    path = "/api/leave/holidays",
    responses(
        (status = 200, description = "Company holidays", body = HolidaysResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn holidays(
    auth: AuthUser,
    policies: web::Data<PolicyCatalog>,
    conversations: web::Data<ConversationStore>,
) -> impl Responder {
    let report = policies.upcoming_holidays();
    record_exchange(&conversations, &auth, "Show upcoming holidays", report.clone()).await;
    HttpResponse::Ok().json(HolidaysResponse {
        holidays: policies.holidays(),
        report,
    })
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Request recorded, approved or pending", body = SubmissionOutcome),
        (status = 400, description = "Invalid leave type or dates", body = Object, example = json!({
            "message": "Invalid date format '2025/02/10'. Please use YYYY-MM-DD format."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(skip_all, fields(employee_id = %auth.employee_id))]
pub async fn create_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    conversations: web::Data<ConversationStore>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let result = engine.submit(
        &auth.employee_id,
        &payload.leave_type,
        &payload.start_date,
        &payload.end_date,
        payload.reason.as_deref(),
    );
    let answer = match &result {
        Ok(outcome) => outcome.message.clone(),
        Err(e) => e.to_string(),
    };
    record_exchange(&conversations, &auth, request_text(&payload), answer).await;
    Ok(HttpResponse::Ok().json(result?))
}

/* =========================
Update status
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{request_id}/status",
    params(
        ("request_id" = String, Path, description = "ID of the leave request, e.g. REQ1")
    ),
    request_body = UpdateStatus,
    responses(
        (status = 200, description = "Status changed", body = StatusUpdateOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "No leave request with ID REQ9 found for employee E001."
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(skip_all, fields(employee_id = %auth.employee_id))]
pub async fn update_status(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<String>,
    payload: web::Json<UpdateStatus>,
) -> actix_web::Result<impl Responder> {
    let request_id = path.into_inner();
    let outcome = engine.update_status(&auth.employee_id, &request_id, &payload.status)?;
    Ok(HttpResponse::Ok().json(outcome))
}

/* =========================
Free-text preview
========================= */
#[utoipa::path(
    post,
    path = "/api/leave/extract",
    request_body = ExtractLeave,
    responses(
        (status = 200, description = "What could be read from the text; nothing is submitted", body = ExtractResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn extract_leave(_auth: AuthUser, payload: web::Json<ExtractLeave>) -> impl Responder {
    let request = extractor::extract(&payload.text);
    let hints = extractor::detect_hints(&payload.text, Local::now().date_naive());

    HttpResponse::Ok().json(ExtractResponse {
        missing: request.missing_fields(),
        request,
        hints,
    })
}
