use crate::assistant::DialogueController;
use crate::auth::{auth::AuthUser, handlers::greeting};
use crate::model::conversation::Turn;
use crate::utils::conversation_cache::ConversationStore;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    #[schema(example = "I need sick leave from 2025-06-01 to 2025-06-03 because of a checkup")]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    #[schema(example = "Your sick leave from 2025-06-01 to 2025-06-03 has been approved (REQ2).")]
    pub response: String,
    /// User and assistant turns only
    pub history: Vec<Turn>,
}

fn transcript(history: &[Turn]) -> Vec<Turn> {
    history.iter().filter(|t| t.is_visible()).cloned().collect()
}

/* =========================
One dialogue turn
========================= */
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply and the visible transcript", body = ChatResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Chat"
)]
#[instrument(skip_all, fields(employee_id = %auth.employee_id))]
pub async fn chat(
    auth: AuthUser,
    controller: web::Data<DialogueController>,
    conversations: web::Data<ConversationStore>,
    payload: web::Json<ChatRequest>,
) -> actix_web::Result<impl Responder> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Message must not be empty"
        })));
    }

    let _guard = conversations.lock(&auth.employee_id).await;
    let history = conversations
        .start_session(&auth.employee_id, greeting(&auth.name))
        .await;
    let outcome = controller
        .handle_turn(&auth.employee_id, history, message)
        .await?;

    info!(turns = outcome.history.len(), "Chat turn stored");
    let visible = transcript(&outcome.history);
    conversations.save(&auth.employee_id, outcome.history).await;

    Ok(HttpResponse::Ok().json(ChatResponse {
        response: outcome.response,
        history: visible,
    }))
}

#[utoipa::path(
    get,
    path = "/api/chat/history",
    responses(
        (status = 200, description = "Visible transcript of the current session", body = [Turn]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Chat"
)]
pub async fn chat_history(
    auth: AuthUser,
    conversations: web::Data<ConversationStore>,
) -> impl Responder {
    let history = conversations.load(&auth.employee_id).await;
    HttpResponse::Ok().json(transcript(&history))
}

#[utoipa::path(
    delete,
    path = "/api/chat",
    responses(
        (status = 204, description = "Conversation cleared"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Chat"
)]
#[instrument(skip_all, fields(employee_id = %auth.employee_id))]
pub async fn clear_chat(
    auth: AuthUser,
    conversations: web::Data<ConversationStore>,
) -> impl Responder {
    conversations.clear(&auth.employee_id).await;
    info!("Conversation cleared");
    HttpResponse::NoContent().finish()
}
