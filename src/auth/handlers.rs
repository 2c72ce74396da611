use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token, revocation::TokenRevocations},
    config::Config,
    error::LeaveError,
    ledger::LeaveEngine,
    models::{LoginReqDto, LoginResponse},
    utils::conversation_cache::ConversationStore,
};
use actix_web::{HttpResponse, Responder, web};
use tracing::{debug, error, info, instrument};

/// First message of a new session.
pub fn greeting(name: &str) -> String {
    format!("Hello {name}! How can I assist you with leave management today?")
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Employee ID or password missing"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "message": "Invalid employee ID or password."
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(engine, config, conversations, user),
    fields(employee_id = %user.employee_id)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    engine: web::Data<LeaveEngine>,
    config: web::Data<Config>,
    conversations: web::Data<ConversationStore>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    let employee_id = user.employee_id.trim();
    if employee_id.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty employee id or password");
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Employee ID and password are required"
        })));
    }

    let store = engine.store();
    if !store.credentials_valid(employee_id, &user.password) {
        info!("Invalid credentials");
        return Err(LeaveError::Unauthorized("Invalid employee ID or password.".to_string()).into());
    }
    let name = store
        .record_name(employee_id)
        .ok_or_else(|| LeaveError::EmployeeNotFound(employee_id.to_string()))?;

    debug!("Generating access token");
    let (access_token, _) =
        generate_access_token(employee_id, &name, &config.jwt_secret, config.access_token_ttl)
            .map_err(|e| {
                error!(error = %e, "Failed to sign access token");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

    let history = conversations
        .start_session(employee_id, greeting(&name))
        .await;
    let opening = history
        .iter()
        .find(|t| t.is_visible())
        .map(|t| t.content.clone())
        .unwrap_or_else(|| greeting(&name));

    info!("Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        greeting: opening,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Token revoked and conversation cleared"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_logout", skip_all, fields(employee_id = %auth.employee_id))]
pub async fn logout(
    auth: AuthUser,
    revocations: web::Data<TokenRevocations>,
    conversations: web::Data<ConversationStore>,
) -> impl Responder {
    revocations.revoke(&auth.jti).await;
    conversations.clear(&auth.employee_id).await;
    info!("Logged out");
    HttpResponse::NoContent().finish()
}
