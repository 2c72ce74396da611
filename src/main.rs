use std::sync::Arc;
use std::time::Duration;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

use leave_assistant::assistant::openai::OpenAiClient;
use leave_assistant::assistant::{DialogueController, LlmClient, ToolCatalog};
use leave_assistant::auth::revocation::TokenRevocations;
use leave_assistant::config::Config;
use leave_assistant::docs::ApiDoc;
use leave_assistant::ledger::{LeaveEngine, LedgerStore, seed};
use leave_assistant::policy::PolicyCatalog;
use leave_assistant::routes;
use leave_assistant::utils::conversation_cache::ConversationStore;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Leave assistant is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = Arc::new(LedgerStore::new(seed::demo_employees()));
    let engine = LeaveEngine::new(store);
    let policies = PolicyCatalog;

    if config.llm_api_key.is_none() {
        warn!(base_url = %config.llm_base_url, "LLM_API_KEY not set, calling the model without credentials");
    }
    let llm: Arc<dyn LlmClient> =
        Arc::new(OpenAiClient::from_config(&config).context("building model client")?);
    let controller = Data::new(DialogueController::new(
        llm,
        ToolCatalog::default(),
        engine.clone(),
        policies,
        config.agent_max_steps,
        config.llm_timeout(),
    ));

    let conversations = Data::new(ConversationStore::new(
        config.conversation_capacity,
        config.conversation_ttl(),
    ));
    let revocations = Data::new(TokenRevocations::new(Duration::from_secs(
        config.access_token_ttl as u64,
    )));
    let engine = Data::new(engine);
    let policies = Data::new(policies);

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    info!(addr = %server_addr, max_steps = config.agent_max_steps, model = %config.llm_model, "Binding HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(engine.clone())
            .app_data(policies.clone())
            .app_data(controller.clone())
            .app_data(conversations.clone())
            .app_data(revocations.clone())
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await
    .context("HTTP server failed")
}
