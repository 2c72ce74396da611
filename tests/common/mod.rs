#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Data;
use leave_assistant::assistant::mock::MockLlm;
use leave_assistant::assistant::{DialogueController, ToolCatalog};
use leave_assistant::auth::revocation::TokenRevocations;
use leave_assistant::config::Config;
use leave_assistant::ledger::{LeaveEngine, LedgerStore, seed};
use leave_assistant::policy::PolicyCatalog;
use leave_assistant::utils::conversation_cache::ConversationStore;

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        jwt_secret: "test-secret".into(),
        access_token_ttl: 900,
        api_prefix: "/api".into(),
        rate_login_per_min: 1000,
        rate_chat_per_min: 1000,
        rate_protected_per_min: 1000,
        llm_base_url: "http://localhost:1".into(),
        llm_api_key: None,
        llm_model: "test-model".into(),
        llm_temperature: 0.0,
        llm_timeout_secs: 5,
        agent_max_steps: 4,
        conversation_ttl_secs: 3600,
        conversation_capacity: 100,
    }
}

pub fn peer() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

/// Everything the app needs, built fresh per test.
#[derive(Clone)]
pub struct TestState {
    pub config: Data<Config>,
    pub engine: Data<LeaveEngine>,
    pub policies: Data<PolicyCatalog>,
    pub controller: Data<DialogueController>,
    pub conversations: Data<ConversationStore>,
    pub revocations: Data<TokenRevocations>,
}

impl TestState {
    pub fn new(llm: Arc<MockLlm>) -> Self {
        let config = test_config();
        let engine = LeaveEngine::new(Arc::new(LedgerStore::new(seed::demo_employees())));
        let controller = DialogueController::new(
            llm,
            ToolCatalog::default(),
            engine.clone(),
            PolicyCatalog,
            config.agent_max_steps,
            config.llm_timeout(),
        );
        Self {
            conversations: Data::new(ConversationStore::new(100, config.conversation_ttl())),
            revocations: Data::new(TokenRevocations::new(Duration::from_secs(900))),
            controller: Data::new(controller),
            policies: Data::new(PolicyCatalog),
            engine: Data::new(engine),
            config: Data::new(config),
        }
    }
}

/// Builds the service the way `main` does, minus logging and Swagger.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {{
        let state = $state.clone();
        let config = state.config.get_ref().clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .wrap(actix_web::middleware::NormalizePath::trim())
                .app_data(state.config.clone())
                .app_data(state.engine.clone())
                .app_data(state.policies.clone())
                .app_data(state.controller.clone())
                .app_data(state.conversations.clone())
                .app_data(state.revocations.clone())
                .configure(move |cfg| leave_assistant::routes::configure(cfg, config)),
        )
        .await
    }};
}

/// Logs in through `/auth/login` and returns the JSON body.
#[macro_export]
macro_rules! login {
    ($app:expr, $employee_id:expr, $password:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/auth/login")
            .peer_addr($crate::common::peer())
            .set_json(serde_json::json!({"employee_id": $employee_id, "password": $password}))
            .to_request();
        let body: serde_json::Value = actix_web::test::call_and_read_body_json($app, req).await;
        body
    }};
}
