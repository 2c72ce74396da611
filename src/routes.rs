use crate::{
    api::{chat, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / requests_per_min as u64).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .expect("period and burst size are non-zero");
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let chat_limiter = Arc::new(build_limiter(config.rate_chat_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(from_fn(auth_middleware))
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(web::resource("").route(web::post().to(leave_request::create_leave)))
                    .service(
                        web::resource("/balance").route(web::get().to(leave_request::leave_balance)),
                    )
                    .service(
                        web::resource("/history").route(web::get().to(leave_request::leave_history)),
                    )
                    .service(
                        web::resource("/policy").route(web::get().to(leave_request::leave_policy)),
                    )
                    .service(
                        web::resource("/holidays").route(web::get().to(leave_request::holidays)),
                    )
                    .service(
                        web::resource("/extract").route(web::post().to(leave_request::extract_leave)),
                    )
                    // /leave/{request_id}/status
                    .service(
                        web::resource("/{request_id}/status")
                            .route(web::put().to(leave_request::update_status)),
                    ),
            )
            .service(
                web::scope("/chat")
                    .wrap(chat_limiter)
                    // /chat
                    .service(
                        web::resource("")
                            .route(web::post().to(chat::chat))
                            .route(web::delete().to(chat::clear_chat)),
                    )
                    // /chat/history
                    .service(web::resource("/history").route(web::get().to(chat::chat_history))),
            ),
    );
}
