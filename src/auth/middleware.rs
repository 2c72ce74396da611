use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::auth::revocation::TokenRevocations;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

fn reject(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    debug!(path = %req.path(), reason = message, "Rejecting unauthenticated request");
    let resp = HttpResponse::Unauthorized().json(json!({"message": message}));
    req.into_response(resp.map_into_boxed_body())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
    let revocations = req
        .app_data::<Data<TokenRevocations>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Token store missing"))?;

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => return Ok(reject(req, "Invalid Authorization header encoding")),
        },
        None => return Ok(reject(req, "Missing Authorization header")),
    };

    let Some(token) = header_value.strip_prefix("Bearer ") else {
        return Ok(reject(req, "Authorization header must start with Bearer"));
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return Ok(reject(req, "Invalid or expired token")),
    };

    if revocations.is_revoked(&claims.jti) {
        return Ok(reject(req, "Token has been revoked"));
    }

    req.extensions_mut().insert(AuthUser {
        employee_id: claims.sub,
        name: claims.name,
        jti: claims.jti,
    });

    next.call(req).await
}
