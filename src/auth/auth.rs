use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::error::LeaveError;

/// The employee behind the bearer token, placed in the request extensions
/// by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee_id: String,
    pub name: String,
    /// token id, needed to revoke it on logout
    pub jti: String,
}

impl FromRequest for AuthUser {
    type Error = LeaveError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| LeaveError::Unauthorized("Not authenticated".to_string())),
        )
    }
}
