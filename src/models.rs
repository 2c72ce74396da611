use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "E001")]
    pub employee_id: String,
    #[schema(example = "pass123")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Hello Alice Smith! How can I assist you with leave management today?")]
    pub greeting: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// employee id
    pub sub: String,
    pub name: String,
    pub exp: usize,
    pub jti: String,
}
