use std::time::Duration;

use moka::future::Cache;

/// Token ids revoked by logout. An entry only has to outlive the token it
/// names, so entries expire after the access-token lifetime.
#[derive(Clone)]
pub struct TokenRevocations {
    revoked: Cache<String, ()>,
}

impl TokenRevocations {
    pub fn new(token_ttl: Duration) -> Self {
        Self {
            revoked: Cache::builder()
                .max_capacity(100_000)
                .time_to_live(token_ttl)
                .build(),
        }
    }

    pub async fn revoke(&self, jti: &str) {
        self.revoked.insert(jti.to_string(), ()).await;
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }
}
