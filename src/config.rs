use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub access_token_ttl: usize,
    pub api_prefix: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_chat_per_min: u32,
    pub rate_protected_per_min: u32,

    // Language model
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub agent_max_steps: usize,

    // Conversation store
    pub conversation_ttl_secs: u64,
    pub conversation_capacity: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let vars = Vars(lookup);

        let agent_max_steps: usize = vars.required("AGENT_MAX_STEPS")?;
        if agent_max_steps == 0 {
            bail!("AGENT_MAX_STEPS must be at least 1");
        }

        Ok(Self {
            server_addr: vars.text("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            jwt_secret: vars.text("JWT_SECRET").context("JWT_SECRET must be set")?,
            access_token_ttl: vars.or_default("ACCESS_TOKEN_TTL", 900)?, // 15 min
            api_prefix: vars.text("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            rate_login_per_min: vars.or_default("RATE_LOGIN_PER_MIN", 60)?,
            rate_chat_per_min: vars.or_default("RATE_CHAT_PER_MIN", 30)?,
            rate_protected_per_min: vars.or_default("RATE_PROTECTED_PER_MIN", 1000)?,

            llm_base_url: vars
                .text("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            llm_api_key: vars.text("LLM_API_KEY").filter(|k| !k.trim().is_empty()),
            llm_model: vars.text("LLM_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            llm_temperature: vars.or_default("LLM_TEMPERATURE", 0.0)?,
            llm_timeout_secs: vars.or_default("LLM_TIMEOUT_SECS", 60)?,
            agent_max_steps,

            conversation_ttl_secs: vars.or_default("CONVERSATION_TTL_SECS", 3600)?,
            conversation_capacity: vars.or_default("CONVERSATION_CAPACITY", 10_000)?,
        })
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn conversation_ttl(&self) -> Duration {
        Duration::from_secs(self.conversation_ttl_secs)
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn text(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self.text(key).with_context(|| format!("{key} must be set"))?;
        parse(key, &raw)
    }

    fn or_default<T>(&self, key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.text(key) {
            Some(raw) => parse(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
