//! BotConfig: BaseConfig + LLM config. Use load() for env-based loading.

use anyhow::Result;
use llm_client::EnvLlmConfig;
use std::time::Duration;
use tgmd::EscapeOptions;

use super::BaseConfig;

/// Full bot config. Call validate() after load() to fail fast before init.
pub struct BotConfig {
    pub base: BaseConfig,
    pub llm: EnvLlmConfig,
}

impl BotConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    pub fn load(token: Option<String>) -> Result<Self> {
        let base = BaseConfig::load(token)?;
        let llm = EnvLlmConfig::from_env()?;
        Ok(Self { base, llm })
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if let Err(e) = reqwest::Url::parse(&self.llm.base_url) {
            anyhow::bail!("OPENROUTER_BASE_URL is not a valid URL ({}): {}", e, self.llm.base_url);
        }
        Ok(())
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn llm(&self) -> &EnvLlmConfig {
        &self.llm
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
    pub fn allowed_ids(&self) -> &[i64] {
        &self.base.allowed_ids
    }
    pub fn context_ttl(&self) -> Duration {
        self.base.context_ttl()
    }
    pub fn context_max_entries(&self) -> usize {
        self.base.context_max_entries
    }
    pub fn escape_options(&self) -> EscapeOptions {
        self.base.escape_options()
    }
}
