//! Base config: Telegram connection, logging, access list, reply context and rendering flags. Loaded from env.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;
use tgmd::EscapeOptions;

use crate::conversation::{DEFAULT_CONTEXT_MAX_ENTRIES, DEFAULT_CONTEXT_TTL_SECS};

/// Everything except the LLM settings.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// ALLOWED_IDS, comma-separated user ids
    pub allowed_ids: Vec<i64>,
    /// CONTEXT_TTL_SECS
    pub context_ttl_secs: u64,
    /// CONTEXT_MAX_ENTRIES
    pub context_max_entries: usize,
    /// TGMD_DISABLE_MATH_ESCAPE
    pub disable_math_escape: bool,
    /// TGMD_ITALIC_UNDERLINE
    pub italic_underline: bool,
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/chatpt.log".to_string());
        let allowed_ids = parse_allowed_ids(&env::var("ALLOWED_IDS").unwrap_or_default())?;
        let context_ttl_secs = parse_var("CONTEXT_TTL_SECS")?.unwrap_or(DEFAULT_CONTEXT_TTL_SECS);
        let context_max_entries =
            parse_var("CONTEXT_MAX_ENTRIES")?.unwrap_or(DEFAULT_CONTEXT_MAX_ENTRIES);
        let disable_math_escape = parse_bool_var("TGMD_DISABLE_MATH_ESCAPE")?.unwrap_or(false);
        let italic_underline = parse_bool_var("TGMD_ITALIC_UNDERLINE")?.unwrap_or(true);

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            allowed_ids,
            context_ttl_secs,
            context_max_entries,
            disable_math_escape,
            italic_underline,
        })
    }

    /// Validate config (e.g. telegram_api_url must be valid URL if set).
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if self.context_max_entries == 0 {
            anyhow::bail!("CONTEXT_MAX_ENTRIES must be at least 1");
        }
        Ok(())
    }

    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }

    pub fn escape_options(&self) -> EscapeOptions {
        EscapeOptions {
            disable_math_escape: self.disable_math_escape,
            italic_underline: self.italic_underline,
        }
    }
}

/// Parses `ALLOWED_IDS`: comma-separated integers, blanks ignored.
pub(crate) fn parse_allowed_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("ALLOWED_IDS contains a non-numeric id: {}", s))
        })
        .collect()
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid number: {}", key, v)),
        _ => Ok(None),
    }
}

fn parse_bool_var(key: &str) -> Result<Option<bool>> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => anyhow::bail!("{} is not a boolean: {}", key, v),
        },
        _ => Ok(None),
    }
}
