//! LLM configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

/// System prompt used when `LLM_SYSTEM_PROMPT` is not set.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Eres ChatPT, un asistente útil que puede responder preguntas y ayudar con tareas. Mantén las respuestas concisas y directas al punto. Responde siempre en español.";

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:nitro";
const DEFAULT_SEARCH_MODEL: &str = "google/gemini-2.0-flash-001";
/// OpenRouter model suffix that enables the web-search plugin.
const ONLINE_SUFFIX: &str = ":online";

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    /// Model for ordinary chat requests.
    fn model(&self) -> &str;
    /// Model for web-search requests, already carrying the `:online` suffix.
    fn search_model(&self) -> &str;
    fn system_prompt(&self) -> &str;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub search_model: String,
    pub system_prompt: String,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> &str {
        &self.base_url
    }
    fn model(&self) -> &str {
        &self.model
    }
    fn search_model(&self) -> &str {
        &self.search_model
    }
    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("OPENROUTER_API_KEY not set")?;
        let base_url = non_empty_var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = non_empty_var("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let search_model = online_model(
            &non_empty_var("LLM_SEARCH_MODEL").unwrap_or_else(|| DEFAULT_SEARCH_MODEL.to_string()),
        );
        let system_prompt = non_empty_var("LLM_SYSTEM_PROMPT")
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());
        Ok(Self {
            api_key,
            base_url,
            model,
            search_model,
            system_prompt,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

/// Appends the `:online` suffix unless the model id already has it.
fn online_model(model: &str) -> String {
    if model.ends_with(ONLINE_SUFFIX) {
        model.to_string()
    } else {
        format!("{model}{ONLINE_SUFFIX}")
    }
}
