//! Application wiring: builds the handler chain and runs the Telegram REPL.

use anyhow::Result;
use llm_client::{LlmClient, OpenAILlmClient};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::chain::HandlerChain;
use crate::config::BotConfig;
use crate::conversation::ConversationStore;
use crate::core::{init_tracing, Bot};
use crate::handlers::{AuthHandler, ChatReplyHandler, LoggingHandler, ModelRoutes};
use crate::telegram::{run_repl, TelegramBotAdapter};

/// Logging → allow-list → chat reply, with a fresh conversation store sized from `config`.
pub fn build_handler_chain(
    config: &BotConfig,
    bot: Arc<dyn Bot>,
    llm_client: Arc<dyn LlmClient>,
    bot_username: Arc<RwLock<Option<String>>>,
) -> HandlerChain {
    let conversations = Arc::new(ConversationStore::new(
        config.context_ttl(),
        config.context_max_entries(),
    ));
    let chat_reply = ChatReplyHandler::new(
        bot,
        llm_client,
        conversations,
        bot_username,
        ModelRoutes::from_config(config.llm()),
        config.escape_options(),
    );

    HandlerChain::new()
        .add_handler(Arc::new(LoggingHandler))
        .add_handler(Arc::new(AuthHandler::new(config.allowed_ids().to_vec())))
        .add_handler(Arc::new(chat_reply))
}

/// Creates the teloxide bot, honouring a custom Bot API server URL.
pub fn build_teloxide_bot(config: &BotConfig) -> Result<teloxide::Bot> {
    let bot = teloxide::Bot::new(config.bot_token());
    match config.telegram_api_url() {
        Some(url) => Ok(bot.set_api_url(reqwest::Url::parse(url)?)),
        None => Ok(bot),
    }
}

/// Main entry: validate config, init logging, wire the chain, run the REPL until shutdown.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file())?;

    if config.allowed_ids().is_empty() {
        warn!("ALLOWED_IDS is empty; every message will be rejected");
    }
    info!(
        model = %config.llm().model,
        search_model = %config.llm().search_model,
        base_url = %config.llm().base_url,
        allowed_users = config.allowed_ids().len(),
        "Initializing bot"
    );

    let teloxide_bot = build_teloxide_bot(&config)?;
    let bot: Arc<dyn Bot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    let llm_client: Arc<dyn LlmClient> = Arc::new(OpenAILlmClient::from_config(config.llm()));
    let bot_username = Arc::new(RwLock::new(None));
    let handler_chain = build_handler_chain(&config, bot, llm_client, bot_username.clone());

    info!("Bot started");
    run_repl(teloxide_bot, handler_chain, bot_username).await
}
