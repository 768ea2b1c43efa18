//! REPL runner: converts teloxide messages to core messages and passes them to the HandlerChain.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use super::adapters::TelegramMessageWrapper;
use crate::chain::HandlerChain;
use crate::core::{BotError, HandlerError, ToCoreMessage};

/// Starts the REPL. Calls get_me() first to fill `bot_username`; each text message runs through the
/// chain in its own task.
#[instrument(skip(bot, handler_chain, bot_username))]
pub async fn run_repl(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    bot_username: Arc<RwLock<Option<String>>>,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => {
            if let Some(username) = &me.user.username {
                *bot_username.write().await = Some(username.clone());
                info!(username = %username, "Bot username set");
            }
        }
        Err(e) => error!(error = %e, "get_me failed; addressed commands will be ignored"),
    }

    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let chain = handler_chain.clone();
        async move {
            let core_msg = match TelegramMessageWrapper(&msg).to_core() {
                Ok(m) => m,
                Err(BotError::Handler(HandlerError::NoText)) => {
                    debug!(chat_id = msg.chat.id.0, "Skipping non-text message");
                    return Ok(());
                }
                Err(e) => {
                    error!(error = %e, "Failed to convert message");
                    return Ok(());
                }
            };

            tokio::spawn(async move {
                if let Err(e) = chain.handle(&core_msg).await {
                    error!(
                        error = %e,
                        user_id = core_msg.user.id,
                        chat_id = core_msg.chat.id,
                        "Handler chain failed"
                    );
                }
            });

            Ok(())
        }
    })
    .await;

    Ok(())
}
