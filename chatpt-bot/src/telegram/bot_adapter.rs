//! Wraps teloxide::Bot and implements [`crate::core::Bot`].

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{ChatAction, ChatId, MessageId, ParseMode, ReplyParameters, ThreadId},
    RequestError,
};
use tracing::debug;

use crate::core::{
    parse_message_id, Bot as CoreBot, BotError, Chat, HandlerError, Message, Result, TextMode,
};

/// API errors mean Telegram read the request and refused it; anything else is transport.
pub fn map_request_error(e: RequestError) -> BotError {
    match e {
        RequestError::Api(api) => BotError::Rejected(api.to_string()),
        other => BotError::Transport(other.to_string()),
    }
}

/// Thin wrapper around teloxide::Bot that implements core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_typing(&self, chat: &Chat, thread_id: Option<i32>) -> Result<()> {
        let mut req = self.bot.send_chat_action(ChatId(chat.id), ChatAction::Typing);
        if let Some(thread_id) = thread_id {
            req.message_thread_id = Some(ThreadId(MessageId(thread_id)));
        }
        req.await.map_err(map_request_error)?;
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str, mode: TextMode) -> Result<String> {
        if text.trim().is_empty() {
            return Err(HandlerError::EmptyContent.into());
        }
        let reply_id = parse_message_id(&message.id)?;

        let mut req = self.bot.send_message(ChatId(message.chat.id), text.to_string());
        req.reply_parameters = Some(ReplyParameters::new(MessageId(reply_id)));
        if let Some(thread_id) = message.thread_id {
            req.message_thread_id = Some(ThreadId(MessageId(thread_id)));
        }
        if mode == TextMode::MarkdownV2 {
            req.parse_mode = Some(ParseMode::MarkdownV2);
        }

        let sent = req.await.map_err(map_request_error)?;
        debug!(
            chat_id = message.chat.id,
            sent_id = %sent.id,
            mode = ?mode,
            "reply sent"
        );
        Ok(sent.id.to_string())
    }
}
