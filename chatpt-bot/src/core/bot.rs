//! Bot abstraction for outgoing actions.
//!
//! [`Bot`] is transport-agnostic; [`crate::telegram::TelegramBotAdapter`] implements it via teloxide.

use async_trait::async_trait;

use crate::core::error::{BotError, Result};
use crate::core::types::{Chat, Message};

/// How the text of an outgoing message is parsed by Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Plain,
    MarkdownV2,
}

/// Outgoing actions the handlers need.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Shows the typing indicator in `chat` (and forum thread, if any).
    async fn send_typing(&self, chat: &Chat, thread_id: Option<i32>) -> Result<()>;
    /// Sends `text` as a reply to `message` and returns the sent message id.
    /// An API rejection (e.g. unparsable MarkdownV2) is [`BotError::Rejected`].
    async fn reply_to(&self, message: &Message, text: &str, mode: TextMode) -> Result<String>;
}

/// Parses a message id string into the numeric id Telegram expects.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse()
        .map_err(|_| BotError::Transport(format!("Invalid message_id: {}", s)))
}
