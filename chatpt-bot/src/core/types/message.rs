//! Incoming message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{chat::Chat, user::User};

/// One incoming text message with its sender, chat, forum thread and reply context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    /// Forum topic the message was posted in; replies and chat actions go to the same topic.
    pub thread_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub reply_to_message_id: Option<String>,
    /// Whether the replied-to message was sent by the bot; only meaningful when `reply_to_message_id` is set.
    pub reply_to_message_from_bot: bool,
    /// Text of the replied-to message; seeds the conversation when the bot has no history for it.
    pub reply_to_message_content: Option<String>,
}

impl Message {
    /// True when this message replies to one of the bot's messages.
    pub fn is_reply_to_bot(&self) -> bool {
        self.reply_to_message_id.is_some() && self.reply_to_message_from_bot
    }
}
