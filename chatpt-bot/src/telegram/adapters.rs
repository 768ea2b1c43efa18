//! Adapters from teloxide types to core types.

use crate::core::{Chat, HandlerError, Message, Result, ToCoreMessage, ToCoreUser, User};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl ToCoreUser for TelegramUserWrapper<'_> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl ToCoreMessage for TelegramMessageWrapper<'_> {
    fn to_core(&self) -> Result<Message> {
        let content = self.0.text().ok_or(HandlerError::NoText)?;
        Ok(Message {
            id: self.0.id.to_string(),
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or(User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: self.0.chat.id.0,
                chat_type: self.chat_type().to_string(),
            },
            content: content.to_string(),
            thread_id: self.0.thread_id.map(|t| t.0 .0),
            created_at: self.0.date,
            reply_to_message_id: self.0.reply_to_message().map(|m| m.id.to_string()),
            reply_to_message_from_bot: self.reply_to_message_from_bot(),
            reply_to_message_content: self
                .0
                .reply_to_message()
                .and_then(|m| m.text())
                .map(str::to_string),
        })
    }
}

impl TelegramMessageWrapper<'_> {
    fn chat_type(&self) -> &'static str {
        let chat = &self.0.chat;
        if chat.is_private() {
            Chat::PRIVATE
        } else if chat.is_supergroup() {
            "supergroup"
        } else if chat.is_group() {
            "group"
        } else {
            "channel"
        }
    }

    /// True if the replied-to message was sent by a bot.
    fn reply_to_message_from_bot(&self) -> bool {
        self.0
            .reply_to_message()
            .and_then(|m| m.from.as_ref())
            .map(|u| u.is_bot)
            .unwrap_or(false)
    }
}
