//! Deciding whether a message is a chat request, which model route it takes, and what the query is.

use crate::core::Message;

/// Command that asks the default model.
pub const CHAT_COMMAND: &str = "/chat";
/// Command that asks the web-search model.
pub const CHAT_SEARCH_COMMAND: &str = "/chatg";

/// Which model a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRoute {
    Default,
    WebSearch,
}

/// A message the bot should answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub route: ModelRoute,
    /// Message text without the command token, trimmed. May be empty.
    pub query: String,
}

/// Returns the chat request carried by `message`, or `None` when the bot should stay silent.
///
/// A message is a request when its first token is `/chat` or `/chatg` (optionally addressed as
/// `/chat@<bot_username>`), when the chat is private, or when it replies to the bot.
/// A command addressed to another bot is not a request unless one of the other conditions holds.
pub fn parse_chat_request(message: &Message, bot_username: Option<&str>) -> Option<ChatRequest> {
    let text = message.content.trim();

    if let Some((route, rest)) = split_command(text, bot_username) {
        return Some(ChatRequest {
            route,
            query: rest.trim().to_string(),
        });
    }

    if message.chat.is_private() || message.is_reply_to_bot() {
        return Some(ChatRequest {
            route: ModelRoute::Default,
            query: text.to_string(),
        });
    }

    None
}

/// Splits a leading `/chat` or `/chatg` token off `text`.
fn split_command<'a>(text: &'a str, bot_username: Option<&str>) -> Option<(ModelRoute, &'a str)> {
    let token_end = text.find(char::is_whitespace).unwrap_or(text.len());
    let (token, rest) = text.split_at(token_end);

    let (command, addressee) = match token.split_once('@') {
        Some((command, addressee)) => (command, Some(addressee)),
        None => (token, None),
    };

    let route = match command {
        CHAT_COMMAND => ModelRoute::Default,
        CHAT_SEARCH_COMMAND => ModelRoute::WebSearch,
        _ => return None,
    };

    if let Some(addressee) = addressee {
        match bot_username {
            Some(username) if addressee.eq_ignore_ascii_case(username) => {}
            _ => return None,
        }
    }

    Some((route, rest))
}
