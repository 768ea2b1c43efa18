//! Handlers for logging and the user allow-list.

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::core::{Handler, HandlerError, HandlerResponse, Message, Result};

/// Logs each message in before() and the final response in after(); always continues.
pub struct LoggingHandler;

#[async_trait]
impl Handler for LoggingHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        info!(
            user_id = message.user.id,
            chat_id = message.chat.id,
            chat_type = %message.chat.chat_type,
            username = %message.user.username.as_deref().unwrap_or("unknown"),
            message_content = %message.content,
            "Received message"
        );
        Ok(true)
    }

    #[instrument(skip(self, message, response))]
    async fn after(&self, message: &Message, response: &HandlerResponse) -> Result<()> {
        let (response_type, reply_len) = match response {
            HandlerResponse::Continue => ("Continue", None),
            HandlerResponse::Stop => ("Stop", None),
            HandlerResponse::Ignore => ("Ignore", None),
            HandlerResponse::Reply(text) => ("Reply", Some(text.chars().count())),
        };
        debug!(
            message_id = %message.id,
            response_type = %response_type,
            reply_len = ?reply_len,
            "Processed message"
        );
        Ok(())
    }
}

/// Fails the chain with [`HandlerError::Unauthorized`] unless the sender is on the allow-list.
/// Nothing is sent to unauthorized users.
pub struct AuthHandler {
    allowed_users: Vec<i64>,
}

impl AuthHandler {
    /// Creates a handler that allows only the given user ids.
    pub fn new(allowed_users: Vec<i64>) -> Self {
        Self { allowed_users }
    }
}

#[async_trait]
impl Handler for AuthHandler {
    #[instrument(skip(self, message))]
    async fn before(&self, message: &Message) -> Result<bool> {
        let user_id = message.user.id;
        if self.allowed_users.contains(&user_id) {
            debug!(user_id = user_id, "User authorized");
            Ok(true)
        } else {
            warn!(user_id = user_id, chat_id = message.chat.id, "Unauthorized user");
            Err(HandlerError::Unauthorized.into())
        }
    }
}
