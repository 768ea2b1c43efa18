//! Handlers that make up the bot's chain: logging, allow-list auth, and the LLM chat reply.

mod chat_reply;
mod logging_auth;

pub use chat_reply::{
    ChatReplyHandler, ModelRoutes, MSG_EMPTY_QUERY, MSG_EMPTY_RESPONSE, MSG_REQUEST_FAILED,
};
pub use logging_auth::{AuthHandler, LoggingHandler};
