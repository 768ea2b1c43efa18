//! Error types for the bot core.
//!
//! [`BotError`] is the top-level error; [`HandlerError`] is used for handler failures.

use thiserror::Error;

/// Top-level error (transport, rejected request, handler, config, LLM, IO).
#[derive(Error, Debug)]
pub enum BotError {
    /// The request never got a usable answer from Telegram (network, timeout, bad JSON).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Telegram answered with an API error, e.g. a MarkdownV2 entity it cannot parse.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced by handlers (no text, auth, empty content).
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("No text in message")]
    NoText,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Empty content")]
    EmptyContent,
}

/// Result type for core operations; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;
