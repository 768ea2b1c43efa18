//! # ChatPT bot
//!
//! Telegram bot that answers `/chat` and `/chatg` requests (or any message in a private chat, or a
//! reply to the bot) with an LLM completion, rendered to Telegram MarkdownV2 by `tgmd`.
//!
//! - [`core`]: transport-agnostic types, the [`Bot`] and [`Handler`] traits, errors, logging.
//! - [`chain`]: the [`HandlerChain`] every message runs through.
//! - [`handlers`]: logging, allow-list auth and the chat reply.
//! - [`telegram`]: teloxide adapters and the REPL.

pub mod chain;
pub mod cli;
pub mod command;
pub mod config;
pub mod conversation;
pub mod core;
pub mod handlers;
pub mod runner;
pub mod telegram;

pub use chain::HandlerChain;
pub use cli::{load_config, render_command, write_rendered, Cli, Commands};
pub use command::{parse_chat_request, ChatRequest, ModelRoute};
pub use config::{BaseConfig, BotConfig};
pub use conversation::ConversationStore;
pub use crate::core::{
    init_tracing, parse_message_id, Bot, BotError, Chat, Handler, HandlerError, HandlerResponse,
    Message, Result, TextMode, ToCoreMessage, ToCoreUser, User,
};
pub use handlers::{AuthHandler, ChatReplyHandler, LoggingHandler, ModelRoutes};
pub use runner::{build_handler_chain, build_teloxide_bot, run_bot};
pub use telegram::{run_repl, TelegramBotAdapter, TelegramMessageWrapper, TelegramUserWrapper};
