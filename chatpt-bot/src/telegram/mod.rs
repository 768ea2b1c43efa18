//! Telegram layer: teloxide adapters, the [`crate::core::Bot`] implementation, and the REPL runner.

mod adapters;
mod bot_adapter;
mod runner;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::{map_request_error, TelegramBotAdapter};
pub use runner::run_repl;
