//! Bot configuration: BaseConfig (Telegram, log, access, context, rendering) + LLM config.

mod base;
mod bot_config;


pub use base::BaseConfig;
pub use bot_config::BotConfig;
