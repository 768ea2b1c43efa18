//! CLI parser and the offline `render` command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::PathBuf;
use tgmd::EscapeOptions;

use crate::config::BotConfig;

/// Printed between rendered messages by `chatpt render`.
pub const MESSAGE_DIVIDER: &str = "----- 8< -----";

#[derive(Parser)]
#[command(name = "chatpt")]
#[command(about = "ChatPT Telegram bot", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Print the MarkdownV2 messages a Markdown reply would be sent as.
    Render {
        /// Markdown file; stdin when omitted.
        file: Option<PathBuf>,
        /// Keep double backslashes verbatim.
        #[arg(long)]
        disable_math_escape: bool,
        /// Escape underscores instead of rendering `_text_` as italic.
        #[arg(long)]
        no_italic: bool,
    },
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}

/// Reads Markdown from `file` (or stdin) and writes the rendered messages to `out`.
pub fn render_command(file: Option<PathBuf>, options: &EscapeOptions, out: &mut impl Write) -> Result<()> {
    let input = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    write_rendered(&input, options, out)
}

/// Writes the rendered messages of `input`, separated by [`MESSAGE_DIVIDER`] lines.
pub fn write_rendered(input: &str, options: &EscapeOptions, out: &mut impl Write) -> Result<()> {
    for (i, message) in tgmd::render(input, options).iter().enumerate() {
        if i > 0 {
            writeln!(out, "{}", MESSAGE_DIVIDER)?;
        }
        writeln!(out, "{}", message)?;
    }
    Ok(())
}
