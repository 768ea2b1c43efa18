//! `chatpt` binary: run the bot, or render Markdown offline.

use anyhow::Result;
use chatpt_bot::{load_config, render_command, run_bot, Cli, Commands};
use clap::Parser;
use tgmd::EscapeOptions;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            run_bot(config).await
        }
        Commands::Render {
            file,
            disable_math_escape,
            no_italic,
        } => {
            let options = EscapeOptions {
                disable_math_escape,
                italic_underline: !no_italic,
            };
            render_command(file, &options, &mut std::io::stdout().lock())
        }
    }
}
