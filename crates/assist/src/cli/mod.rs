//! Assist app cli definition and entrypoint.
mod ask;
mod chat;
pub mod ux;

use anyhow::{Context, Result};
use assist_core::config::{Config, get_config};
use assist_core::session::ConversationSession;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::log::setup_logging;
use ux::format_mode_list;

/// Assist - a terminal client for the Univ-Assist chat assistant.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show verbose logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the default one.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the assistant.
    Chat {
        /// Mode to start in, e.g. "study" or "tasks".
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Ask a single question and print the reply.
    Ask {
        /// Message to send.
        message: Vec<String>,
        /// Mode to use for the message.
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// List the available chat modes.
    Modes,
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    // Load configuration
    let config = get_config(cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Chat { mode } => {
            let session = build_session(&config, mode.as_deref())?;
            chat::execute(session).await
        }
        Commands::Ask { message, mode } => {
            let session = build_session(&config, mode.as_deref())?;
            ask::execute(session, message).await
        }
        Commands::Modes => {
            println!("{}", format_mode_list(config.mode));
            Ok(())
        }
    }
}

/// Creates a session for `config`, optionally overriding the configured mode.
fn build_session(config: &Config, mode: Option<&str>) -> Result<ConversationSession> {
    let session =
        ConversationSession::from_config(config).context("Failed to create chat session")?;
    if let Some(mode) = mode {
        session.select_mode(mode)?;
    }
    Ok(session)
}
