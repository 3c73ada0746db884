use crate::cli::ux::{ChatMessageType, format_mode_list, style_chat_text};
use anyhow::Result;
use assist_core::message::{Message, Sender};
use assist_core::session::ConversationSession;
use clap::{CommandFactory, Parser, Subcommand};
use std::io::Write;

// -------------
// REPL commands
// -------------
#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct CliCommand {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Show or switch the chat mode.
    ///
    /// Accepts a mode tag (e.g. "study") or its label (e.g. "Task Helper").
    #[command(alias = "m")]
    Mode {
        /// Mode to switch to
        name: Vec<String>,
    },
    /// List available chat modes
    Modes,
    /// Show the conversation so far
    #[command(alias = "hist")]
    History,
    /// Clear chat history
    Clear,
    /// Exit the chat session
    #[command(alias = "q", alias = "quit")]
    Exit,
}

impl Command {
    /// Executes a REPL command.
    ///
    /// Returns `Ok(false)` if the REPL should exit.
    pub fn execute(self, session: &ConversationSession, out: &mut dyn Write) -> Result<bool> {
        match self {
            Command::Mode { name } if name.is_empty() => {
                let mode = session.mode();
                writeln!(out, "Current mode: {} ({})", mode.label(), mode.as_str())?;
            }
            Command::Mode { name } => match session.select_mode(&name.join(" ")) {
                Ok(mode) => writeln!(out, "Mode set to {}.", mode.label())?,
                Err(e) => writeln!(
                    out,
                    "{}",
                    style_chat_text(&format!("{e}. Try /modes."), ChatMessageType::Error)
                )?,
            },
            Command::Modes => {
                writeln!(out, "{}", format_mode_list(session.mode()))?;
            }
            Command::History => {
                writeln!(out, "{}", format_history(&session.messages()))?;
            }
            Command::Clear => {
                session.reset();
                writeln!(out, "Chat history cleared")?;
            }
            Command::Exit => {
                session.reset();
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Slash-prefixed names and visible aliases of every REPL command, including `/help`.
pub fn command_names() -> Vec<String> {
    let mut command = CliCommand::command();
    // Adds the generated help subcommand
    command.build();
    command
        .get_subcommands()
        .flat_map(|c| c.get_name_and_visible_aliases())
        .map(|s| format!("/{s}"))
        .collect()
}

/// Splits a REPL command line into arguments.
pub fn parse_command_line(line: &str) -> Vec<String> {
    shlex::split(line).unwrap_or_default()
}

/// Formats the conversation as one block per message.
pub fn format_history(messages: &[Message]) -> String {
    if messages.is_empty() {
        return style_chat_text("No messages yet.", ChatMessageType::Footer).to_string();
    }

    messages
        .iter()
        .map(|msg| {
            let who = match msg.sender {
                Sender::User => "you",
                Sender::Assistant => "assist",
            };
            let header = format!("[{}] {who}", msg.created_at.format("%H:%M:%S"));
            format!(
                "{}\n{}",
                style_chat_text(&header, ChatMessageType::PromptMeta),
                msg.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
