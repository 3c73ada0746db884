use crate::cli::chat::commands::{CliCommand, command_names, parse_command_line};
use crate::cli::chat::compl::Repl;
use crate::cli::ux::{
    ChatMessageType, GenerationSpinner, ReplyRenderer, TurnOutcome, format_footer,
    style_chat_text,
};
use anyhow::Result;
use assist_core::session::{ConversationSession, SessionEvent};
use clap::Parser;
use futures::StreamExt;
use futures::stream::BoxStream;
use rustyline::error::ReadlineError;
use rustyline::{CompletionType, Editor};
use std::future::Future;
use std::io::Write;
use std::time::Instant;
use tracing::debug;

pub async fn run(session: ConversationSession, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Welcome to assist chat! Type '/help' for commands, '/q' to exit.")?;

    let config = rustyline::Config::builder()
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(Repl {
        command_names: command_names(),
    }));

    // Subscribe once so no event is missed between turns
    let mut events = session.events();

    loop {
        let prompt = format!(
            "\n{}\n{}",
            style_chat_text(
                &format!("[mode: {}]", session.mode().label()),
                ChatMessageType::PromptMeta
            ),
            style_chat_text("> ", ChatMessageType::Prompt)
        );
        match rl.readline(&prompt) {
            Ok(line) => {
                rl.add_history_entry(&line)?;
                let trimmed_line = line.trim();

                if trimmed_line.is_empty() {
                    continue;
                }

                if trimmed_line.starts_with('/') {
                    match CliCommand::try_parse_from(parse_command_line(trimmed_line)) {
                        Ok(cli_command) => {
                            if !cli_command.command.execute(&session, out)? {
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            e.print()?;
                        }
                    }
                } else {
                    let mut renderer = ReplyRenderer::new(out);
                    process_message(
                        &session,
                        &mut events,
                        &mut renderer,
                        &line,
                        tokio::signal::ctrl_c(),
                    )
                    .await?;
                }
            }
            Err(ReadlineError::Interrupted) => {
                writeln!(out, "Type /quit to exit.")?;
                continue;
            }
            Err(ReadlineError::Eof) => {
                writeln!(out, "\nBye!")?;
                session.reset();
                return Ok(());
            }
            Err(err) => {
                return Err(err.into());
            }
        }
    }
}

/// Submits `text` and renders the reply as it is revealed, until it completes or `interrupt`
/// resolves.
///
/// `events` must be subscribed before the call. Events from earlier turns are skipped.
pub async fn process_message<F>(
    session: &ConversationSession,
    events: &mut BoxStream<'static, SessionEvent>,
    renderer: &mut ReplyRenderer<'_>,
    text: &str,
    interrupt: F,
) -> Result<Option<TurnOutcome>>
where
    F: Future,
{
    let Some(turn) = session.submit(text) else {
        return Ok(None);
    };
    let generation = turn.generation();
    let started = Instant::now();

    renderer.clear();
    let spinner = GenerationSpinner::thinking(session.mode());
    let mut reply_id = None;
    let mut interrupt = std::pin::pin!(interrupt);

    let outcome = loop {
        tokio::select! {
            _ = &mut interrupt => {
                session.cancel();
                break TurnOutcome::Cancelled;
            },

            next = events.next() => {
                let Some(event) = next else {
                    break TurnOutcome::Cancelled;
                };
                match event {
                    SessionEvent::ReplyStarted { generation: g, id } if g == generation => {
                        spinner.clear();
                        reply_id = Some(id);
                    }
                    SessionEvent::Revealed { generation: g, text, .. } if g == generation => {
                        renderer.render_reveal(&text)?;
                    }
                    SessionEvent::Completed { generation: g, text, fallback, .. }
                        if g == generation =>
                    {
                        renderer.render_reveal(&text)?;
                        break TurnOutcome::Completed { fallback };
                    }
                    SessionEvent::Frozen { id, .. } if Some(id) == reply_id => {
                        break TurnOutcome::Cancelled;
                    }
                    SessionEvent::Discarded { generation: g } if g == generation => {
                        break TurnOutcome::Cancelled;
                    }
                    SessionEvent::Reset => break TurnOutcome::Cancelled,
                    other => debug!(?other, "Skipping event"),
                }
            }
        }
    };

    spinner.clear();
    renderer.render_line(&format_footer(outcome, session.mode(), started.elapsed()))?;
    Ok(Some(outcome))
}
