use crate::cli::chat::process_message;
use crate::cli::ux::{ReplyRenderer, TurnOutcome};
use anyhow::{Result, bail};
use assist_core::session::ConversationSession;
use std::future::Future;
use std::io::{Write, stdout};

/// Sends one message and prints the reply as it is revealed.
pub async fn execute(session: ConversationSession, message: Vec<String>) -> Result<()> {
    let mut stdout = stdout();
    ask(&session, &message.join(" "), &mut stdout, tokio::signal::ctrl_c()).await?;
    Ok(())
}

async fn ask<F: Future>(
    session: &ConversationSession,
    text: &str,
    out: &mut dyn Write,
    interrupt: F,
) -> Result<TurnOutcome> {
    if text.trim().is_empty() {
        bail!("Nothing to ask, provide a message");
    }

    let mut events = session.events();
    let mut renderer = ReplyRenderer::new(out);
    match process_message(session, &mut events, &mut renderer, text, interrupt).await? {
        Some(outcome) => Ok(outcome),
        None => bail!("Nothing to ask, provide a message"),
    }
}
