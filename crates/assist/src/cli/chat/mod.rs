use anyhow::Result;
use assist_core::session::ConversationSession;
use std::io::stdout;

mod commands;
mod compl;
mod repl;
pub(crate) mod test_utils;

pub use repl::process_message;

/// Executes the chat command, starting an interactive REPL session.
pub async fn execute(session: ConversationSession) -> Result<()> {
    let mut stdout = stdout();
    repl::run(session, &mut stdout).await
}
