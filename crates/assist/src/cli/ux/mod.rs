mod presenter;
mod progress;
mod render;

pub use presenter::{ChatMessageType, TurnOutcome, format_footer, format_mode_list, style_chat_text};
pub use progress::GenerationSpinner;
pub use render::ReplyRenderer;

use console::style;

/// Prints a formatted error message to stderr.
pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error:#}");
}
