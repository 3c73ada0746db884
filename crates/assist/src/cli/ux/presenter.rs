use assist_core::mode::Mode;
use console::{Style, StyledObject};
use std::time::Duration;

/// Represents the type of a chat message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    /// Secondary prompt text around the highlighted values.
    PromptMeta,
    /// Footer information, like timing or status.
    Footer,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().blue().bold(),
        ChatMessageType::PromptMeta => Style::new().blue(),
        ChatMessageType::Footer => Style::new().white().dim(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// How a turn ended, as far as the terminal is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed { fallback: bool },
    Cancelled,
}

/// Formats the footer printed after a reply.
pub fn format_footer(outcome: TurnOutcome, mode: Mode, elapsed: Duration) -> String {
    let footer = match outcome {
        TurnOutcome::Cancelled => return "◼ Cancelled.".to_string(),
        TurnOutcome::Completed { fallback: true } => "◼ Completed (fallback reply).".to_string(),
        TurnOutcome::Completed { fallback: false } => "◼ Completed.".to_string(),
    };

    let details = format!("{}. {:.2}s total", mode.label(), elapsed.as_secs_f32());
    style_chat_text(&format!("{footer} {details}"), ChatMessageType::Footer).to_string()
}

/// One line per mode, marking the active one.
pub fn format_mode_list(current: Mode) -> String {
    Mode::ALL
        .iter()
        .map(|mode| {
            let marker = if *mode == current { "*" } else { " " };
            format!("{marker} {:<11} {}", mode.as_str(), mode.label())
        })
        .collect::<Vec<_>>()
        .join("\n")
}
