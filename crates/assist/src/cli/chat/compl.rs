use crate::cli::chat::commands::{CliCommand, Command, parse_command_line};
use crate::cli::ux::{ChatMessageType, style_chat_text};
use assist_core::mode::Mode;
use clap::Parser;
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{Helper, Highlighter, Validator};

/// Completion candidate for the REPL.
#[derive(Debug)]
pub struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    pub fn new(text: &str) -> Self {
        let display_string = style_chat_text(text, ChatMessageType::Footer).to_string();
        Self {
            text: text.to_owned(),
            display_string,
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

/// REPL runtime state for command line editing.
#[derive(Helper, Validator, Highlighter)]
pub struct Repl {
    pub command_names: Vec<String>,
}

impl Completer for Repl {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        if !line.starts_with('/') {
            return Ok((0, Vec::new()));
        }

        let args = parse_command_line(line);
        if let Ok(cli_command) = CliCommand::try_parse_from(&args) {
            return match cli_command.command {
                Command::Mode { .. } => Ok(mode_compl(line, pos)),
                _ => Ok((0, Vec::new())),
            };
        }

        let candidates = self
            .command_names
            .iter()
            .filter(|name| name.starts_with(line))
            .map(|name| CompletionCandidate::new(name))
            .collect();

        Ok((0, candidates))
    }
}

impl Hinter for Repl {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.is_empty() || pos < line.len() || !line.starts_with('/') {
            return None;
        }
        self.command_names
            .iter()
            .find(|&cmd_name| cmd_name.starts_with(line))
            .map(|cmd_name| cmd_name[line.len()..].into())
    }
}

// Mode tags after "/mode "
fn mode_compl(line: &str, pos: usize) -> (usize, Vec<CompletionCandidate>) {
    let line_to_pos = &line[..pos];
    let Some(space_pos) = line_to_pos.rfind(' ') else {
        return (0, Vec::new());
    };
    let prefix_start = space_pos + 1;
    let prefix = &line_to_pos[prefix_start..];
    let candidates = Mode::ALL
        .iter()
        .map(|m| m.as_str())
        .filter(|tag| tag.starts_with(prefix))
        .map(CompletionCandidate::new)
        .collect();
    (prefix_start, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::commands::command_names;
    use rustyline::history::DefaultHistory;

    fn repl() -> Repl {
        Repl {
            command_names: vec![
                "/mode".to_string(),
                "/modes".to_string(),
                "/history".to_string(),
                "/exit".to_string(),
            ],
        }
    }

    #[test]
    fn test_mode_command_completion() {
        let history = DefaultHistory::new();
        let line = "/mode m";
        let (start, candidates) = repl()
            .complete(line, line.len(), &rustyline::Context::new(&history))
            .unwrap();

        assert_eq!(start, 6);
        let tags: Vec<&str> = candidates.iter().map(|c| c.replacement()).collect();
        assert_eq!(tags, vec!["mentor", "motivation"]);
    }

    #[test]
    fn test_command_name_completion() {
        let history = DefaultHistory::new();
        let line = "/h";
        let (start, candidates) = repl()
            .complete(line, line.len(), &rustyline::Context::new(&history))
            .unwrap();
        assert_eq!(start, 0);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].replacement(), "/history");
    }

    #[test]
    fn test_plain_text_is_not_completed() {
        let history = DefaultHistory::new();
        let (_, candidates) = repl()
            .complete("hello", 5, &rustyline::Context::new(&history))
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_repl_hinter() {
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);
        assert_eq!(repl().hint("/hi", 3, &ctx), Some("story".to_string()));
        assert_eq!(repl().hint("hi", 2, &ctx), None);
    }

    #[test]
    fn test_help_is_completed_and_hinted() {
        let repl = Repl {
            command_names: command_names(),
        };
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        let (_, candidates) = repl.complete("/he", 3, &ctx).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].replacement(), "/help");
        assert_eq!(repl.hint("/hel", 4, &ctx), Some("p".to_string()));
    }
}
