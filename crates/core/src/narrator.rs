//! Spoken playback of completed replies.
use crate::config::NarratorConfig;
use crate::lock_unpoisoned;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Speech output. At most one narration plays at a time.
pub trait Narrator: Send + Sync {
    /// Stops any current narration, then starts speaking `text`.
    fn speak(&self, text: &str);
    /// Stops the current narration, if any.
    fn cancel(&self);
}

/// Narrator that stays quiet.
#[derive(Debug, Default)]
pub struct SilentNarrator;

impl Narrator for SilentNarrator {
    fn speak(&self, _text: &str) {}

    fn cancel(&self) {}
}

/// Speaks through an external text-to-speech program such as `espeak` or `say`.
///
/// The text is passed as the last argument.
#[derive(Debug)]
pub struct CommandNarrator {
    program: String,
    args: Vec<String>,
    current: Mutex<Option<Child>>,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            current: Mutex::new(None),
        }
    }

    /// Whether a narration process is still running.
    pub fn is_speaking(&self) -> bool {
        let mut current = lock_unpoisoned(&self.current);
        match current.as_mut().map(|child| child.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                *current = None;
                false
            }
            None => false,
        }
    }
}

impl Narrator for CommandNarrator {
    fn speak(&self, text: &str) {
        // Held across stop, spawn and store so a concurrent cancel never misses the new child
        let mut current = lock_unpoisoned(&self.current);
        if let Some(child) = current.take() {
            stop(child);
        }

        let spawned = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        match spawned {
            Ok(child) => {
                debug!(program = %self.program, pid = ?child.id(), "Narration started");
                *current = Some(child);
            }
            Err(err) => warn!(program = %self.program, error = %err, "Failed to start narration"),
        }
    }

    fn cancel(&self) {
        if let Some(child) = lock_unpoisoned(&self.current).take() {
            stop(child);
        }
    }
}

fn stop(mut child: Child) {
    if let Err(err) = child.start_kill() {
        debug!(error = %err, "Narration already finished");
    }
}

/// Builds the narrator described by `config`.
pub fn get_narrator(config: &NarratorConfig) -> Arc<dyn Narrator> {
    if config.enabled {
        Arc::new(CommandNarrator::new(
            config.command.clone(),
            config.args.clone(),
        ))
    } else {
        Arc::new(SilentNarrator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_not_fatal() {
        let narrator = CommandNarrator::new("assist-no-such-tts-program", vec![]);
        narrator.speak("hello");
        assert!(!narrator.is_speaking());
        narrator.cancel();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_running_narration() {
        // `sleep` stands in for a long narration; the text is its duration
        let narrator = CommandNarrator::new("sleep", vec![]);
        narrator.speak("30");
        assert!(narrator.is_speaking());

        narrator.cancel();
        assert!(!narrator.is_speaking());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_speak_replaces_previous_narration() {
        let narrator = CommandNarrator::new("sleep", vec![]);
        narrator.speak("30");
        let first_pid = lock_unpoisoned(&narrator.current)
            .as_ref()
            .and_then(|c| c.id());

        narrator.speak("30");
        let second_pid = lock_unpoisoned(&narrator.current)
            .as_ref()
            .and_then(|c| c.id());

        assert_ne!(first_pid, second_pid);
        assert!(narrator.is_speaking());
        narrator.cancel();
    }

    #[test]
    fn test_get_narrator_respects_enabled_flag() {
        // Building never spawns anything, so both variants are safe to construct here
        let disabled = get_narrator(&NarratorConfig::default());
        disabled.speak("quiet");
        disabled.cancel();

        let enabled = get_narrator(&NarratorConfig {
            enabled: true,
            ..Default::default()
        });
        enabled.cancel();
    }
}
