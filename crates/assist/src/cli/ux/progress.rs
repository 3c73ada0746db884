use assist_core::mode::Mode;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Typing indicator shown between submitting a message and the first revealed character.
#[derive(Debug)]
pub struct GenerationSpinner {
    spinner: ProgressBar,
}

impl GenerationSpinner {
    /// Starts a spinner naming the mode the request was sent with, with the time waited so far.
    pub fn thinking(mode: Mode) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}") {
            spinner.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        }
        spinner.set_message(format!("Thinking ({})...", mode.label()));
        spinner.enable_steady_tick(TICK_INTERVAL);

        Self { spinner }
    }

    /// Removes the spinner. Safe to call more than once.
    pub fn clear(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_names_mode_and_clears_once() {
        let spinner = GenerationSpinner::thinking(Mode::Study);
        assert_eq!(spinner.spinner.message(), "Thinking (Study Mode)...");

        spinner.clear();
        spinner.clear();
        assert!(spinner.spinner.is_finished());
    }
}
