use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Assistant behaviour selected for a submission. Forwarded verbatim to the chat endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Default,
    Study,
    #[serde(rename = "tasks")]
    TaskHelper,
    Mentor,
    Motivation,
}

impl Mode {
    /// All modes in display order.
    pub const ALL: [Mode; 5] = [
        Mode::Default,
        Mode::Study,
        Mode::TaskHelper,
        Mode::Mentor,
        Mode::Motivation,
    ];

    /// Tag sent over the wire.
    pub fn as_str(&self) -> &'static str {
        match &self {
            Mode::Default => "default",
            Mode::Study => "study",
            Mode::TaskHelper => "tasks",
            Mode::Mentor => "mentor",
            Mode::Motivation => "motivation",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match &self {
            Mode::Default => "AI Mode",
            Mode::Study => "Study Mode",
            Mode::TaskHelper => "Task Helper",
            Mode::Mentor => "Mentor Mode",
            Mode::Motivation => "Motivation Mode",
        }
    }
}

impl From<Mode> for String {
    fn from(val: Mode) -> Self {
        val.as_str().into()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ModeError {
    #[error("Unknown chat mode: '{0}'")]
    Unknown(String),
}

impl FromStr for Mode {
    type Err = ModeError;

    /// Accepts a wire tag or a label, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Mode::ALL
            .into_iter()
            .find(|m| {
                m.as_str().eq_ignore_ascii_case(needle) || m.label().eq_ignore_ascii_case(needle)
            })
            .ok_or_else(|| ModeError::Unknown(s.to_string()))
    }
}
