use chrono::{DateTime, Utc};
use std::fmt;

/// Opaque sequence number identifying a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub(crate) u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl From<Sender> for String {
    fn from(val: Sender) -> Self {
        val.as_str().into()
    }
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match &self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

/// A chat message. Text only grows while `complete` is false and is fixed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub complete: bool,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(id: MessageId, sender: Sender, text: &str, complete: bool) -> Self {
        Self {
            id,
            sender,
            text: text.to_string(),
            complete,
            created_at: Utc::now(),
        }
    }

    /// Replaces the revealed text. Ignored once the message is complete or if `text` would
    /// shrink the message.
    pub(crate) fn reveal(&mut self, text: &str) -> bool {
        if self.complete || text.len() < self.text.len() {
            return false;
        }
        self.text.clear();
        self.text.push_str(text);
        true
    }

    pub(crate) fn freeze(&mut self) {
        self.complete = true;
    }
}
