#![cfg(test)]

//! Test utilities for chat modules

use assist_core::animator::ReplyAnimator;
use assist_core::dispatch::{Dispatcher, Reply};
use assist_core::mode::Mode;
use assist_core::narrator::SilentNarrator;
use assist_core::session::ConversationSession;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_REPLY: &str = "Hi there";

/// Dispatcher that answers every message with the same text after a delay.
pub struct FixedDispatcher {
    pub reply: Reply,
    pub delay: Duration,
}

#[async_trait]
impl Dispatcher for FixedDispatcher {
    async fn send(&self, _message: &str, _mode: Mode) -> Reply {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

pub fn create_session_with(reply: Reply, delay: Duration) -> ConversationSession {
    ConversationSession::new(
        Mode::Default,
        Arc::new(FixedDispatcher { reply, delay }),
        ReplyAnimator::with_timing(Duration::from_millis(18), Duration::ZERO),
        Arc::new(SilentNarrator),
    )
}

pub fn create_test_session() -> ConversationSession {
    create_session_with(Reply::Text(TEST_REPLY.to_string()), Duration::ZERO)
}
