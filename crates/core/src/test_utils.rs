//! Test utilities for assist-core crate
//!
//! Fakes for the dispatcher and narrator seams plus temp config helpers.

use crate::dispatch::{Dispatcher, Reply};
use crate::mode::Mode;
use crate::narrator::Narrator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::Builder;

pub const FALLBACK_REPLY: &str = "Error connecting to Assist AI";

/// Creates a temporary config file with the given content.
/// Uses tempfile::Builder to ensure unique directories for parallel tests.
///
/// # Panics
/// Panics if temp directory creation or file writing fails.
pub fn create_temp_config(content: &str) -> PathBuf {
    let temp_dir = Builder::new()
        .prefix("assist-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let config_path = temp_dir.path().join("assist.yml");
    File::create(&config_path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
    // Keep the temp directory alive by leaking it (this is just for tests)
    let _ = Box::leak(Box::new(temp_dir));
    config_path
}

/// Dispatcher answering from a script keyed by message text.
///
/// Unscripted messages get an immediate canned reply.
#[derive(Default)]
pub struct ScriptedDispatcher {
    script: HashMap<String, (Duration, Reply)>,
    calls: Mutex<Vec<(String, Mode)>>,
}

impl ScriptedDispatcher {
    pub fn reply(self, message: &str, reply: &str) -> Self {
        self.reply_after(message, reply, Duration::ZERO)
    }

    pub fn reply_after(mut self, message: &str, reply: &str, delay: Duration) -> Self {
        self.script
            .insert(message.to_string(), (delay, Reply::Text(reply.to_string())));
        self
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.script.insert(
            message.to_string(),
            (Duration::ZERO, Reply::Fallback(FALLBACK_REPLY.to_string())),
        );
        self
    }

    pub fn calls(&self) -> Vec<(String, Mode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn send(&self, message: &str, mode: Mode) -> Reply {
        self.calls.lock().unwrap().push((message.to_string(), mode));
        let (delay, reply) = self.script.get(message).cloned().unwrap_or_else(|| {
            (
                Duration::ZERO,
                Reply::Text("Hello! Ask me about tasks, study plan, mood, or productivity.".into()),
            )
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

/// Narrator that records what it was asked to do.
#[derive(Default)]
pub struct RecordingNarrator {
    spoken: Mutex<Vec<String>>,
    cancels: AtomicUsize,
}

impl RecordingNarrator {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl Narrator for RecordingNarrator {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}
