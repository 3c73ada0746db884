//! A conversation between the user and the assistant.
//!
//! The session owns the message history, the selected mode and a generation counter. Every
//! submission, reset and cancel advances the generation; asynchronous work (the chat request,
//! reveal ticks, completion) carries the generation it was started under and becomes a no-op
//! once the session has moved past it.
use crate::animator::{AnimationRequest, ReplyAnimator};
use crate::config::Config;
use crate::dispatch::{Dispatcher, HttpDispatcher, Reply};
use crate::lock_unpoisoned;
use crate::message::{Message, MessageId, Sender};
use crate::mode::{Mode, ModeError};
use crate::narrator::{Narrator, get_narrator};
use futures::stream::{BoxStream, StreamExt};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

pub type Generation = u64;

/// Observable changes to a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    UserMessage {
        generation: Generation,
        id: MessageId,
        text: String,
    },
    /// An empty assistant message was appended and is about to be revealed.
    ReplyStarted {
        generation: Generation,
        id: MessageId,
    },
    /// Cumulative text revealed so far.
    Revealed {
        generation: Generation,
        id: MessageId,
        text: String,
    },
    Completed {
        generation: Generation,
        id: MessageId,
        text: String,
        fallback: bool,
    },
    /// A partially revealed message was frozen by cancellation.
    Frozen { id: MessageId, text: String },
    /// A reply arrived for a superseded generation and was dropped.
    Discarded { generation: Generation },
    ModeChanged { mode: Mode },
    Reset,
}

struct SessionState {
    messages: Vec<Message>,
    mode: Mode,
    generation: Generation,
    next_id: u64,
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionState {
    fn push(&mut self, sender: Sender, text: &str, complete: bool) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(Message::new(id, sender, text, complete));
        id
    }

    fn find_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().rev().find(|m| m.id == id)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Marks every message still being revealed as complete.
    fn freeze_pending(&mut self) {
        let frozen: Vec<(MessageId, String)> = self
            .messages
            .iter_mut()
            .filter(|m| !m.complete)
            .map(|m| {
                m.freeze();
                (m.id, m.text.clone())
            })
            .collect();
        for (id, text) in frozen {
            debug!(%id, chars = text.chars().count(), "Froze partially revealed message");
            self.emit(SessionEvent::Frozen { id, text });
        }
    }
}

struct SessionInner {
    state: Mutex<SessionState>,
    /// Held while stopping or starting reveal and narration. Taken before `state`.
    playback: Mutex<()>,
    dispatcher: Arc<dyn Dispatcher>,
    animator: ReplyAnimator,
    narrator: Arc<dyn Narrator>,
}

impl SessionInner {
    /// Stops reveal and narration, leaving partial text in place.
    ///
    /// Callers advance the generation first, so any reply or completion that enters the playback
    /// section afterwards sees it is stale.
    fn stop_playback(&self) {
        let _playback = lock_unpoisoned(&self.playback);
        self.animator.cancel();
        self.narrator.cancel();
        lock_unpoisoned(&self.state).freeze_pending();
    }

    fn apply_reply(self: &Arc<Self>, generation: Generation, reply: Reply) {
        let _playback = lock_unpoisoned(&self.playback);
        let id = {
            let mut state = lock_unpoisoned(&self.state);
            if state.generation != generation {
                debug!(generation, current = state.generation, "Discarding stale reply");
                state.emit(SessionEvent::Discarded { generation });
                return;
            }
            let id = state.push(Sender::Assistant, "", false);
            state.emit(SessionEvent::ReplyStarted { generation, id });
            id
        };

        let fallback = reply.is_fallback();
        let text = reply.into_text();
        if text.is_empty() {
            // Nothing to reveal; the animator would call back on this stack
            self.finish_reply(generation, id, text, fallback);
            return;
        }

        let on_reveal = {
            let weak = Arc::downgrade(self);
            move |text: &str| {
                if let Some(inner) = weak.upgrade() {
                    inner.apply_reveal(generation, id, text);
                }
            }
        };
        let on_complete = {
            let weak: Weak<SessionInner> = Arc::downgrade(self);
            move |text: String, generation: Generation| {
                if let Some(inner) = weak.upgrade() {
                    inner.apply_completion(generation, id, text, fallback);
                }
            }
        };

        self.animator.start(
            AnimationRequest {
                target: id,
                text,
                generation,
            },
            on_reveal,
            on_complete,
        );
    }

    fn apply_reveal(&self, generation: Generation, id: MessageId, text: &str) {
        let mut state = lock_unpoisoned(&self.state);
        if state.generation != generation {
            return;
        }
        let revealed = state.find_mut(id).is_some_and(|m| m.reveal(text));
        if revealed {
            state.emit(SessionEvent::Revealed {
                generation,
                id,
                text: text.to_string(),
            });
        }
    }

    fn apply_completion(&self, generation: Generation, id: MessageId, text: String, fallback: bool) {
        let _playback = lock_unpoisoned(&self.playback);
        self.finish_reply(generation, id, text, fallback);
    }

    /// Freezes the reply and narrates it. Runs inside the playback section, so a newer
    /// submission either makes this a no-op or stops the narration it starts.
    fn finish_reply(&self, generation: Generation, id: MessageId, text: String, fallback: bool) {
        {
            let mut state = lock_unpoisoned(&self.state);
            if state.generation != generation {
                debug!(generation, current = state.generation, "Skipping stale completion");
                return;
            }
            let Some(message) = state.find_mut(id).filter(|m| !m.complete) else {
                return;
            };
            message.reveal(&text);
            message.freeze();
            state.emit(SessionEvent::Completed {
                generation,
                id,
                text: text.clone(),
                fallback,
            });
        }
        self.narrator.speak(&text);
    }
}

/// A submitted message awaiting its reply.
#[derive(Debug)]
pub struct Turn {
    generation: Generation,
    handle: JoinHandle<()>,
}

impl Turn {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Waits until the reply has been applied to the session or discarded.
    pub async fn dispatched(self) {
        if let Err(err) = self.handle.await {
            debug!(error = %err, "Dispatch task ended abnormally");
        }
    }
}

/// Conversation state plus the services that render replies into it.
///
/// Cloning is cheap; clones share the same conversation.
#[derive(Clone)]
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

impl ConversationSession {
    pub fn new(
        mode: Mode,
        dispatcher: Arc<dyn Dispatcher>,
        animator: ReplyAnimator,
        narrator: Arc<dyn Narrator>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState {
                    messages: Vec::new(),
                    mode,
                    generation: 0,
                    next_id: 0,
                    subscribers: Vec::new(),
                }),
                playback: Mutex::new(()),
                dispatcher,
                animator,
                narrator,
            }),
        }
    }

    /// Builds a session talking to the configured endpoint.
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        let dispatcher = HttpDispatcher::new(&config.endpoint)?;
        Ok(Self::new(
            config.mode,
            Arc::new(dispatcher),
            ReplyAnimator::new(&config.reveal),
            get_narrator(&config.narrator),
        ))
    }

    /// Submits a user message with the current mode.
    ///
    /// Blank input is ignored and returns `None`. Otherwise any reveal or narration in progress
    /// is stopped before the request is sent, and only the reply for the newest submission is
    /// ever rendered.
    pub fn submit(&self, raw_text: &str) -> Option<Turn> {
        if raw_text.trim().is_empty() {
            debug!("Ignoring empty submission");
            return None;
        }

        let (generation, mode) = {
            let mut state = lock_unpoisoned(&self.inner.state);
            state.generation += 1;
            let generation = state.generation;
            let id = state.push(Sender::User, raw_text, true);
            state.emit(SessionEvent::UserMessage {
                generation,
                id,
                text: raw_text.to_string(),
            });
            (generation, state.mode)
        };
        debug!(generation, %mode, "Submitting message");

        self.inner.stop_playback();

        let inner = self.inner.clone();
        let message = raw_text.to_string();
        let handle = tokio::spawn(async move {
            let reply = inner.dispatcher.send(&message, mode).await;
            inner.apply_reply(generation, reply);
        });

        Some(Turn { generation, handle })
    }

    /// Selects the mode for the next submission. History and in-flight work are untouched.
    pub fn set_mode(&self, mode: Mode) {
        let mut state = lock_unpoisoned(&self.inner.state);
        if state.mode != mode {
            state.mode = mode;
            state.emit(SessionEvent::ModeChanged { mode });
        }
    }

    /// Selects a mode by wire tag or label. Unknown names leave the current mode in place.
    pub fn select_mode(&self, name: &str) -> Result<Mode, ModeError> {
        let mode = name.parse::<Mode>()?;
        self.set_mode(mode);
        Ok(mode)
    }

    /// Stops the current turn: pending replies are discarded and partial text is frozen.
    pub fn cancel(&self) {
        {
            let mut state = lock_unpoisoned(&self.inner.state);
            state.generation += 1;
            debug!(generation = state.generation, "Cancelled current turn");
        }
        self.inner.stop_playback();
    }

    /// Clears the conversation and invalidates all outstanding work.
    pub fn reset(&self) {
        {
            let mut state = lock_unpoisoned(&self.inner.state);
            state.messages.clear();
            state.generation += 1;
            state.emit(SessionEvent::Reset);
            debug!(generation = state.generation, "Session reset");
        }
        let _playback = lock_unpoisoned(&self.inner.playback);
        self.inner.animator.cancel();
        self.inner.narrator.cancel();
    }

    /// Subscribes to session changes from this point on.
    pub fn events(&self) -> BoxStream<'static, SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock_unpoisoned(&self.inner.state).subscribers.push(tx);
        UnboundedReceiverStream::new(rx).boxed()
    }

    pub fn messages(&self) -> Vec<Message> {
        lock_unpoisoned(&self.inner.state).messages.clone()
    }

    pub fn mode(&self) -> Mode {
        lock_unpoisoned(&self.inner.state).mode
    }

    pub fn generation(&self) -> Generation {
        lock_unpoisoned(&self.inner.state).generation
    }

    pub fn last_assistant_message(&self) -> Option<Message> {
        lock_unpoisoned(&self.inner.state)
            .messages
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Assistant)
            .cloned()
    }
}
