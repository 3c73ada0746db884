//! Character-by-character reveal of a reply.
//!
//! One animation runs at a time. Each tick appends the next character and hands the cumulative
//! text to the caller; the animator never touches session state itself.
use crate::config::RevealConfig;
use crate::lock_unpoisoned;
use crate::message::MessageId;
use crate::session::Generation;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU8, Ordering},
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of an animation. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AnimationState {
    Idle = 0,
    Revealing = 1,
    Completed = 2,
    Cancelled = 3,
}

impl AnimationState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => AnimationState::Revealing,
            2 => AnimationState::Completed,
            3 => AnimationState::Cancelled,
            _ => AnimationState::Idle,
        }
    }
}

/// State shared between an animation task and its handle.
#[derive(Debug, Clone)]
struct SharedState(Arc<AtomicU8>);

impl SharedState {
    fn new(state: AnimationState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    fn get(&self) -> AnimationState {
        AnimationState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Moves from `Revealing` to `to`. Only one terminal transition can win.
    fn finish(&self, to: AnimationState) -> bool {
        self.0
            .compare_exchange(
                AnimationState::Revealing as u8,
                to as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }
}

/// What to reveal and where.
#[derive(Debug, Clone)]
pub struct AnimationRequest {
    pub target: MessageId,
    pub text: String,
    pub generation: Generation,
}

#[derive(Debug)]
struct AnimationTask {
    target: MessageId,
    generation: Generation,
    state: SharedState,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

#[derive(Debug)]
pub struct ReplyAnimator {
    cadence: Duration,
    start_delay: Duration,
    active: Mutex<Option<AnimationTask>>,
}

impl ReplyAnimator {
    pub fn new(config: &RevealConfig) -> Self {
        Self::with_timing(config.cadence(), config.start_delay())
    }

    pub fn with_timing(cadence: Duration, start_delay: Duration) -> Self {
        Self {
            cadence,
            start_delay,
            active: Mutex::new(None),
        }
    }

    /// State of the most recently started animation.
    pub fn state(&self) -> AnimationState {
        lock_unpoisoned(&self.active)
            .as_ref()
            .map(|task| task.state.get())
            .unwrap_or(AnimationState::Idle)
    }

    /// Starts revealing `request.text`, cancelling any animation still running.
    ///
    /// `on_reveal` receives the cumulative revealed text after every tick. `on_complete` runs
    /// once with the full text if the animation is not cancelled first. Empty text completes
    /// immediately, on the caller's stack.
    pub fn start<R, C>(&self, request: AnimationRequest, on_reveal: R, on_complete: C)
    where
        R: Fn(&str) + Send + 'static,
        C: FnOnce(String, Generation) + Send + 'static,
    {
        self.cancel();

        let AnimationRequest {
            target,
            text,
            generation,
        } = request;
        let state = SharedState::new(AnimationState::Revealing);
        let token = CancellationToken::new();

        if text.is_empty() {
            state.finish(AnimationState::Completed);
            *lock_unpoisoned(&self.active) = Some(AnimationTask {
                target,
                generation,
                state,
                token,
                handle: None,
            });
            debug!(%target, generation, "Empty reply, completed without reveal");
            on_complete(text, generation);
            return;
        }

        debug!(%target, generation, chars = text.chars().count(), "Starting reveal");
        let cadence = self.cadence;
        let first_tick = Instant::now() + self.start_delay + cadence;
        let task_state = state.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut revealed = String::with_capacity(text.len());
            for ch in text.chars() {
                ticker.tick().await;
                if task_token.is_cancelled() {
                    return;
                }
                revealed.push(ch);
                on_reveal(&revealed);
            }

            if task_state.finish(AnimationState::Completed) {
                debug!(%target, generation, "Reveal completed");
                on_complete(revealed, generation);
            }
        });

        *lock_unpoisoned(&self.active) = Some(AnimationTask {
            target,
            generation,
            state,
            token,
            handle: Some(handle),
        });
    }

    /// Stops the running animation before its next tick. Already revealed text is kept.
    ///
    /// Returns the target message if an animation was actually interrupted.
    pub fn cancel(&self) -> Option<MessageId> {
        let active = lock_unpoisoned(&self.active);
        let task = active.as_ref()?;

        task.token.cancel();
        if let Some(handle) = &task.handle {
            handle.abort();
        }

        if task.state.finish(AnimationState::Cancelled) {
            debug!(target = %task.target, generation = task.generation, "Reveal cancelled");
            Some(task.target)
        } else {
            None
        }
    }
}
