//! Testing utilities for Tether.
//!
//! This module provides test doubles for the outbound platform and for
//! reaction handlers.
//!
//! # Features
//!
//! - [`RecordingPlatform`]: A platform that records every outbound call
//! - [`CountingHandler`]: A reaction handler that counts invocations

use async_trait::async_trait;
use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tether_core::{
    CallbackAction, ChannelId, Emote, MessageId, Platform, PlatformError, ReactionHandler,
    ReactionInput, UserId,
};

// ============================================================================
// Recording Platform
// ============================================================================

/// One outbound call seen by a [`RecordingPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    /// `send_message`, with the id that was handed back.
    Send {
        /// Target channel.
        channel: ChannelId,
        /// Message content.
        content: String,
        /// The id assigned to the new message.
        id: MessageId,
    },
    /// `edit_message`.
    Edit {
        /// Edited message.
        message: MessageId,
        /// New content.
        content: String,
    },
    /// `remove_reaction`.
    RemoveReaction {
        /// Reacted message.
        message: MessageId,
        /// User whose reaction was removed.
        user: UserId,
        /// Removed emote.
        emote: Emote,
    },
    /// `add_reaction`.
    AddReaction {
        /// Reacted message.
        message: MessageId,
        /// Added emote.
        emote: Emote,
    },
    /// `delete_message`.
    Delete {
        /// Deleted message.
        message: MessageId,
    },
}

/// A platform that records all outbound calls.
///
/// Sent messages get sequential ids starting at 1000. The bot user is
/// [`RecordingPlatform::BOT`] unless set with [`with_user`](Self::with_user).
/// Clones share the same record.
///
/// # Example
///
/// ```rust,ignore
/// let platform = RecordingPlatform::new();
/// let engine = Interactions::new(Arc::new(platform.clone()), EngineConfig::new());
///
/// // Drive the engine...
///
/// assert_eq!(platform.edits_of(message).len(), 2);
/// ```
#[derive(Clone)]
pub struct RecordingPlatform {
    user: UserId,
    calls: Arc<Mutex<Vec<PlatformCall>>>,
    next_id: Arc<AtomicU64>,
    failing: Arc<AtomicBool>,
    latency: Arc<Mutex<Option<Duration>>>,
}

impl RecordingPlatform {
    /// Default bot user.
    pub const BOT: UserId = UserId(0);

    /// Create an empty recording platform.
    pub fn new() -> Self {
        Self {
            user: Self::BOT,
            calls: Arc::new(Mutex::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1000)),
            failing: Arc::new(AtomicBool::new(false)),
            latency: Arc::new(Mutex::new(None)),
        }
    }

    /// Act as `user`.
    pub fn with_user(mut self, user: UserId) -> Self {
        self.user = user;
        self
    }

    /// Delay every subsequent call by `latency` (tokio time).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap() = latency;
    }

    /// Make every subsequent call fail (still recorded) until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Get a clone of the recorded calls.
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Contents of the messages sent so far, with their ids.
    pub fn sent(&self) -> Vec<(MessageId, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Send { id, content, .. } => Some((id, content)),
                _ => None,
            })
            .collect()
    }

    /// Contents written to `message` by edits, in order.
    pub fn edits_of(&self, message: MessageId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Edit { message: m, content } if m == message => Some(content),
                _ => None,
            })
            .collect()
    }

    /// Emotes the bot added to `message`, in order.
    pub fn reactions_added_to(&self, message: MessageId) -> Vec<Emote> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::AddReaction { message: m, emote } if m == message => Some(emote),
                _ => None,
            })
            .collect()
    }

    /// Messages deleted so far.
    pub fn deleted(&self) -> Vec<MessageId> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Delete { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    async fn delay(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn record(&self, call: PlatformCall) -> Result<(), PlatformError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(PlatformError::request("recording platform set to fail"));
        }
        Ok(())
    }
}

impl Default for RecordingPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    fn current_user(&self) -> UserId {
        self.user
    }

    async fn send_message(
        &self,
        channel: ChannelId,
        content: &str,
    ) -> Result<MessageId, PlatformError> {
        self.delay().await;
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.record(PlatformCall::Send {
            channel,
            content: content.to_string(),
            id,
        })?;
        Ok(id)
    }

    async fn edit_message(&self, message: MessageId, content: &str) -> Result<(), PlatformError> {
        self.delay().await;
        self.record(PlatformCall::Edit {
            message,
            content: content.to_string(),
        })
    }

    async fn remove_reaction(
        &self,
        message: MessageId,
        user: UserId,
        emote: &Emote,
    ) -> Result<(), PlatformError> {
        self.delay().await;
        self.record(PlatformCall::RemoveReaction {
            message,
            user,
            emote: emote.clone(),
        })
    }

    async fn add_reaction(&self, message: MessageId, emote: &Emote) -> Result<(), PlatformError> {
        self.delay().await;
        self.record(PlatformCall::AddReaction {
            message,
            emote: emote.clone(),
        })
    }

    async fn delete_message(&self, message: MessageId) -> Result<(), PlatformError> {
        self.delay().await;
        self.record(PlatformCall::Delete { message })
    }
}

// ============================================================================
// Counting Handler
// ============================================================================

/// A reaction handler that counts invocations.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingHandler::new();
/// let set = CallbackSet::new().bind("✅", counter.clone());
///
/// // Dispatch a reaction...
///
/// assert_eq!(counter.count(), 1);
/// ```
pub struct CountingHandler {
    count: Arc<AtomicUsize>,
    action: CallbackAction,
}

impl CountingHandler {
    /// Create a counting handler that keeps its set attached.
    pub fn new() -> Self {
        Self::returning(CallbackAction::Continue)
    }

    /// Create a counting handler that returns `action`.
    pub fn returning(action: CallbackAction) -> Self {
        Self {
            count: Arc::new(AtomicUsize::new(0)),
            action,
        }
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }
}

impl Default for CountingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CountingHandler {
    fn clone(&self) -> Self {
        Self {
            count: self.count.clone(),
            action: self.action,
        }
    }
}

impl ReactionHandler for CountingHandler {
    type Output = CallbackAction;

    async fn call(&self, _input: ReactionInput) -> Self::Output {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.action
    }
}
