//! Reaction callback registry.
//!
//! Maps live messages to their callback sets. Each set sits behind its own
//! async mutex, so reactions on one message are handled one at a time while
//! reactions on different messages run concurrently. The map itself is
//! sharded and only held long enough to clone an entry out of it.

use super::set::{CallbackSet, RemovalPolicy, TimeoutCallback, TimeoutInput};
use dashmap::DashMap;
use futures::FutureExt;
use std::{
    any::Any,
    collections::HashSet,
    fmt,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};
use tether_core::{
    CallbackAction, Context, Criterion, HandlerError, MessageId, Platform, ReactionEvent,
    ReactionInput, SharedHandler, UserId,
};
use tokio::time::Instant;
use tracing::{Instrument, debug, error, info_span, trace, warn};

/// Distinguishes successive callback sets attached to the same message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Return the raw generation number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// What the registry did with a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionDispatch {
    /// No callback set is attached to the message.
    NotHandled,
    /// The reaction failed the set's criterion (or its author already used
    /// a single-use set). No handler ran.
    Rejected,
    /// The reaction was accepted but no binding exists for its emote.
    Unbound,
    /// A handler ran and returned this action.
    Handled(CallbackAction),
    /// The handler faulted; the set has been detached.
    Faulted,
}

impl ReactionDispatch {
    /// Whether a callback set consumed the reaction.
    pub fn is_handled(self) -> bool {
        !matches!(self, ReactionDispatch::NotHandled)
    }
}

struct Attached {
    set: CallbackSet,
    removal: RemovalPolicy,
    used_by: HashSet<UserId>,
}

struct Entry {
    generation: Generation,
    context: Context,
    deadline: Option<Instant>,
    detached: AtomicBool,
    on_timeout: Mutex<Option<TimeoutCallback>>,
    state: tokio::sync::Mutex<Attached>,
}

struct Inner {
    entries: DashMap<MessageId, Arc<Entry>>,
    next_generation: AtomicU64,
    platform: Arc<dyn Platform>,
    default_removal: RemovalPolicy,
}

/// Registry of callback sets, keyed by message.
///
/// Cloning the registry is cheap and yields a handle to the same entries.
#[derive(Clone)]
pub struct CallbackRegistry {
    inner: Arc<Inner>,
}

impl CallbackRegistry {
    /// Create an empty registry that performs outbound calls through
    /// `platform` and strips rejected reactions per `default_removal` unless a
    /// set overrides it.
    pub fn new(platform: Arc<dyn Platform>, default_removal: RemovalPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                next_generation: AtomicU64::new(1),
                platform,
                default_removal,
            }),
        }
    }

    /// The outbound platform used by this registry.
    pub fn platform(&self) -> Arc<dyn Platform> {
        Arc::clone(&self.inner.platform)
    }

    /// Attach `set` to `message`, owned by `ctx`.
    ///
    /// A set already attached to the same message is detached and replaced.
    /// The registry does not schedule `deadline`; the caller hands the
    /// returned generation to the timeout scheduler.
    pub fn attach(
        &self,
        message: MessageId,
        ctx: Context,
        mut set: CallbackSet,
        deadline: Option<Instant>,
    ) -> Generation {
        let generation = Generation(self.inner.next_generation.fetch_add(1, Ordering::Relaxed));
        let on_timeout = set.on_timeout.take();
        let removal = set.removal.unwrap_or(self.inner.default_removal);
        let entry = Arc::new(Entry {
            generation,
            context: ctx,
            deadline,
            detached: AtomicBool::new(false),
            on_timeout: Mutex::new(on_timeout),
            state: tokio::sync::Mutex::new(Attached {
                set,
                removal,
                used_by: HashSet::new(),
            }),
        });

        if let Some(previous) = self.inner.entries.insert(message, entry) {
            previous.detached.store(true, Ordering::Release);
            debug!(%message, replaced = %previous.generation, "callback set replaced");
        }
        trace!(%message, %generation, ?deadline, "callback set attached");
        generation
    }

    /// Detach whatever set is attached to `message`. Returns `false` if there
    /// was none.
    pub fn detach(&self, message: MessageId) -> bool {
        match self.inner.entries.remove(&message) {
            Some((_, entry)) => {
                entry.detached.store(true, Ordering::Release);
                debug!(%message, generation = %entry.generation, "callback set detached");
                true
            }
            None => false,
        }
    }

    /// Expire the set attached to `message` if it is still `generation`.
    ///
    /// Expiry takes the set's lock like any reaction does, so a handler that
    /// is still running finishes first; the set is then removed and its
    /// timeout callback runs on a new task. Returns `false` when the set was
    /// already detached or replaced.
    pub fn expire(&self, message: MessageId, generation: Generation) -> bool {
        let Some(entry) = self
            .inner
            .entries
            .get(&message)
            .filter(|entry| entry.generation == generation)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return false;
        };

        match entry.state.try_lock() {
            Ok(_state) => self.finish_expiry(message, &entry),
            Err(_) => {
                trace!(%message, %generation, "expiry waits for a running handler");
                let registry = self.clone();
                let entry = Arc::clone(&entry);
                tokio::spawn(async move {
                    let _state = entry.state.lock().await;
                    registry.finish_expiry(message, &entry);
                });
            }
        }
        true
    }

    // Caller holds the entry's state lock.
    fn finish_expiry(&self, message: MessageId, entry: &Arc<Entry>) {
        if self
            .inner
            .entries
            .remove_if(&message, |_, current| Arc::ptr_eq(current, entry))
            .is_none()
        {
            return;
        }
        entry.detached.store(true, Ordering::Release);
        debug!(%message, generation = %entry.generation, "callback set expired");

        let callback = match entry.on_timeout.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(callback) = callback {
            tokio::spawn(callback(TimeoutInput {
                context: entry.context,
                message_id: message,
                platform: self.platform(),
            }));
        }
    }

    /// Whether a set is attached to `message`.
    pub fn contains(&self, message: MessageId) -> bool {
        self.inner.entries.contains_key(&message)
    }

    /// Generation and deadline of the set attached to `message`.
    pub fn lookup(&self, message: MessageId) -> Option<(Generation, Option<Instant>)> {
        self.inner
            .entries
            .get(&message)
            .map(|entry| (entry.generation, entry.deadline))
    }

    /// Number of attached sets.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether no sets are attached.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Route a reaction to the set attached to its message.
    pub async fn on_reaction(&self, reaction: &ReactionEvent) -> ReactionDispatch {
        let message = reaction.message_id;
        let Some(entry) = self
            .inner
            .entries
            .get(&message)
            .map(|entry| Arc::clone(entry.value()))
        else {
            return ReactionDispatch::NotHandled;
        };

        let mut state = entry.state.lock().await;
        // Detached while this reaction waited for the lock.
        if entry.detached.load(Ordering::Acquire) {
            return ReactionDispatch::NotHandled;
        }

        let spent = state.set.single_use_per_user && state.used_by.contains(&reaction.author_id);
        if spent || !state.set.criterion.evaluate(reaction, &entry.context) {
            debug!(%message, user = %reaction.author_id, emote = %reaction.emote, "reaction rejected");
            if state.removal == RemovalPolicy::Remove {
                self.strip(reaction).await;
            }
            return ReactionDispatch::Rejected;
        }

        let binding = state.set.find(&reaction.emote).map(|b| b.handler());
        let Some(handler) = binding else {
            trace!(%message, emote = %reaction.emote, "no binding for emote");
            if state.removal == RemovalPolicy::Remove {
                self.strip(reaction).await;
            }
            return ReactionDispatch::Unbound;
        };

        let input = ReactionInput {
            context: entry.context,
            reaction: reaction.clone(),
            platform: self.platform(),
        };
        let span = info_span!(
            "reaction_callback",
            %message,
            generation = %entry.generation,
            user = %reaction.author_id,
            emote = %reaction.emote,
        );
        let result = run_handler(handler, input, state.set.handler_timeout)
            .instrument(span)
            .await;

        // Detached or replaced while the handler ran: its result no longer
        // applies to this message.
        if entry.detached.load(Ordering::Acquire) {
            debug!(%message, generation = %entry.generation, "handler finished after its set was detached");
            return ReactionDispatch::Handled(CallbackAction::Detach);
        }

        match result {
            Ok(action) => {
                if state.set.single_use_per_user {
                    state.used_by.insert(reaction.author_id);
                }
                if action.is_terminal() || state.set.expires_after_use {
                    self.remove_entry(message, &entry);
                    ReactionDispatch::Handled(CallbackAction::Detach)
                } else {
                    ReactionDispatch::Handled(action)
                }
            }
            Err(err) => {
                error!(%message, generation = %entry.generation, error = %err, "reaction handler faulted, detaching");
                self.remove_entry(message, &entry);
                ReactionDispatch::Faulted
            }
        }
    }

    fn remove_entry(&self, message: MessageId, entry: &Arc<Entry>) {
        entry.detached.store(true, Ordering::Release);
        if self
            .inner
            .entries
            .remove_if(&message, |_, current| Arc::ptr_eq(current, entry))
            .is_some()
        {
            debug!(%message, generation = %entry.generation, "callback set detached");
        }
    }

    async fn strip(&self, reaction: &ReactionEvent) {
        if let Err(err) = self
            .inner
            .platform
            .remove_reaction(reaction.message_id, reaction.author_id, &reaction.emote)
            .await
        {
            warn!(message = %reaction.message_id, error = %err, "failed to remove rejected reaction");
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("attached", &self.inner.entries.len())
            .field("default_removal", &self.inner.default_removal)
            .finish_non_exhaustive()
    }
}

async fn run_handler(
    handler: SharedHandler,
    input: ReactionInput,
    limit: Option<Duration>,
) -> Result<CallbackAction, HandlerError> {
    let call = AssertUnwindSafe(handler.call_dyn(input)).catch_unwind();
    let outcome = match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| HandlerError::TimedOut(limit))?,
        None => call.await,
    };
    match outcome {
        Ok(Ok(action)) => Ok(action),
        Ok(Err(err)) => Err(HandlerError::Failed(err)),
        Err(panic) => Err(HandlerError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
