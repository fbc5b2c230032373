//! Pending request registry.
//!
//! A pending wait is a request to be handed the next event that satisfies a
//! criterion. The caller suspends on a [`WaitHandle`]; the registry resolves it
//! with the first matching event, or with an expiry or cancellation signal.
//!
//! Every wait is removed from the registry exactly once. Removal from the
//! concurrent map is the single-resolution guard: whoever removes the entry
//! (an event, the scheduler, or a cancellation) writes the outcome, and every
//! other attempt finds nothing and does nothing.

use dashmap::DashMap;
use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};
use tether_core::{BoxCriterion, Context, Criterion, Message};
use tokio::{sync::oneshot, time::Instant};
use tracing::{debug, trace};

/// Identifier of a pending wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WaitId(u64);

impl WaitId {
    /// Return the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WaitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait-{}", self.0)
    }
}

/// How a pending wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<E> {
    /// An event satisfied the criterion.
    Matched(E),
    /// The deadline elapsed first.
    Expired,
    /// The wait was cancelled before anything else happened.
    Cancelled,
}

impl<E> WaitOutcome<E> {
    /// The matched event, if any.
    pub fn matched(self) -> Option<E> {
        match self {
            WaitOutcome::Matched(event) => Some(event),
            WaitOutcome::Expired | WaitOutcome::Cancelled => None,
        }
    }

    /// Whether the wait expired.
    pub fn is_expired(&self) -> bool {
        matches!(self, WaitOutcome::Expired)
    }

    /// Whether the wait was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitOutcome::Cancelled)
    }
}

struct PendingEntry<E> {
    context: Context,
    criterion: BoxCriterion<E>,
    created_at: Instant,
    deadline: Option<Instant>,
    slot: oneshot::Sender<WaitOutcome<E>>,
}

struct Inner<E> {
    entries: DashMap<WaitId, PendingEntry<E>>,
    next_id: AtomicU64,
}

impl<E> Inner<E> {
    fn resolve(&self, id: WaitId, outcome: WaitOutcome<E>) -> bool {
        match self.entries.remove(&id) {
            Some((_, entry)) => {
                // The receiver may already be gone; the wait is finished either way.
                let _ = entry.slot.send(outcome);
                true
            }
            None => false,
        }
    }
}

/// Registry of in-flight waits for events of type `E`.
///
/// Cloning the registry is cheap and yields a handle to the same entries.
pub struct PendingRegistry<E: Message> {
    inner: Arc<Inner<E>>,
}

impl<E: Message> Clone for PendingRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Message> Default for PendingRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Message> PendingRegistry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a wait owned by `ctx`.
    ///
    /// A `deadline` of `None` means the wait never expires; it stays until it
    /// is matched or cancelled. The registry does not schedule expiry itself:
    /// whoever sets a deadline must also hand it to the timeout scheduler.
    pub fn register<C>(&self, ctx: Context, criterion: C, deadline: Option<Instant>) -> WaitHandle<E>
    where
        C: Criterion<E>,
    {
        let id = WaitId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (slot, receiver) = oneshot::channel();
        self.inner.entries.insert(
            id,
            PendingEntry {
                context: ctx,
                criterion: criterion.boxed(),
                created_at: Instant::now(),
                deadline,
                slot,
            },
        );
        trace!(wait = %id, user = %ctx.user_id, channel = %ctx.channel_id, ?deadline, "wait registered");

        WaitHandle {
            id,
            deadline,
            receiver,
            registry: Arc::downgrade(&self.inner),
            finished: false,
        }
    }

    /// Offer an event to every registered wait.
    ///
    /// At most one wait is resolved per event. When several waits match, the
    /// earliest registered one wins. Returns the id of the resolved wait.
    pub fn on_event(&self, event: &E) -> Option<WaitId> {
        let mut candidates: Vec<WaitId> = self
            .inner
            .entries
            .iter()
            .filter(|entry| entry.criterion.evaluate(event, &entry.context))
            .map(|entry| *entry.key())
            .collect();
        candidates.sort_unstable();

        // A candidate may have expired or been cancelled since the scan; the
        // next one in line then gets the event.
        for id in candidates {
            if self
                .inner
                .resolve(id, WaitOutcome::Matched(event.clone()))
            {
                debug!(wait = %id, "wait matched");
                return Some(id);
            }
        }
        None
    }

    /// Resolve `id` as expired. Returns `false` if it was already resolved.
    pub fn expire(&self, id: WaitId) -> bool {
        let expired = self.inner.resolve(id, WaitOutcome::Expired);
        if expired {
            debug!(wait = %id, "wait expired");
        }
        expired
    }

    /// Resolve `id` as cancelled. Returns `false` if it was already resolved.
    pub fn cancel(&self, id: WaitId) -> bool {
        let cancelled = self.inner.resolve(id, WaitOutcome::Cancelled);
        if cancelled {
            debug!(wait = %id, "wait cancelled");
        }
        cancelled
    }

    /// Cancel every outstanding wait. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let ids: Vec<WaitId> = self.inner.entries.iter().map(|entry| *entry.key()).collect();
        ids.into_iter().filter(|id| self.cancel(*id)).count()
    }

    /// Whether `id` is still waiting.
    pub fn contains(&self, id: WaitId) -> bool {
        self.inner.entries.contains_key(&id)
    }

    /// Deadline and creation time of a waiting entry.
    pub fn timing(&self, id: WaitId) -> Option<(Instant, Option<Instant>)> {
        self.inner
            .entries
            .get(&id)
            .map(|entry| (entry.created_at, entry.deadline))
    }

    /// Number of outstanding waits.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Whether there are no outstanding waits.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

/// The caller's side of a pending wait.
///
/// Dropping the handle before the wait resolves cancels it.
pub struct WaitHandle<E> {
    id: WaitId,
    deadline: Option<Instant>,
    receiver: oneshot::Receiver<WaitOutcome<E>>,
    registry: Weak<Inner<E>>,
    finished: bool,
}

impl<E> WaitHandle<E> {
    /// The id of the wait.
    pub fn id(&self) -> WaitId {
        self.id
    }

    /// The deadline the wait was registered with.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Suspend until the wait resolves.
    pub async fn outcome(mut self) -> WaitOutcome<E> {
        let outcome = match (&mut self.receiver).await {
            Ok(outcome) => outcome,
            // Sender dropped without a value: the registry itself went away.
            Err(_) => WaitOutcome::Cancelled,
        };
        self.finished = true;
        outcome
    }

    /// Cancel the wait. A no-op if it already resolved.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if let Some(inner) = self.registry.upgrade() {
            if inner.resolve(self.id, WaitOutcome::Cancelled) {
                debug!(wait = %self.id, "wait cancelled by its handle");
            }
        }
    }
}

impl<E> Drop for WaitHandle<E> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<E> fmt::Debug for WaitHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitHandle")
            .field("id", &self.id)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{FromSourceUser, InSourceChannel};
    use tether_core::{AllOf, ChannelId, MessageEvent, MessageId, UserId};

    fn ctx() -> Context {
        Context::new(UserId(1), ChannelId(10))
    }

    fn message(id: u64, author: u64, content: &str) -> MessageEvent {
        MessageEvent {
            id: MessageId(id),
            author_id: UserId(author),
            channel_id: ChannelId(10),
            content: content.into(),
        }
    }

    fn source_only() -> AllOf<MessageEvent> {
        AllOf::new().with(FromSourceUser).with(InSourceChannel)
    }

    #[tokio::test]
    async fn matching_event_resolves_and_removes() {
        let registry = PendingRegistry::new();
        let handle = registry.register(ctx(), source_only(), None);
        let id = handle.id();

        assert_eq!(registry.on_event(&message(1, 2, "not you")), None);
        assert_eq!(registry.on_event(&message(2, 1, "me")), Some(id));
        assert!(registry.is_empty());

        let outcome = handle.outcome().await;
        assert_eq!(outcome.matched().map(|m| m.content), Some("me".to_string()));
    }

    #[tokio::test]
    async fn earliest_registration_wins_a_shared_event() {
        let registry = PendingRegistry::new();
        let first = registry.register(ctx(), source_only(), None);
        let second = registry.register(ctx(), source_only(), None);

        assert_eq!(registry.on_event(&message(1, 1, "a")), Some(first.id()));
        assert_eq!(registry.on_event(&message(2, 1, "b")), Some(second.id()));

        assert_eq!(first.outcome().await.matched().unwrap().content, "a");
        assert_eq!(second.outcome().await.matched().unwrap().content, "b");
    }

    #[tokio::test]
    async fn resolution_happens_once() {
        let registry = PendingRegistry::<MessageEvent>::new();
        let handle = registry.register(ctx(), source_only(), None);
        let id = handle.id();

        assert!(registry.expire(id));
        assert!(!registry.expire(id));
        assert!(!registry.cancel(id));
        assert_eq!(registry.on_event(&message(1, 1, "late")), None);

        assert!(handle.outcome().await.is_expired());
    }

    #[tokio::test]
    async fn dropping_the_handle_cancels() {
        let registry = PendingRegistry::<MessageEvent>::new();
        let handle = registry.register(ctx(), source_only(), None);
        let id = handle.id();
        assert!(registry.contains(id));

        drop(handle);
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn unbounded_waits_stay_until_cancelled() {
        let registry = PendingRegistry::<MessageEvent>::new();
        let handle = registry.register(ctx(), source_only(), None);
        let id = handle.id();
        assert_eq!(registry.timing(id).map(|(_, deadline)| deadline), Some(None));

        registry.on_event(&message(1, 99, "someone else"));
        assert!(registry.contains(id));

        assert!(registry.cancel(id));
        assert!(handle.outcome().await.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_all_releases_every_waiter() {
        let registry = PendingRegistry::<MessageEvent>::new();
        let first = registry.register(ctx(), source_only(), None);
        let second = registry.register(ctx(), source_only(), None);

        assert_eq!(registry.cancel_all(), 2);
        assert!(registry.is_empty());
        assert!(first.outcome().await.is_cancelled());
        assert!(second.outcome().await.is_cancelled());
    }
}
