//! Timeout scheduler.
//!
//! One background task owns every deadline in the engine: pending waits,
//! callback sets (and therefore paginators) and delayed message deletions.
//! Deadlines are kept in a min-heap; the task sleeps until the earliest one
//! or until a new entry arrives, whichever comes first.
//!
//! The scheduler never owns the targets it expires. It hands each due key to
//! an [`ExpirySink`], which routes it to the owning registry. A key whose
//! target is already gone (matched, cancelled, detached, replaced) is simply
//! discarded.

use crate::{callbacks::Generation, pending::WaitId};
use std::{cmp::Reverse, collections::BinaryHeap, future};
use tether_core::{MessageId, SchedulerError};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, trace};

/// What a scheduled deadline refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeoutKey {
    /// A wait for the next message.
    MessageWait(WaitId),
    /// A wait for the next reaction.
    ReactionWait(WaitId),
    /// A callback set attached to a message.
    Callbacks {
        /// The message the set is attached to.
        message: MessageId,
        /// The generation of the set that was scheduled.
        generation: Generation,
    },
    /// A message to delete once its display time is over.
    DeleteMessage(MessageId),
}

/// Receives due keys from the scheduler.
pub trait ExpirySink: Send + Sync + 'static {
    /// Expire the target of `key`. Returns `false` when the target no longer
    /// exists, in which case the key was stale.
    fn expire(&self, key: TimeoutKey) -> bool;
}

impl<F> ExpirySink for F
where
    F: Fn(TimeoutKey) -> bool + Send + Sync + 'static,
{
    fn expire(&self, key: TimeoutKey) -> bool {
        (self)(key)
    }
}

#[derive(Debug)]
enum Command {
    Schedule { deadline: Instant, key: TimeoutKey },
    Shutdown,
}

/// Handle to the scheduler task.
///
/// Cheap to clone; every clone feeds the same task.
#[derive(Debug, Clone)]
pub struct TimeoutScheduler {
    commands: mpsc::UnboundedSender<Command>,
}

impl TimeoutScheduler {
    /// Spawn the scheduler task on the current tokio runtime.
    pub fn spawn<S: ExpirySink>(sink: S) -> (Self, JoinHandle<()>) {
        let (commands, receiver) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(receiver, sink));
        (Self { commands }, task)
    }

    /// Expire `key` at `deadline`. A deadline in the past fires on the next
    /// turn of the scheduler loop.
    pub fn schedule(&self, deadline: Instant, key: TimeoutKey) -> Result<(), SchedulerError> {
        self.commands
            .send(Command::Schedule { deadline, key })
            .map_err(|_| SchedulerError::Shutdown)
    }

    /// Stop the scheduler task. Entries still in the heap are dropped without
    /// being expired.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }

    /// Whether the scheduler task is still accepting entries.
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

async fn run<S: ExpirySink>(mut commands: mpsc::UnboundedReceiver<Command>, sink: S) {
    let mut heap: BinaryHeap<Reverse<(Instant, u64, TimeoutKey)>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    loop {
        let next = heap.peek().map(|Reverse((deadline, _, _))| *deadline);
        let wake = async move {
            match next {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;

            command = commands.recv() => match command {
                Some(Command::Schedule { deadline, key }) => {
                    trace!(?key, ?deadline, "deadline scheduled");
                    heap.push(Reverse((deadline, seq, key)));
                    seq = seq.wrapping_add(1);
                }
                Some(Command::Shutdown) | None => break,
            },
            () = wake => {
                let now = Instant::now();
                while let Some(Reverse((deadline, _, _))) = heap.peek() {
                    if *deadline > now {
                        break;
                    }
                    let Some(Reverse((_, _, key))) = heap.pop() else {
                        break;
                    };
                    if sink.expire(key) {
                        debug!(?key, "deadline elapsed");
                    } else {
                        trace!(?key, "stale deadline discarded");
                    }
                }
            }
        }
    }

    debug!(pending = heap.len(), "timeout scheduler stopped");
    commands.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    #[derive(Clone, Default)]
    struct RecordingSink {
        fired: Arc<Mutex<Vec<(TimeoutKey, Instant)>>>,
        live: Arc<Mutex<Vec<TimeoutKey>>>,
    }

    impl ExpirySink for RecordingSink {
        fn expire(&self, key: TimeoutKey) -> bool {
            let mut live = self.live.lock().unwrap();
            let Some(pos) = live.iter().position(|k| *k == key) else {
                return false;
            };
            live.remove(pos);
            self.fired.lock().unwrap().push((key, Instant::now()));
            true
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_in_deadline_order() {
        let sink = RecordingSink::default();
        let late = TimeoutKey::DeleteMessage(MessageId(1));
        let early = TimeoutKey::DeleteMessage(MessageId(2));
        sink.live.lock().unwrap().extend([late, early]);

        let (scheduler, _task) = TimeoutScheduler::spawn(sink.clone());
        let start = Instant::now();
        scheduler
            .schedule(start + Duration::from_secs(5), late)
            .unwrap();
        scheduler
            .schedule(start + Duration::from_secs(2), early)
            .unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;

        let fired = sink.fired.lock().unwrap().clone();
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].0, early);
        assert_eq!(fired[0].1 - start, Duration::from_secs(2));
        assert_eq!(fired[1].0, late);
        assert_eq!(fired[1].1 - start, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_keys_are_discarded() {
        let sink = RecordingSink::default();
        let (scheduler, _task) = TimeoutScheduler::spawn(sink.clone());

        scheduler
            .schedule(
                Instant::now() + Duration::from_secs(1),
                TimeoutKey::DeleteMessage(MessageId(9)),
            )
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(sink.fired.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_rejects_new_entries() {
        let (scheduler, task) = TimeoutScheduler::spawn(|_key: TimeoutKey| true);
        assert!(scheduler.is_running());

        scheduler.shutdown();
        task.await.unwrap();

        assert!(!scheduler.is_running());
        assert_eq!(
            scheduler.schedule(Instant::now(), TimeoutKey::DeleteMessage(MessageId(1))),
            Err(SchedulerError::Shutdown)
        );
    }
}
