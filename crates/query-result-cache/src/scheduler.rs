//! Deadline-ordered background removal.

use crate::entry::CacheEntry;
use crate::key::CacheKey;
use crate::store::{WeightedStore, Weigher};
use parking_lot::{Condvar, Mutex};
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};
use tracing::{debug, info};

struct PendingRemoval {
    deadline: Instant,
    key: CacheKey,
}

// Ordering considers deadlines only; equal deadlines fire in unspecified
// order.
impl PartialEq for PendingRemoval {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}

impl Eq for PendingRemoval {}

impl PartialOrd for PendingRemoval {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingRemoval {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.deadline.cmp(&other.deadline)
    }
}

struct SchedulerState {
    queue: BinaryHeap<Reverse<PendingRemoval>>,
    running: bool,
}

/// Priority queue of (deadline, key) pairs drained by one worker thread.
///
/// The worker sleeps until the earliest deadline; inserting a new minimum
/// or stopping the scheduler wakes it early. Removals execute with the
/// scheduler lock released so the store lock is never taken under it.
pub struct RemovalScheduler {
    state: Mutex<SchedulerState>,
    wakeup: Condvar,
}

impl RemovalScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                queue: BinaryHeap::new(),
                running: true,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Queue `key` for removal `delay` from now.
    ///
    /// Duplicates for the same key are allowed; each fires independently
    /// against an idempotent remove. After `stop` this is a no-op.
    pub fn schedule_removal(&self, delay: Duration, key: CacheKey) {
        let deadline = Instant::now() + delay;
        let mut state = self.state.lock();
        if !state.running {
            return;
        }

        let preempts = state
            .queue
            .peek()
            .map_or(true, |head| deadline < head.0.deadline);

        debug!(
            key = key.fingerprint(),
            delay_ms = delay.as_millis() as u64,
            "scheduled cache entry removal"
        );
        state.queue.push(Reverse(PendingRemoval { deadline, key }));

        if preempts {
            self.wakeup.notify_one();
        }
    }

    /// Worker loop; runs until `stop` is called. Pending deadlines at stop
    /// time are discarded.
    pub fn run<W>(&self, store: &WeightedStore<CacheKey, CacheEntry, W>)
    where
        W: Weigher<CacheEntry>,
    {
        info!("cache removal worker started");
        loop {
            let due = {
                let mut state = self.state.lock();
                loop {
                    if !state.running {
                        info!("cache removal worker stopped");
                        return;
                    }
                    // Re-check the head on every wake: a new minimum may
                    // have been inserted, or the wake may be spurious.
                    let deadline = match state.queue.peek() {
                        None => {
                            self.wakeup.wait(&mut state);
                            continue;
                        }
                        Some(Reverse(head)) => head.deadline,
                    };
                    if deadline <= Instant::now() {
                        match state.queue.pop() {
                            Some(Reverse(pending)) => break pending,
                            None => continue,
                        }
                    }
                    let _ = self.wakeup.wait_until(&mut state, deadline);
                }
            };

            // The scheduler lock is released here; taking the store lock
            // under it would invert against schedule_removal callers.
            debug!(key = due.key.fingerprint(), "removing expired cache entry");
            store.remove(&due.key);
        }
    }

    /// Terminal transition: unblocks the worker and rejects later
    /// schedule_removal calls. The owner joins the worker thread.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        state.running = false;
        self.wakeup.notify_all();
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }
}

impl Default for RemovalScheduler {
    fn default() -> Self {
        Self::new()
    }
}
