//! Delayed-task queue for the control-rate loop.
//!
//! The loop calls [`Scheduler::advance`] with the time since its last tick;
//! every task whose delay has elapsed runs, in due order, on the caller's
//! thread. Tasks can be cancelled through the [`TimerToken`] returned when
//! they were scheduled.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

/// Cancellation handle for a scheduled task.
#[derive(Clone, Debug, Default)]
pub struct TimerToken {
    cancelled: Arc<AtomicBool>,
}

impl TimerToken {
    fn new() -> Self {
        Self::default()
    }

    /// Prevents the task from running. Has no effect once it has run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

type Task = Box<dyn FnOnce() + Send>;

struct Entry {
    due: Duration,
    seq: u64,
    token: TimerToken,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest due task first; ties keep
    // scheduling order.
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Entry>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `task` to run once `delay` has elapsed.
    pub fn schedule<F>(&mut self, delay: Duration, task: F) -> TimerToken
    where
        F: FnOnce() + Send + 'static,
    {
        let token = TimerToken::new();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            due: self.now.saturating_add(delay),
            seq,
            token: token.clone(),
            task: Box::new(task),
        });
        token
    }

    /// Moves the clock forward by `dt` and runs every due task that was not
    /// cancelled. Returns how many tasks ran.
    pub fn advance(&mut self, dt: Duration) -> usize {
        self.now = self.now.saturating_add(dt);
        let mut ran = 0;
        while self.queue.peek().is_some_and(|entry| entry.due <= self.now) {
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if entry.token.is_cancelled() {
                trace!(seq = entry.seq, "skipping cancelled task");
                continue;
            }
            (entry.task)();
            ran += 1;
        }
        ran
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Tasks still queued, cancelled ones included until their due time passes.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.iter().all(|entry| entry.token.is_cancelled())
    }
}
