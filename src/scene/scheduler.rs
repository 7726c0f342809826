//! Clock and deadline queue that drive veil sequences.
//!
//! Nothing here blocks or spawns. Completion events are queued with a
//! deadline and handed back by [`Scheduler::pop_due`] when the owner ticks,
//! always on the thread that owns the orchestrator.

use std::cell::Cell;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::transition::VeilEvent;

/// Monotonic time source, measured from an arbitrary epoch.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock time since the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Convert a clock reading back into an `Instant` (for event-loop deadlines).
    pub fn instant_at(&self, at: Duration) -> Instant {
        self.start + at
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Hand-driven clock. Clones share the same reading.
#[derive(Clone, Debug, Default)]
pub struct ManualClock(Rc<Cell<Duration>>);

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.0.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}

/// Identifies one animated transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitionId(pub(crate) u64);

impl std::fmt::Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A queued completion notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub transition: TransitionId,
    pub event: VeilEvent,
}

#[derive(Debug, PartialEq, Eq)]
struct Timer {
    deadline: Duration,
    seq: u64,
    task: Task,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deadline queue. Tasks with equal deadlines fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Timer>>,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, deadline: Duration, task: Task) {
        self.seq += 1;
        self.queue.push(Reverse(Timer {
            deadline,
            seq: self.seq,
            task,
        }));
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(timer)| timer.deadline)
    }

    /// Remove and return the earliest task whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        match self.queue.peek() {
            Some(Reverse(timer)) if timer.deadline <= now => {
                self.queue.pop().map(|Reverse(timer)| timer.task)
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
