//! Virtual-time timer queue.
//!
//! The scheduler never reads the wall clock. Time only moves when the owner
//! pops due entries, so tests advance it deterministically and the runtime
//! maps `tokio::time` onto it.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Handle to a scheduled entry, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId {
    deadline: Duration,
    seq: u64,
}

impl TimerId {
    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

pub struct Scheduler<T> {
    epoch: DateTime<Utc>,
    now: Duration,
    next_seq: u64,
    // Keyed by (deadline, seq): equal deadlines fire in scheduling order.
    queue: BTreeMap<TimerId, T>,
}

impl<T> Scheduler<T> {
    /// `epoch` is the wall-clock instant that virtual time zero maps to.
    pub fn new(epoch: DateTime<Utc>) -> Self {
        Self {
            epoch,
            now: Duration::ZERO,
            next_seq: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Virtual time elapsed since the epoch.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn wall_time(&self) -> DateTime<Utc> {
        // Out-of-range durations are beyond any realistic session length.
        let offset = chrono::Duration::from_std(self.now).unwrap_or(chrono::Duration::MAX);
        self.epoch
            .checked_add_signed(offset)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = TimerId {
            deadline: self.now.saturating_add(delay),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.queue.insert(id, task);
        id
    }

    /// Removes a pending entry. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.queue.remove(&id)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(TimerId::deadline)
    }

    /// Pops the earliest entry due at or before `until` and moves the clock to
    /// its deadline. Returns `None` once nothing more is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, T)> {
        let first = *self.queue.keys().next()?;
        if first.deadline > until {
            return None;
        }
        let task = self.queue.remove(&first)?;
        self.now = self.now.max(first.deadline);
        Some((first, task))
    }

    /// Moves the clock forward without firing anything. Never moves it back.
    pub fn settle_at(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}
