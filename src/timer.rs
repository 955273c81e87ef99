//! Cooperative timers driven by the event loop.
//!
//! Nothing here runs on its own: the loop asks for [`Timers::time_until_next`]
//! to bound its wait and then pops due tasks with [`Timers::pop_due`].

use std::time::{Duration, Instant};

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<T> {
    deadline: Instant,
    period: Option<Duration>,
    task: T,
}

#[derive(Debug)]
pub struct Timers<T> {
    next_handle: u64,
    entries: IndexMap<TimerHandle, Entry<T>>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            entries: IndexMap::new(),
        }
    }
}

impl<T: Clone> Timers<T> {
    fn insert(&mut self, deadline: Instant, period: Option<Duration>, task: T) -> TimerHandle {
        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.entries.insert(
            handle,
            Entry {
                deadline,
                period,
                task,
            },
        );
        handle
    }

    /// Fire `task` after `first`, then every `period` until cancelled.
    pub fn schedule_periodic(
        &mut self,
        now: Instant,
        first: Duration,
        period: Duration,
        task: T,
    ) -> TimerHandle {
        self.insert(now + first, Some(period), task)
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.shift_remove(&handle).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|entry| entry.deadline).min()
    }

    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Take the earliest task due at `now`.
    ///
    /// Periodic tasks stay scheduled under the same handle, `period` after
    /// `now`. Popping one task at a time means a task cancelled while handling
    /// an earlier one is never returned.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TimerHandle, T)> {
        let (&handle, _) = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.deadline <= now)
            .min_by_key(|(_, entry)| entry.deadline)?;

        let entry = self.entries.get_mut(&handle)?;
        match entry.period {
            Some(period) => {
                entry.deadline = now + period;
                Some((handle, entry.task.clone()))
            }
            None => self
                .entries
                .shift_remove(&handle)
                .map(|entry| (handle, entry.task)),
        }
    }
}
