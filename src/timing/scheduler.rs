//! Cancellable delayed callbacks over a virtual clock.
//!
//! The scheduler never sleeps. Its owner moves time forward and pops due
//! entries one at a time, so every callback runs strictly after the previous
//! one and in deadline order.
//!
//! ## Ordering
//!
//! Entries fire by `(due, rank, scheduling order)`. Lower rank wins ties,
//! which lets recurring background work (the countdown) yield to one-shot
//! callbacks due at the same instant.
//!
//! ## Invalidation
//!
//! `cancel_all` starts a new generation and drops every pending entry. Each
//! entry is stamped with the generation it was scheduled in and `pop_due`
//! only returns entries of the current generation.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

/// Handle to a scheduled entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl TimerId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Something that can be scheduled.
pub trait TimerTask {
    /// Tie-break among entries due at the same instant; lower fires first.
    fn rank(&self) -> u8 {
        0
    }
}

/// An entry that came due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub due: Duration,
    pub generation: u64,
    pub task: T,
}

#[derive(Debug)]
struct Entry<T> {
    due: Duration,
    rank: u8,
    id: u64,
    generation: u64,
    task: T,
}

impl<T> Entry<T> {
    fn key(&self) -> (Duration, u8, u64) {
        (self.due, self.rank, self.id)
    }
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-heap of delayed tasks keyed on a virtual clock.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Duration,
    next_id: u64,
    generation: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            generation: 0,
            queue: BinaryHeap::new(),
        }
    }
}

impl<T: TimerTask> Scheduler<T> {
    /// Create an empty scheduler at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of live entries.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether an entry is still waiting to fire in the current generation.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue
            .iter()
            .any(|Reverse(entry)| entry.id == id.0 && entry.generation == self.generation)
    }

    /// Run `task` once `delay` has elapsed from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;

        self.queue.push(Reverse(Entry {
            due: self.now + delay,
            rank: task.rank(),
            id,
            generation: self.generation,
            task,
        }));

        TimerId(id)
    }

    /// Drop every entry and start a new generation.
    pub fn cancel_all(&mut self) -> u64 {
        self.queue.clear();
        self.generation += 1;
        self.generation
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the next entry due at or before `until`, moving the clock to its
    /// deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<T>> {
        loop {
            let due = self.next_deadline()?;
            if due > until {
                return None;
            }

            let Reverse(entry) = self.queue.pop()?;
            self.now = self.now.max(entry.due);

            if entry.generation == self.generation {
                return Some(Fired {
                    id: TimerId(entry.id),
                    due: entry.due,
                    generation: entry.generation,
                    task: entry.task,
                });
            }
        }
    }

    /// Move the clock forward without firing anything.
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Task {
        Once(u8),
        Background,
    }

    impl TimerTask for Task {
        fn rank(&self) -> u8 {
            match self {
                Task::Once(_) => 0,
                Task::Background => 1,
            }
        }
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn drain(scheduler: &mut Scheduler<Task>, until: Duration) -> Vec<Task> {
        std::iter::from_fn(|| scheduler.pop_due(until).map(|fired| fired.task)).collect()
    }

    #[test]
    fn test_fires_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(300), Task::Once(3));
        scheduler.schedule(ms(100), Task::Once(1));
        scheduler.schedule(ms(200), Task::Once(2));

        assert_eq!(scheduler.next_deadline(), Some(ms(100)));
        assert_eq!(drain(&mut scheduler, ms(250)), vec![Task::Once(1), Task::Once(2)]);
        assert_eq!(scheduler.now(), ms(200));
        assert_eq!(drain(&mut scheduler, ms(1000)), vec![Task::Once(3)]);
    }

    #[test]
    fn test_rank_breaks_ties() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(500), Task::Background);
        scheduler.schedule(ms(500), Task::Once(1));
        scheduler.schedule(ms(500), Task::Once(2));

        assert_eq!(
            drain(&mut scheduler, ms(500)),
            vec![Task::Once(1), Task::Once(2), Task::Background]
        );
    }

    #[test]
    fn test_schedule_relative_to_clock() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_clock(ms(1000));
        scheduler.schedule(ms(500), Task::Once(1));

        assert!(scheduler.pop_due(ms(1499)).is_none());
        let fired = scheduler.pop_due(ms(1500)).unwrap();
        assert_eq!(fired.due, ms(1500));

        // Clock never moves backwards
        scheduler.advance_clock(ms(10));
        assert_eq!(scheduler.now(), ms(1500));
    }

    #[test]
    fn test_is_pending() {
        let mut scheduler = Scheduler::new();
        let early = scheduler.schedule(ms(100), Task::Once(1));
        let late = scheduler.schedule(ms(200), Task::Once(2));
        assert!(scheduler.is_pending(early));
        assert!(scheduler.is_pending(late));

        assert_eq!(drain(&mut scheduler, ms(100)), vec![Task::Once(1)]);
        assert!(!scheduler.is_pending(early));
        assert!(scheduler.is_pending(late));

        scheduler.cancel_all();
        assert!(!scheduler.is_pending(late));
    }

    #[test]
    fn test_cancel_all_starts_new_generation() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(ms(100), Task::Once(1));
        scheduler.schedule(ms(200), Task::Background);

        let generation = scheduler.cancel_all();
        assert_eq!(generation, 1);
        assert_eq!(scheduler.pending(), 0);
        assert!(drain(&mut scheduler, ms(10_000)).is_empty());

        scheduler.schedule(ms(100), Task::Once(7));
        let fired = scheduler.pop_due(ms(10_000)).unwrap();
        assert_eq!(fired.generation, 1);
        assert_eq!(fired.task, Task::Once(7));
    }
}
