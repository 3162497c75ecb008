//! Cooperative timer registry driven by a virtual clock
//!
//! Every "concurrent" activity in the walk-through (upload tickers, the
//! sequencer's progress/phase/step/metric timers, the OTP verifying delay)
//! is a timer registered here. Nothing runs on its own: the owner advances
//! the clock and receives due firings one at a time, in deadline order, and
//! dispatches them to its own transition functions.
//!
//! ```
//! use detecta::timeline::Timeline;
//! use std::time::Duration;
//!
//! let mut timeline = Timeline::new();
//! let tick = timeline.set_interval(Duration::from_millis(200), "tick");
//! timeline.set_timeout(Duration::from_millis(500), "done");
//!
//! let fired: Vec<_> = timeline
//!     .advance(Duration::from_millis(500))
//!     .into_iter()
//!     .map(|f| f.event)
//!     .collect();
//! assert_eq!(fired, vec!["tick", "tick", "done"]);
//!
//! timeline.cancel(tick);
//! assert!(timeline.advance(Duration::from_secs(10)).is_empty());
//! ```

use std::time::Duration;

/// Handle returned when registering a timer, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repeat {
    Once,
    Every(Duration),
}

#[derive(Debug)]
struct Entry<E> {
    id: TimerId,
    deadline: Duration,
    /// Registration order; breaks deadline ties.
    seq: u64,
    repeat: Repeat,
    event: E,
}

/// A timer that came due.
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub id: TimerId,
    /// Virtual time at which the timer fired.
    pub at: Duration,
    pub event: E,
}

/// Single-threaded set of timeouts and intervals over a virtual clock.
#[derive(Debug)]
pub struct Timeline<E> {
    now: Duration,
    next_id: u64,
    next_seq: u64,
    entries: Vec<Entry<E>>,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            next_id: 0,
            next_seq: 0,
            entries: Vec::new(),
        }
    }
}

impl<E: Clone> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fire `event` once, `delay` from now.
    pub fn set_timeout(&mut self, delay: Duration, event: E) -> TimerId {
        self.register(delay, Repeat::Once, event)
    }

    /// Fire `event` every `period`, first at `now + period`.
    ///
    /// A zero period is raised to one millisecond so an interval can never
    /// starve the clock.
    pub fn set_interval(&mut self, period: Duration, event: E) -> TimerId {
        let period = period.max(Duration::from_millis(1));
        self.register(period, Repeat::Every(period), event)
    }

    fn register(&mut self, delay: Duration, repeat: Repeat, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        self.entries.push(Entry {
            id,
            deadline: self.now + delay,
            seq,
            repeat,
            event,
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel a timer. Returns false if it already fired (one-shot) or was
    /// never registered here.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        before != self.entries.len()
    }

    pub fn cancel_all(&mut self) {
        self.entries.clear();
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.iter().map(|e| e.deadline).min()
    }

    /// Pop the next firing whose deadline is at or before `until`, moving
    /// the clock to its deadline. Intervals are re-armed before returning,
    /// so a caller that cancels from its handler stops the very next firing.
    pub fn pop_due(&mut self, until: Duration) -> Option<Fired<E>> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= until)
            .min_by_key(|(_, e)| (e.deadline, e.seq))
            .map(|(i, _)| i)?;

        let deadline = self.entries[index].deadline;
        if deadline > self.now {
            self.now = deadline;
        }

        match self.entries[index].repeat {
            Repeat::Once => {
                let entry = self.entries.swap_remove(index);
                Some(Fired {
                    id: entry.id,
                    at: deadline,
                    event: entry.event,
                })
            }
            Repeat::Every(period) => {
                let seq = self.bump_seq();
                let entry = &mut self.entries[index];
                entry.deadline += period;
                entry.seq = seq;
                Some(Fired {
                    id: entry.id,
                    at: deadline,
                    event: entry.event.clone(),
                })
            }
        }
    }

    /// Move the clock to `until` once all firings up to it were drained.
    pub fn settle(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }

    /// Advance by `dt` and collect every firing. Handlers that need to cancel
    /// timers mid-advance should drive `pop_due` themselves instead.
    pub fn advance(&mut self, dt: Duration) -> Vec<Fired<E>> {
        let target = self.now + dt;
        let mut fired = Vec::new();
        while let Some(f) = self.pop_due(target) {
            fired.push(f);
        }
        self.settle(target);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    // ==========================================================================
    // ORDERING
    // ==========================================================================

    #[test]
    fn test_timeout_fires_once() {
        let mut t = Timeline::new();
        t.set_timeout(ms(100), 1);
        assert!(t.advance(ms(99)).is_empty());
        let fired = t.advance(ms(1));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at, ms(100));
        assert!(t.advance(ms(1000)).is_empty());
        assert!(t.is_idle());
    }

    #[test]
    fn test_interval_rearms() {
        let mut t = Timeline::new();
        t.set_interval(ms(200), ());
        let fired = t.advance(ms(1000));
        let times: Vec<_> = fired.iter().map(|f| f.at).collect();
        assert_eq!(times, vec![ms(200), ms(400), ms(600), ms(800), ms(1000)]);
        assert_eq!(t.pending(), 1);
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let mut t = Timeline::new();
        t.set_timeout(ms(50), "a");
        t.set_timeout(ms(50), "b");
        t.set_timeout(ms(10), "c");
        let order: Vec<_> = t.advance(ms(50)).into_iter().map(|f| f.event).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_clock_lands_on_target() {
        let mut t: Timeline<()> = Timeline::new();
        t.advance(ms(123));
        assert_eq!(t.now(), ms(123));
        t.set_timeout(ms(10), ());
        assert_eq!(t.next_deadline(), Some(ms(133)));
    }

    // ==========================================================================
    // CANCELLATION
    // ==========================================================================

    #[test]
    fn test_cancel_stops_interval() {
        let mut t = Timeline::new();
        let id = t.set_interval(ms(100), ());
        assert_eq!(t.advance(ms(250)).len(), 2);
        assert!(t.cancel(id));
        assert!(!t.cancel(id));
        assert!(t.advance(ms(1000)).is_empty());
    }

    #[test]
    fn test_cancel_from_handler_takes_effect_immediately() {
        let mut t = Timeline::new();
        let id = t.set_interval(ms(100), ());
        let mut count = 0;
        while let Some(f) = t.pop_due(ms(1000)) {
            count += 1;
            if count == 3 {
                t.cancel(f.id);
            }
        }
        t.settle(ms(1000));
        assert_eq!(count, 3);
        assert!(!t.cancel(id));
        assert_eq!(t.now(), ms(1000));
    }

    #[test]
    fn test_cancel_all() {
        let mut t = Timeline::new();
        t.set_interval(ms(10), ());
        t.set_timeout(ms(10), ());
        t.cancel_all();
        assert!(t.advance(ms(100)).is_empty());
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut t = Timeline::new();
        t.set_interval(Duration::ZERO, ());
        assert_eq!(t.advance(ms(5)).len(), 5);
    }
}
