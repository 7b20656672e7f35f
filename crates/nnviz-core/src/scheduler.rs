//! Frame-polled timing: one repeating tick source for the active mode plus a
//! set of one-shot deferred events. Both are cancelled together when a mode
//! stops.

use std::time::Duration;

/// Upper bound on ticks delivered by a single poll after a long stall.
const MAX_CATCH_UP_TICKS: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TickSource {
    interval: Duration,
    next_due: Duration,
}

/// A one-shot event tagged with the topology generation it was scheduled for.
#[derive(Clone, Debug, PartialEq)]
pub struct Deferred<E> {
    pub due: Duration,
    pub generation: u64,
    pub event: E,
}

#[derive(Debug)]
pub struct Scheduler<E> {
    tick: Option<TickSource>,
    pending: Vec<Deferred<E>>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            tick: None,
            pending: Vec::new(),
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a repeating tick; the first one fires one interval from `now`.
    pub fn start_ticks(&mut self, now: Duration, interval: Duration) {
        let interval = interval.max(Duration::from_millis(1));
        self.tick = Some(TickSource {
            interval,
            next_due: now + interval,
        });
    }

    pub fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    /// Number of ticks that came due up to `now`.
    pub fn due_ticks(&mut self, now: Duration) -> u32 {
        let Some(tick) = &mut self.tick else {
            return 0;
        };
        let mut count = 0;
        while tick.next_due <= now && count < MAX_CATCH_UP_TICKS {
            tick.next_due += tick.interval;
            count += 1;
        }
        if tick.next_due <= now {
            // Stalled for a long time: realign instead of bursting.
            tick.next_due = now + tick.interval;
        }
        count
    }

    pub fn schedule(&mut self, due: Duration, generation: u64, event: E) {
        self.pending.push(Deferred {
            due,
            generation,
            event,
        });
    }

    /// Remove and return every event due at `now`, earliest first.
    pub fn drain_due(&mut self, now: Duration) -> Vec<Deferred<E>> {
        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|d| d.due <= now);
        self.pending = waiting;
        due.sort_by_key(|d| d.due);
        due
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Stop the tick source and drop every deferred event.
    pub fn cancel_all(&mut self) {
        self.tick = None;
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn ticks_fire_on_interval() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.start_ticks(ms(0), ms(100));
        assert_eq!(s.due_ticks(ms(50)), 0);
        assert_eq!(s.due_ticks(ms(100)), 1);
        assert_eq!(s.due_ticks(ms(150)), 0);
        assert_eq!(s.due_ticks(ms(320)), 2);
    }

    #[test]
    fn long_stall_is_capped_and_realigned() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.start_ticks(ms(0), ms(20));
        assert_eq!(s.due_ticks(ms(10_000)), MAX_CATCH_UP_TICKS);
        assert_eq!(s.due_ticks(ms(10_010)), 0);
        assert_eq!(s.due_ticks(ms(10_020)), 1);
    }

    #[test]
    fn deferred_events_drain_in_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(300), 1, "late");
        s.schedule(ms(100), 1, "early");
        s.schedule(ms(900), 1, "future");
        let due: Vec<_> = s.drain_due(ms(400)).into_iter().map(|d| d.event).collect();
        assert_eq!(due, vec!["early", "late"]);
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn cancel_all_clears_ticks_and_events() {
        let mut s = Scheduler::new();
        s.start_ticks(ms(0), ms(10));
        s.schedule(ms(5), 1, ());
        s.cancel_all();
        assert!(!s.is_ticking());
        assert_eq!(s.pending(), 0);
        assert_eq!(s.due_ticks(ms(1000)), 0);
    }
}
