//! Frame clock: turns host timestamps into fixed-interval ticks.

use std::fmt;
use std::rc::Rc;

use crate::scene::events::ListenerId;
use crate::scene::object_list::LockedList;

/// One tick of a [`Ticker`]. Times are in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
    /// Host time of this tick.
    pub time: f64,
    /// Time since the previous tick.
    pub delta: f64,
    pub paused: bool,
    /// Time since the first tick, excluding paused time.
    pub run_time: f64,
    /// 1-based tick counter.
    pub tick: u64,
}

pub type TickCallback = dyn Fn(&mut Ticker, &TickEvent);

#[derive(Clone)]
struct TickEntry {
    id: ListenerId,
    callback: Rc<TickCallback>,
}

/// Emits at most one tick per interval and notifies its listeners.
///
/// The host calls [`Ticker::advance`] as often as it likes (typically once per display
/// refresh); calls that come earlier than one interval after the previous tick are ignored.
/// Listeners added or removed from inside a callback take effect from the next tick.
pub struct Ticker {
    interval: f64,
    start: Option<f64>,
    last: Option<f64>,
    paused: bool,
    paused_since: Option<f64>,
    paused_total: f64,
    ticks: u64,
    listeners: LockedList<TickEntry>,
    next_listener: u64,
}

impl Ticker {
    pub fn new(fps: f64) -> Self {
        Self {
            interval: interval_for(fps),
            start: None,
            last: None,
            paused: false,
            paused_since: None,
            paused_total: 0.0,
            ticks: 0,
            listeners: LockedList::new(),
            next_listener: 0,
        }
    }

    /// Milliseconds between ticks.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn fps(&self) -> f64 {
        1000.0 / self.interval
    }

    pub fn set_fps(&mut self, fps: f64) {
        self.interval = interval_for(fps);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause or resume at host time `now`. Ticks keep coming while paused, flagged as such,
    /// and paused time is excluded from `run_time`.
    pub fn set_paused(&mut self, paused: bool, now: f64) {
        match (self.paused, paused) {
            (false, true) => self.paused_since = Some(now),
            (true, false) => {
                if let Some(since) = self.paused_since.take() {
                    self.paused_total += (now - since).max(0.0);
                }
            }
            _ => {}
        }
        self.paused = paused;
    }

    /// Unpaused time since the first tick.
    pub fn run_time(&self, now: f64) -> f64 {
        let Some(start) = self.start else {
            return 0.0;
        };
        let pausing = self.paused_since.map_or(0.0, |since| (now - since).max(0.0));
        (now - start - self.paused_total - pausing).max(0.0)
    }

    pub fn add_listener(&mut self, callback: impl Fn(&mut Ticker, &TickEvent) + 'static) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.push(TickEntry {
            id,
            callback: Rc::new(callback),
        });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|e| e.id == id) {
            Some(index) => self.listeners.remove(index).is_some(),
            None => false,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Tick if at least one interval passed since the previous tick.
    pub fn advance(&mut self, now: f64) -> Option<TickEvent> {
        self.start.get_or_insert(now);
        let delta = match self.last {
            None => self.interval,
            Some(last) if now - last + TOLERANCE_MS < self.interval => return None,
            Some(last) => now - last,
        };
        self.last = Some(now);
        self.ticks += 1;
        let event = TickEvent {
            time: now,
            delta,
            paused: self.paused,
            run_time: self.run_time(now),
            tick: self.ticks,
        };

        self.listeners.lock();
        let entries = self.listeners.snapshot().to_vec();
        for entry in entries {
            (*entry.callback)(self, &event);
        }
        self.listeners.unlock();
        Some(event)
    }

    /// Forget timing state and listeners.
    pub fn reset(&mut self) {
        *self = Self::new(self.fps());
    }
}

/// Hosts rarely call back exactly on the interval.
const TOLERANCE_MS: f64 = 1.0;

fn interval_for(fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        1000.0 / fps
    } else {
        1000.0 / 24.0
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticker")
            .field("interval", &self.interval)
            .field("paused", &self.paused)
            .field("ticks", &self.ticks)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ticker.rs"]
mod tests;
