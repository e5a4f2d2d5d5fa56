//! Frame pacing primitives
//!
//! - `Clock`: sampled once per loop iteration, produces `now` and `dt`
//! - `Timer`: countdown polled against a shared `Clock`
//! - `TimeSource`: where the clock reads time from (wall clock or manual)
//!
//! Timers never hold on to the clock. Every query takes `&Clock`, so any
//! number of timers can read the same `now`/`dt` for the current tick.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Source of "current time" in seconds
pub trait TimeSource {
    fn now(&self) -> f64;
}

/// Wall clock backed by `Instant` (seconds since creation)
#[derive(Debug, Clone, Copy)]
pub struct SystemTime {
    epoch: Instant,
}

impl SystemTime {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTime {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// Manually advanced time, shared between the clock and whoever drives it.
///
/// Cloning yields a handle to the same underlying time value.
#[derive(Debug, Clone, Default)]
pub struct ManualTime {
    now: Rc<Cell<f64>>,
}

impl ManualTime {
    pub fn new(start: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move time forward by `seconds` (negative values are ignored)
    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds.max(0.0));
    }

    pub fn advance_ms(&self, millis: u64) {
        self.advance(millis as f64 / 1000.0);
    }

    pub fn set(&self, seconds: f64) {
        self.now.set(seconds);
    }
}

impl TimeSource for ManualTime {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Loop clock: one sample per iteration
pub struct Clock {
    source: Box<dyn TimeSource>,
    /// Time of the last `update` (seconds)
    pub now: f64,
    /// Seconds elapsed between the last two updates (never negative)
    pub dt: f64,
    mark: f64,
}

impl Clock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        let now = source.now();
        Self {
            source,
            now,
            dt: 0.0,
            mark: now,
        }
    }

    /// Clock reading the wall clock
    pub fn system() -> Self {
        Self::new(Box::new(SystemTime::new()))
    }

    /// Clock driven by a `ManualTime` handle
    pub fn manual(time: &ManualTime) -> Self {
        Self::new(Box::new(time.clone()))
    }

    /// Sample the time source. Call exactly once at the top of every loop
    /// iteration, before any timer is polled.
    pub fn update(&mut self) {
        // A source that steps backwards must not make `now` decrease
        let sampled = self.source.now().max(self.mark);
        self.now = sampled;
        self.dt = sampled - self.mark;
        self.mark = sampled;
    }

    /// Milliseconds to sleep so the current iteration lasts `1 / target_fps`
    pub fn leftover(&self, target_fps: u32) -> u64 {
        if target_fps == 0 {
            return 0;
        }
        let frame = 1.0 / target_fps as f64;
        let spent = self.source.now() - self.mark;
        let millis = (1000.0 * (frame - spent)).round();
        if millis > 0.0 { millis as u64 } else { 0 }
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field("now", &self.now)
            .field("dt", &self.dt)
            .field("mark", &self.mark)
            .finish()
    }
}

/// Countdown that fires once per period
#[derive(Debug, Clone)]
pub struct Timer {
    period: f64,
    mark: f64,
    periodic: bool,
    running: bool,
}

impl Timer {
    /// Running periodic timer anchored at `clock.now`
    pub fn periodic(clock: &Clock, period_ms: f64) -> Self {
        Self {
            period: period_ms / 1000.0,
            mark: clock.now,
            periodic: true,
            running: true,
        }
    }

    /// Stopped one-shot timer; call `start` to arm it
    pub fn one_shot(clock: &Clock, period_ms: f64) -> Self {
        Self {
            period: period_ms / 1000.0,
            mark: clock.now,
            periodic: false,
            running: false,
        }
    }

    /// Stopped periodic timer; call `start` to arm it
    pub fn stopped(clock: &Clock, period_ms: f64) -> Self {
        Self {
            running: false,
            ..Self::periodic(clock, period_ms)
        }
    }

    /// Returns true if the timer expired (at most once per call).
    ///
    /// A periodic timer re-arms by exactly one period, so a timer that
    /// missed several periods during a slow frame catches up one fire per
    /// poll without drifting.
    pub fn poll(&mut self, clock: &Clock) -> bool {
        if self.expired(clock) {
            if self.periodic {
                self.mark += self.period;
            } else {
                self.running = false;
            }
            true
        } else {
            false
        }
    }

    /// Whether `poll` would fire right now, without re-arming
    pub fn expired(&self, clock: &Clock) -> bool {
        self.running && clock.now - self.period >= self.mark
    }

    pub fn start(&mut self, clock: &Clock) {
        self.mark = clock.now;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Skip the time that passed during the current tick
    pub fn freeze(&mut self, clock: &Clock) {
        self.mark += clock.dt;
    }

    /// Change the period, keeping the current anchor
    pub fn set(&mut self, period_ms: f64) {
        self.period = period_ms / 1000.0;
    }

    /// Remaining seconds until the next fire, or 0 if stopped
    pub fn countdown(&self, clock: &Clock) -> f64 {
        if !self.running {
            return 0.0;
        }
        (self.mark + self.period - clock.now).max(0.0)
    }

    /// Remaining share of the period in [0, 1]
    pub fn fraction(&self, clock: &Clock) -> f64 {
        if self.period <= 0.0 {
            return 0.0;
        }
        (self.countdown(clock) / self.period).clamp(0.0, 1.0)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Period in seconds
    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn mark(&self) -> f64 {
        self.mark
    }
}
