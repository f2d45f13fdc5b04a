//! Discrete time.
//!
//! A [`Tick`] is one synchronous step of the whole grid: every light and
//! every segment queue changes at most once per tick.  Each simulation owns
//! its own [`SimClock`]; nothing here is global, so several runs can share a
//! process.  Wall-clock seconds only appear in reports.

use std::fmt;
use std::ops::{Add, Sub};

// ── Tick ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    #[inline]
    pub fn next(self) -> Tick {
        self + 1
    }

    /// `self - earlier`, or 0 if `earlier` is later.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u64> for Tick {
    type Output = Tick;

    #[inline]
    fn add(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl Sub for Tick {
    type Output = u64;

    #[inline]
    fn sub(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tick counter of one run.  Starts at [`Tick::ZERO`] and only moves forward.
#[derive(Clone, Debug)]
pub struct SimClock {
    now:       Tick,
    tick_secs: u32,
}

impl SimClock {
    pub fn new(tick_secs: u32) -> Self {
        Self { now: Tick::ZERO, tick_secs }
    }

    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.now
    }

    #[inline]
    pub fn advance(&mut self) {
        self.now = self.now.next();
    }

    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.now.0 * u64::from(self.tick_secs)
    }

    /// Elapsed simulated time as `(hours, minutes, seconds)`.
    pub fn elapsed_hms(&self) -> (u64, u32, u32) {
        let secs = self.elapsed_secs();
        (secs / 3_600, (secs / 60 % 60) as u32, (secs % 60) as u32)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Settings for one run.  Every field has a default, so scenario files only
/// list what they change.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Simulated seconds per tick, for reports only.
    pub tick_duration_secs:    u32,
    /// Length of `Sim::run`.
    pub total_ticks:           u64,
    pub seed:                  u64,
    /// Rayon pool size with the `parallel` feature.  `None` = all cores.
    pub num_threads:           Option<usize>,
    /// Snapshot every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
    /// Scan for duplicate vehicles and owner mismatches after every tick.
    /// The vehicle count is checked regardless.
    pub verify_integrity:      bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_duration_secs:    1,
            total_ticks:           1_000,
            seed:                  42,
            num_threads:           None,
            output_interval_ticks: 1,
            verify_integrity:      false,
        }
    }
}

impl SimConfig {
    /// First tick `Sim::run` does not execute.
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_duration_secs)
    }

    #[inline]
    pub fn is_output_tick(&self, tick: Tick) -> bool {
        self.output_interval_ticks != 0 && tick.0.is_multiple_of(self.output_interval_ticks)
    }
}
