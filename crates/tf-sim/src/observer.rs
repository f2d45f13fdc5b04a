//! Simulation observer trait for progress reporting and data collection.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use tf_core::Tick;

use crate::{GridSnapshot, SimStats, TickStats};

/// Callbacks invoked by [`Sim`][crate::Sim] at tick boundaries.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.  Observers run on the simulation thread;
/// anything slow should go through [`ChannelObserver`] instead.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, stats: &TickStats) {
///         if stats.tick.0 % self.interval == 0 {
///             println!("{}: {} vehicles", stats.tick, stats.vehicles);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before any processing of `tick`.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once `tick` has been fully committed.
    fn on_tick_end(&mut self, _stats: &TickStats) {}

    /// `false` lets the simulation skip building snapshots entirely.
    fn wants_snapshots(&self) -> bool {
        true
    }

    /// Called at output ticks (every `config.output_interval_ticks`).
    fn on_snapshot(&mut self, _snapshot: &Arc<GridSnapshot>) {}

    /// Called once when a run finishes, whether it completed or was cancelled.
    fn on_sim_end(&mut self, _final_tick: Tick, _stats: &SimStats) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {
    fn wants_snapshots(&self) -> bool {
        false
    }
}

// ── ChannelObserver ───────────────────────────────────────────────────────────

/// Forwards snapshots over a bounded channel without ever blocking the
/// simulation.
///
/// When the receiver falls behind and the channel is full the frame is
/// dropped and counted.  Once the receiver hangs up, further snapshots are
/// discarded silently.
pub struct ChannelObserver {
    tx:           SyncSender<Arc<GridSnapshot>>,
    dropped:      u64,
    disconnected: bool,
}

impl ChannelObserver {
    /// Create an observer and the receiving end of its channel.  `capacity`
    /// is the number of frames buffered before dropping starts.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Arc<GridSnapshot>>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        (Self { tx, dropped: 0, disconnected: false }, rx)
    }

    /// Frames dropped because the channel was full.
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    #[inline]
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl SimObserver for ChannelObserver {
    fn on_snapshot(&mut self, snapshot: &Arc<GridSnapshot>) {
        if self.disconnected {
            return;
        }
        match self.tx.try_send(Arc::clone(snapshot)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                log::warn!("snapshot receiver is behind; dropped frame for {}", snapshot.tick);
            }
            Err(TrySendError::Disconnected(_)) => {
                self.disconnected = true;
                log::info!("snapshot receiver disconnected at {}", snapshot.tick);
            }
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick, _stats: &SimStats) {
        if self.dropped > 0 {
            log::warn!("{} snapshot frames dropped by {final_tick}", self.dropped);
        }
    }
}

// ── Fan-out ───────────────────────────────────────────────────────────────────

/// Runs two observers in sequence.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_tick_start(&mut self, tick: Tick) {
        self.0.on_tick_start(tick);
        self.1.on_tick_start(tick);
    }

    fn on_tick_end(&mut self, stats: &TickStats) {
        self.0.on_tick_end(stats);
        self.1.on_tick_end(stats);
    }

    fn wants_snapshots(&self) -> bool {
        self.0.wants_snapshots() || self.1.wants_snapshots()
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GridSnapshot>) {
        self.0.on_snapshot(snapshot);
        self.1.on_snapshot(snapshot);
    }

    fn on_sim_end(&mut self, final_tick: Tick, stats: &SimStats) {
        self.0.on_sim_end(final_tick, stats);
        self.1.on_sim_end(final_tick, stats);
    }
}

/// Forwards to the borrowed observer.
impl<O: SimObserver + ?Sized> SimObserver for &mut O {
    fn on_tick_start(&mut self, tick: Tick) {
        (**self).on_tick_start(tick);
    }

    fn on_tick_end(&mut self, stats: &TickStats) {
        (**self).on_tick_end(stats);
    }

    fn wants_snapshots(&self) -> bool {
        (**self).wants_snapshots()
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GridSnapshot>) {
        (**self).on_snapshot(snapshot);
    }

    fn on_sim_end(&mut self, final_tick: Tick, stats: &SimStats) {
        (**self).on_sim_end(final_tick, stats);
    }
}
