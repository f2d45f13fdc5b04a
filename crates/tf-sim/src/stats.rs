//! Per-tick and cumulative counters.

use serde::Serialize;

use tf_core::Tick;

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub tick:                  Tick,
    /// Vehicles inserted by entry points.
    pub generated:             u64,
    /// Vehicles that made their final crossing and left.
    pub arrived:               u64,
    /// Vehicles that crossed into a new segment.
    pub moves:                 u64,
    /// Crossings refused because the destination segment was full.
    pub capacity_rejections:   u64,
    /// Generation attempts dropped because the entry segment was full.
    pub generation_rejections: u64,
    /// Front vehicles stopped by a red light.
    pub signal_holds:          u64,
    /// Lights whose phase changed for the next tick.
    pub switches:              u64,
    /// Vehicles on the grid after the tick.
    pub vehicles:              u64,
    /// Sum of `trip_ticks` over this tick's arrivals.
    pub trip_ticks:            u64,
    /// Sum of `wait_ticks` over this tick's arrivals.
    pub wait_ticks:            u64,
}

/// Totals since tick 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SimStats {
    pub ticks:                 u64,
    pub generated:             u64,
    pub arrived:               u64,
    pub moves:                 u64,
    pub capacity_rejections:   u64,
    pub generation_rejections: u64,
    pub signal_holds:          u64,
    pub switches:              u64,
    /// Running sum of the per-tick mean queue length per segment.
    queue_length_sum:          f64,
    trip_ticks_sum:            u64,
    wait_ticks_sum:            u64,
}

impl SimStats {
    pub(crate) fn absorb(&mut self, tick: &TickStats, segment_count: usize) {
        self.ticks                 += 1;
        self.generated             += tick.generated;
        self.arrived               += tick.arrived;
        self.moves                 += tick.moves;
        self.capacity_rejections   += tick.capacity_rejections;
        self.generation_rejections += tick.generation_rejections;
        self.signal_holds          += tick.signal_holds;
        self.switches              += tick.switches;
        self.trip_ticks_sum        += tick.trip_ticks;
        self.wait_ticks_sum        += tick.wait_ticks;
        if segment_count > 0 {
            self.queue_length_sum += tick.vehicles as f64 / segment_count as f64;
        }
    }

    /// Average vehicles per segment, averaged over all completed ticks.
    pub fn mean_queue_length(&self) -> f64 {
        ratio(self.queue_length_sum, self.ticks)
    }

    /// Average spawn-to-exit time of arrived vehicles, in ticks.
    pub fn mean_trip_ticks(&self) -> f64 {
        ratio(self.trip_ticks_sum as f64, self.arrived)
    }

    /// Average ticks arrived vehicles spent not moving.
    pub fn mean_wait_ticks(&self) -> f64 {
        ratio(self.wait_ticks_sum as f64, self.arrived)
    }
}

fn ratio(sum: f64, n: u64) -> f64 {
    if n == 0 { 0.0 } else { sum / n as f64 }
}
