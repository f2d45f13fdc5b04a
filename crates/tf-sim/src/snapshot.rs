//! Read-only grid state handed to observers.
//!
//! A `GridSnapshot` is an owned copy: once built it never changes, so it can
//! be wrapped in an `Arc` and sent to a renderer thread while the simulation
//! keeps running.

use serde::Serialize;

use tf_core::{DirectionSet, IntersectionId, SegmentId, Tick, VehicleId};
use tf_signal::PhaseIndex;

use crate::TickStats;

/// One light as seen from outside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LightView {
    pub phase:          PhaseIndex,
    pub green:          DirectionSet,
    pub ticks_in_phase: u32,
}

/// Where one vehicle sits.  `position` 0 is the front of the queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VehiclePosition {
    pub id:       VehicleId,
    pub segment:  SegmentId,
    pub position: u32,
    pub moving:   bool,
}

/// Grid state at the end of `tick`.
///
/// Lights already show the phase chosen for `tick + 1`.
#[derive(Clone, Debug, Serialize)]
pub struct GridSnapshot {
    pub tick:           Tick,
    pub rows:           u32,
    pub cols:           u32,
    /// Indexed by `IntersectionId`.
    pub lights:         Vec<LightView>,
    /// Vehicles per segment, indexed by `SegmentId`.
    pub segment_counts: Vec<u32>,
    /// Vehicles queued towards each intersection (sum of its four incoming
    /// segments), indexed by `IntersectionId`.
    pub queued_at:      Vec<u32>,
    /// Every vehicle, in ascending segment then queue order.
    pub vehicles:       Vec<VehiclePosition>,
    pub stats:          TickStats,
}

impl GridSnapshot {
    #[inline]
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn light(&self, id: IntersectionId) -> Option<&LightView> {
        self.lights.get(id.index())
    }

    pub fn segment_count_of(&self, id: SegmentId) -> u32 {
        self.segment_counts.get(id.index()).copied().unwrap_or(0)
    }

    /// Largest per-intersection queue.
    pub fn max_queued(&self) -> u32 {
        self.queued_at.iter().copied().max().unwrap_or(0)
    }
}
