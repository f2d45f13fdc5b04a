//! The vehicle record owned by a segment queue.

use tf_core::{Direction, IntersectionId, SegmentId, Tick, Turn, VehicleId, VehicleRng};
use tf_grid::Grid;

use crate::RoutePolicy;

/// Where a vehicle stands after the most recent tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum VehicleState {
    /// Did not move during the most recent tick.
    #[default]
    Queued,
    /// Advanced into its current segment during the most recent tick.
    Moving,
    /// Crossed its final intersection and left the grid.
    Arrived,
}

/// One vehicle.  Owned by exactly one segment queue at a time; moving it
/// transfers ownership by value.
#[derive(Clone, Debug)]
pub struct Vehicle {
    pub id:             VehicleId,
    /// The segment whose queue currently holds this vehicle.
    pub segment:        SegmentId,
    /// Heading of `segment`.
    pub heading:        Direction,
    /// Heading to take at the end of `segment`.
    pub next_heading:   Direction,
    pub route:          RoutePolicy,
    pub state:          VehicleState,
    /// Intersections still to cross, counting the next one.  `None` means
    /// the trip only ends through the route policy.
    pub remaining_hops: Option<u32>,
    pub spawned_at:     Tick,
    /// Last tick in which the vehicle entered a segment (spawn included).
    pub last_moved:     Tick,
    /// Intersections crossed so far.
    pub hops:           u32,
    /// Ticks spent without moving.
    pub wait_ticks:     u64,
    rng:                VehicleRng,
}

impl Vehicle {
    /// Create a vehicle on `segment` and choose its first intent.
    ///
    /// `arriving_at` is the destination intersection of `segment`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id:             VehicleId,
        segment:        SegmentId,
        heading:        Direction,
        arriving_at:    IntersectionId,
        route:          RoutePolicy,
        remaining_hops: Option<u32>,
        now:            Tick,
        seed:           u64,
        grid:           &Grid,
    ) -> Self {
        let mut v = Self {
            id,
            segment,
            heading,
            next_heading: heading,
            route,
            state: VehicleState::Moving,
            remaining_hops,
            spawned_at: now,
            last_moved: now,
            hops: 0,
            wait_ticks: 0,
            rng: VehicleRng::new(seed, id),
        };
        v.plan_next(grid, arriving_at);
        v
    }

    /// Re-evaluate the route policy for the intersection at the end of the
    /// current segment.
    pub fn plan_next(&mut self, grid: &Grid, arriving_at: IntersectionId) {
        self.next_heading = self.route.next_heading(grid, arriving_at, self.heading, &mut self.rng);
    }

    /// The intended movement relative to the current heading.  `None` only
    /// for a destination vehicle whose entry heading points away from its
    /// target and must reverse.
    #[inline]
    pub fn turn(&self) -> Option<Turn> {
        self.heading.turn_to(self.next_heading)
    }

    /// `true` if crossing `at` ends the trip.
    pub fn is_final_crossing(&self, at: IntersectionId) -> bool {
        self.remaining_hops == Some(1) || self.route.target() == Some(at)
    }

    /// Record a crossing into `segment` (travelling `heading`) during `now`
    /// and pick the intent for the intersection at its far end.
    pub fn enter(
        &mut self,
        segment:     SegmentId,
        heading:     Direction,
        arriving_at: IntersectionId,
        now:         Tick,
        grid:        &Grid,
    ) {
        self.segment = segment;
        self.last_moved = now;
        self.heading = heading;
        self.hops += 1;
        self.remaining_hops = self.remaining_hops.map(|h| h.saturating_sub(1));
        self.state = VehicleState::Moving;
        self.plan_next(grid, arriving_at);
    }

    /// Mark a tick spent without moving.
    #[inline]
    pub fn hold(&mut self) {
        self.state = VehicleState::Queued;
        self.wait_ticks += 1;
    }

    /// Ticks from spawn to `now`.
    #[inline]
    pub fn trip_ticks(&self, now: Tick) -> u64 {
        now.since(self.spawned_at)
    }
}
