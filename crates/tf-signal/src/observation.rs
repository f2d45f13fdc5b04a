//! The read-only view a strategy decides from.

use tf_core::{Direction, IntersectionId};

use crate::{PhaseIndex, PhasePlan};

/// What a [`ControlStrategy`][crate::ControlStrategy] may see about one
/// intersection.
///
/// Built from pre-tick state: `phase`, `queues` and `waits` describe the
/// intersection as it was before the current tick moved any vehicle.
#[derive(Clone, Copy, Debug)]
pub struct Observation<'a> {
    pub intersection:   IntersectionId,
    pub phase:          PhaseIndex,
    /// Completed ticks in `phase` before the current one.
    pub ticks_in_phase: u32,
    /// Incoming queue length per heading, indexed by `Direction::index()`.
    pub queues:         [u32; 4],
    /// Summed `wait_ticks` of the vehicles in each incoming queue.
    pub waits:          [u64; 4],
    pub plan:           &'a PhasePlan,
}

impl Observation<'_> {
    #[inline]
    pub fn queue(&self, heading: Direction) -> u32 {
        self.queues[heading.index()]
    }

    /// Total queued vehicles facing a green light under `phase`.
    pub fn phase_load(&self, phase: PhaseIndex) -> u64 {
        self.plan
            .green(phase)
            .map_or(0, |g| g.iter().map(|d| self.queue(d) as u64).sum())
    }

    /// Accumulated waiting of the vehicles facing a green light under `phase`.
    pub fn phase_wait(&self, phase: PhaseIndex) -> u64 {
        self.plan
            .green(phase)
            .map_or(0, |g| g.iter().map(|d| self.waits[d.index()]).sum())
    }

    #[inline]
    pub fn num_phases(&self) -> usize {
        self.plan.len()
    }
}
