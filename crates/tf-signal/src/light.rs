//! Per-intersection signal state.

use tf_core::Direction;

use crate::{PhaseIndex, PhasePlan};

/// The light at one intersection.
///
/// Holds only the active phase index and its timer; which headings are green
/// is looked up in the shared [`PhasePlan`].  The phase changes exclusively
/// through [`apply`][Self::apply], once per tick, with a value the caller has
/// already checked against the plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrafficLight {
    phase:          PhaseIndex,
    /// Completed ticks governed by `phase` since it last became active.
    ticks_in_phase: u32,
    switches:       u64,
}

impl TrafficLight {
    pub fn new(initial: PhaseIndex) -> Self {
        Self { phase: initial, ticks_in_phase: 0, switches: 0 }
    }

    #[inline]
    pub fn phase(&self) -> PhaseIndex {
        self.phase
    }

    #[inline]
    pub fn ticks_in_phase(&self) -> u32 {
        self.ticks_in_phase
    }

    /// Phase changes since construction.
    #[inline]
    pub fn switches(&self) -> u64 {
        self.switches
    }

    /// `true` if vehicles travelling `heading` may cross in the current phase.
    #[inline]
    pub fn permits(&self, plan: &PhasePlan, heading: Direction) -> bool {
        plan.green(self.phase).is_some_and(|g| g.contains(heading))
    }

    /// Install the phase for the next tick.  Returns `true` on a switch.
    pub fn apply(&mut self, next: PhaseIndex) -> bool {
        if next == self.phase {
            self.ticks_in_phase = self.ticks_in_phase.saturating_add(1);
            false
        } else {
            self.phase = next;
            self.ticks_in_phase = 0;
            self.switches += 1;
            true
        }
    }
}
