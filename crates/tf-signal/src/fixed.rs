//! Time-driven rotation through the plan.

use tf_core::Tick;

use crate::{ControlStrategy, Observation, PhaseIndex, PhasePlan, SignalError, SignalResult};

/// Each phase stays green for `cycle_length` ticks, then the next one takes
/// over, wrapping at the end of the plan:
///
/// ```text
/// phase(t) = ((t + offset) / cycle_length) mod num_phases
/// ```
///
/// The result depends only on the tick, so two lights with the same
/// parameters are always in step and a replay reproduces every phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FixedCycle {
    cycle_length: u64,
    offset:       u64,
}

impl FixedCycle {
    pub fn new(cycle_length: u64, offset: u64) -> SignalResult<Self> {
        if cycle_length == 0 {
            return Err(SignalError::InvalidParameter("cycle_length must be at least 1".into()));
        }
        Ok(Self { cycle_length, offset })
    }

    #[inline]
    pub fn cycle_length(&self) -> u64 {
        self.cycle_length
    }

    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Phase active at `tick` for a plan with `num_phases` phases.
    pub fn phase_at(&self, tick: Tick, num_phases: usize) -> PhaseIndex {
        let n = num_phases.max(1) as u64;
        let slot = tick.0.wrapping_add(self.offset) / self.cycle_length;
        PhaseIndex((slot % n) as u16)
    }
}

impl ControlStrategy for FixedCycle {
    fn name(&self) -> &str {
        "fixed_cycle"
    }

    fn initial_phase(&self, plan: &PhasePlan) -> PhaseIndex {
        self.phase_at(Tick::ZERO, plan.len())
    }

    fn decide(&self, obs: &Observation<'_>, tick: Tick) -> PhaseIndex {
        self.phase_at(tick, obs.num_phases())
    }
}
