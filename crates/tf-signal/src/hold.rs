//! A strategy that never switches.

use tf_core::Tick;

use crate::{ControlStrategy, Observation, PhaseIndex};

/// Keeps whatever phase is active.  Useful as a baseline and in tests.
pub struct HoldPhase;

impl ControlStrategy for HoldPhase {
    fn name(&self) -> &str {
        "hold"
    }

    fn decide(&self, obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
        obs.phase
    }
}
