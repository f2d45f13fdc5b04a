//! Queue-pressure control.
//!
//! Each phase is scored by the number of vehicles waiting on its green
//! headings.  The light moves to the highest-scoring phase, subject to:
//!
//! | Parameter   | Effect                                                      |
//! |-------------|-------------------------------------------------------------|
//! | `min_green` | The current phase is kept until it has governed this many ticks. |
//! | `max_green` | Once the current phase has governed this many ticks, the best *other* phase takes over regardless of load. |
//! | `threshold` | A challenger must beat the current phase's score by more than this. |
//!
//! # Tie-breaking
//!
//! The current phase wins every tie.  Among challengers with equal scores the
//! lowest phase index wins.  With the defaults (`0`, `None`, `0`) the rule
//! reduces to "switch only to a strictly busier phase".

use tf_core::Tick;

use crate::{ControlStrategy, Observation, PhaseIndex, SignalError, SignalResult};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adaptive {
    min_green: u32,
    max_green: Option<u32>,
    threshold: u32,
}

impl Adaptive {
    pub fn new(min_green: u32, max_green: Option<u32>, threshold: u32) -> SignalResult<Self> {
        if let Some(max) = max_green {
            if max == 0 || max < min_green {
                return Err(SignalError::InvalidParameter(format!(
                    "max_green {max} must be at least 1 and not below min_green {min_green}"
                )));
            }
        }
        Ok(Self { min_green, max_green, threshold })
    }

    /// Highest-load phase other than `except`, lowest index on ties.
    fn best_other(obs: &Observation<'_>, except: PhaseIndex) -> Option<(PhaseIndex, u64)> {
        obs.plan
            .indices()
            .filter(|&p| p != except)
            .map(|p| (p, obs.phase_load(p)))
            .fold(None, |best, (p, load)| match best {
                Some((_, best_load)) if best_load >= load => best,
                _ => Some((p, load)),
            })
    }
}

impl ControlStrategy for Adaptive {
    fn name(&self) -> &str {
        "adaptive"
    }

    fn decide(&self, obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
        let current = obs.phase;
        // Ticks the current phase will have governed once this tick ends.
        let governed = obs.ticks_in_phase.saturating_add(1);

        if governed < self.min_green {
            return current;
        }

        let Some((challenger, load)) = Self::best_other(obs, current) else {
            return current;
        };

        if self.max_green.is_some_and(|max| governed >= max) {
            return challenger;
        }

        if load > obs.phase_load(current) + self.threshold as u64 {
            challenger
        } else {
            current
        }
    }
}
