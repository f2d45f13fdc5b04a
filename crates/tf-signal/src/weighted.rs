//! Wait-weighted control.
//!
//! Like [`Adaptive`][crate::Adaptive] but the score of a phase also counts
//! how long its vehicles have been waiting:
//!
//! ```text
//! score(p) = wait_weight * phase_wait(p) + phase_load(p)
//! ```
//!
//! A challenger takes over only when its score exceeds `switch_ratio` times
//! the current phase's score.  `min_green`, `max_green` and the tie rules
//! are those of `Adaptive`.

use tf_core::Tick;

use crate::{ControlStrategy, Observation, PhaseIndex, SignalError, SignalResult};

#[derive(Clone, Debug, PartialEq)]
pub struct WaitWeighted {
    min_green:    u32,
    max_green:    Option<u32>,
    wait_weight:  f64,
    switch_ratio: f64,
}

impl Default for WaitWeighted {
    fn default() -> Self {
        Self {
            min_green:    Self::DEFAULT_MIN_GREEN,
            max_green:    Some(Self::DEFAULT_MAX_GREEN),
            wait_weight:  Self::DEFAULT_WAIT_WEIGHT,
            switch_ratio: Self::DEFAULT_SWITCH_RATIO,
        }
    }
}

impl WaitWeighted {
    pub const DEFAULT_MIN_GREEN: u32 = 5;
    pub const DEFAULT_MAX_GREEN: u32 = 30;
    pub const DEFAULT_WAIT_WEIGHT: f64 = 1.5;
    pub const DEFAULT_SWITCH_RATIO: f64 = 1.3;

    pub fn new(
        min_green:    u32,
        max_green:    Option<u32>,
        wait_weight:  f64,
        switch_ratio: f64,
    ) -> SignalResult<Self> {
        if let Some(max) = max_green {
            if max == 0 || max < min_green {
                return Err(SignalError::InvalidParameter(format!(
                    "max_green {max} must be at least 1 and not below min_green {min_green}"
                )));
            }
        }
        if !wait_weight.is_finite() || wait_weight < 0.0 {
            return Err(SignalError::InvalidParameter(format!(
                "wait_weight must be finite and non-negative, got {wait_weight}"
            )));
        }
        if !switch_ratio.is_finite() || switch_ratio < 1.0 {
            return Err(SignalError::InvalidParameter(format!(
                "switch_ratio must be finite and at least 1, got {switch_ratio}"
            )));
        }
        Ok(Self { min_green, max_green, wait_weight, switch_ratio })
    }

    pub fn score(&self, obs: &Observation<'_>, phase: PhaseIndex) -> f64 {
        self.wait_weight * obs.phase_wait(phase) as f64 + obs.phase_load(phase) as f64
    }

    fn best_other(&self, obs: &Observation<'_>, except: PhaseIndex) -> Option<(PhaseIndex, f64)> {
        obs.plan
            .indices()
            .filter(|&p| p != except)
            .map(|p| (p, self.score(obs, p)))
            .fold(None, |best, (p, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((p, score)),
            })
    }
}

impl ControlStrategy for WaitWeighted {
    fn name(&self) -> &str {
        "wait_weighted"
    }

    fn decide(&self, obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
        let current = obs.phase;
        let governed = obs.ticks_in_phase.saturating_add(1);
        if governed < self.min_green {
            return current;
        }

        let Some((challenger, score)) = self.best_other(obs, current) else {
            return current;
        };
        if self.max_green.is_some_and(|max| governed >= max) {
            return challenger;
        }
        if score > self.score(obs, current) * self.switch_ratio {
            challenger
        } else {
            current
        }
    }
}
