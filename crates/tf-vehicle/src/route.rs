//! How a vehicle picks its heading at each intersection.

use serde::{Deserialize, Serialize};

use tf_core::{Direction, IntersectionId, Turn, VehicleRng};
use tf_grid::Grid;

use crate::{VehicleError, VehicleResult};

// ── TurnWeights ───────────────────────────────────────────────────────────────

/// Relative weights of the three permitted turns.  They need not sum to 1.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnWeights {
    pub straight: f64,
    pub left:     f64,
    pub right:    f64,
}

impl Default for TurnWeights {
    /// Uniform over straight, left, and right.
    fn default() -> Self {
        Self { straight: 1.0, left: 1.0, right: 1.0 }
    }
}

impl TurnWeights {
    pub fn validate(&self) -> VehicleResult<()> {
        let all = [self.straight, self.left, self.right];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(VehicleError::InvalidTurnWeights(format!(
                "weights must be finite and non-negative, got {self:?}"
            )));
        }
        let total: f64 = all.iter().sum();
        if total <= 0.0 {
            return Err(VehicleError::InvalidTurnWeights("weights sum to zero".into()));
        }
        if !total.is_finite() {
            return Err(VehicleError::InvalidTurnWeights(format!(
                "weights overflow when summed, got {self:?}"
            )));
        }
        Ok(())
    }

    /// Draw one turn.  Assumes the weights passed [`validate`][Self::validate].
    pub fn sample(&self, rng: &mut VehicleRng) -> Turn {
        let total = self.straight + self.left + self.right;
        let x = rng.gen_range(0.0..total);
        if x < self.straight {
            Turn::Straight
        } else if x < self.straight + self.left {
            Turn::Left
        } else {
            Turn::Right
        }
    }
}

// ── RoutePolicy ───────────────────────────────────────────────────────────────

/// A vehicle's routing behaviour, fixed for its whole trip.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoutePolicy {
    /// Keep the entry heading forever.
    #[default]
    Straight,
    /// Sample a turn at every intersection.  Never reverses.
    RandomTurn(TurnWeights),
    /// Follow a shortest torus path and leave the grid on reaching `target`.
    Destination { target: IntersectionId },
}

impl RoutePolicy {
    pub fn validate(&self) -> VehicleResult<()> {
        match self {
            RoutePolicy::RandomTurn(w) => w.validate(),
            _ => Ok(()),
        }
    }

    /// The heading to take when crossing `at`, having arrived travelling
    /// `heading`.
    ///
    /// Only `RandomTurn` draws from `rng`, so the other policies leave the
    /// vehicle's stream untouched.
    pub fn next_heading(
        &self,
        grid:    &Grid,
        at:      IntersectionId,
        heading: Direction,
        rng:     &mut VehicleRng,
    ) -> Direction {
        match self {
            RoutePolicy::Straight => heading,
            RoutePolicy::RandomTurn(w) => heading.turned(w.sample(rng)),
            RoutePolicy::Destination { target } => {
                grid.heading_towards(at, *target).unwrap_or(heading)
            }
        }
    }

    /// The destination intersection, if the policy has one.
    pub fn target(&self) -> Option<IntersectionId> {
        match self {
            RoutePolicy::Destination { target } => Some(*target),
            _ => None,
        }
    }
}
