//! Entry points: where and how often vehicles appear.
//!
//! A vehicle generated at entry point `(at, heading)` is placed on the
//! segment that *arrives* at `at` travelling `heading`, so the first
//! intersection it queues for (and crosses) is `at` itself.

use serde::{Deserialize, Serialize};

use tf_core::{Direction, IntersectionId, SimRng, Tick};
use tf_grid::Grid;

use crate::{RoutePolicy, TurnWeights, VehicleError, VehicleResult};

// ── GenerationRate ────────────────────────────────────────────────────────────

/// How often an entry point attempts to generate a vehicle.
#[derive(Copy, Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenerationRate {
    /// One Bernoulli trial per tick.
    Probability { p: f64 },
    /// Every `every` ticks, starting at tick `offset`.
    Interval {
        every: u64,
        #[serde(default)]
        offset: u64,
    },
}

impl GenerationRate {
    pub fn validate(&self) -> VehicleResult<()> {
        match *self {
            GenerationRate::Probability { p } if !(0.0..=1.0).contains(&p) => {
                Err(VehicleError::InvalidRate(format!("probability {p} outside [0, 1]")))
            }
            GenerationRate::Interval { every: 0, .. } => {
                Err(VehicleError::InvalidRate("interval must be at least 1 tick".into()))
            }
            _ => Ok(()),
        }
    }

    /// `true` if a generation attempt happens at `tick`.
    ///
    /// `Probability` consumes exactly one draw from `rng` per call, whatever
    /// the outcome, so the stream stays aligned with the tick count.
    pub fn fires(&self, tick: Tick, rng: &mut SimRng) -> bool {
        match *self {
            GenerationRate::Probability { p } => rng.gen_bool(p),
            GenerationRate::Interval { every, offset } => {
                tick.0 >= offset && (tick.0 - offset).is_multiple_of(every)
            }
        }
    }
}

// ── EntryPoint ────────────────────────────────────────────────────────────────

/// A resolved, validated vehicle source.
#[derive(Clone, PartialEq, Debug)]
pub struct EntryPoint {
    pub at:        IntersectionId,
    pub heading:   Direction,
    pub rate:      GenerationRate,
    pub route:     RoutePolicy,
    /// Intersections each generated vehicle crosses before leaving.  `None`
    /// leaves trip length to the route policy.
    pub trip_hops: Option<u32>,
}

impl EntryPoint {
    pub fn validate(&self, grid: &Grid) -> VehicleResult<()> {
        grid.check_intersection(self.at)?;
        if let Some(target) = self.route.target() {
            grid.check_intersection(target)?;
        }
        if self.trip_hops == Some(0) {
            return Err(VehicleError::InvalidTripHops);
        }
        self.rate.validate()?;
        self.route.validate()
    }
}

// ── Serialized form ───────────────────────────────────────────────────────────

/// Route policy with destinations given as grid coordinates.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteSpec {
    #[default]
    Straight,
    RandomTurn(TurnWeights),
    Destination { row: u32, col: u32 },
}

/// An entry point as written in a scenario file, with coordinates instead
/// of IDs.  Resolved against a concrete grid by [`EntrySpec::resolve`].
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct EntrySpec {
    pub row:       u32,
    pub col:       u32,
    pub heading:   Direction,
    pub rate:      GenerationRate,
    #[serde(default)]
    pub route:     RouteSpec,
    #[serde(default)]
    pub trip_hops: Option<u32>,
}

impl EntrySpec {
    pub fn resolve(&self, grid: &Grid) -> VehicleResult<EntryPoint> {
        let route = match self.route {
            RouteSpec::Straight => RoutePolicy::Straight,
            RouteSpec::RandomTurn(weights) => RoutePolicy::RandomTurn(weights),
            RouteSpec::Destination { row, col } => RoutePolicy::Destination {
                target: grid.intersection_at(row, col)?,
            },
        };
        let entry = EntryPoint {
            at:        grid.intersection_at(self.row, self.col)?,
            heading:   self.heading,
            rate:      self.rate,
            route,
            trip_hops: self.trip_hops,
        };
        entry.validate(grid)?;
        Ok(entry)
    }
}
