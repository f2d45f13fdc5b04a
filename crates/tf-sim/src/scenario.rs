//! JSON scenario files.
//!
//! A scenario describes one complete run: grid, signals, strategies, entry
//! points, and the run configuration.  Everything except the dimensions has
//! a default.
//!
//! ```json
//! {
//!   "rows": 3, "cols": 3,
//!   "capacity": { "bounded": 8 },
//!   "phase_plan": [["east", "west"], ["north", "south"]],
//!   "strategies": {
//!     "fixed": { "kind": "fixed_cycle", "cycle_length": 2 },
//!     "smart": { "kind": "adaptive", "min_green": 2, "max_green": 20 }
//!   },
//!   "default_strategy": "fixed",
//!   "bindings": [{ "row": 1, "col": 1, "strategy": "smart" }],
//!   "entry_points": [
//!     { "row": 0, "col": 0, "heading": "east",
//!       "rate": { "kind": "probability", "p": 0.1 }, "trip_hops": 6 }
//!   ],
//!   "config": { "total_ticks": 200, "seed": 7 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tf_core::SimConfig;
use tf_grid::{Capacity, Grid};
use tf_signal::{ConflictSet, PhasePlan, StrategyConfig};
use tf_vehicle::{EntryPoint, EntrySpec};

use crate::{Sim, SimBuilder, SimError, SimResult};

/// Binds one intersection to a named strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyBinding {
    pub row:      u32,
    pub col:      u32,
    pub strategy: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub rows: u32,
    pub cols: u32,

    #[serde(default)]
    pub capacity: Capacity,

    #[serde(default)]
    pub phase_plan: PhasePlan,

    #[serde(default)]
    pub conflicts: ConflictSet,

    #[serde(default)]
    pub right_turn_on_red: bool,

    /// Named strategy table.
    #[serde(default = "default_strategies")]
    pub strategies: BTreeMap<String, StrategyConfig>,

    /// Strategy for intersections without a binding.  `None` picks the first
    /// name in the table.
    #[serde(default)]
    pub default_strategy: Option<String>,

    #[serde(default)]
    pub bindings: Vec<StrategyBinding>,

    #[serde(default)]
    pub entry_points: Vec<EntrySpec>,

    #[serde(default)]
    pub config: SimConfig,
}

fn default_strategies() -> BTreeMap<String, StrategyConfig> {
    BTreeMap::from([("fixed".to_string(), StrategyConfig::default())])
}

impl Scenario {
    /// A `rows × cols` scenario with every optional field at its default.
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            capacity:          Capacity::default(),
            phase_plan:        PhasePlan::default(),
            conflicts:         ConflictSet::default(),
            right_turn_on_red: false,
            strategies:        default_strategies(),
            default_strategy:  None,
            bindings:          Vec::new(),
            entry_points:      Vec::new(),
            config:            SimConfig::default(),
        }
    }

    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path(path: &Path) -> SimResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let scenario = Self::from_json_str(&json)?;
        log::info!("loaded scenario {} ({}x{})", path.display(), scenario.rows, scenario.cols);
        Ok(scenario)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Replace the strategy table with a single strategy used everywhere.
    pub fn use_strategy_everywhere(&mut self, name: &str, strategy: StrategyConfig) {
        self.strategies = BTreeMap::from([(name.to_string(), strategy)]);
        self.default_strategy = Some(name.to_string());
        self.bindings.clear();
    }

    /// Resolve entry points against `grid`.
    pub fn resolve_entry_points(&self, grid: &Grid) -> SimResult<Vec<EntryPoint>> {
        self.entry_points
            .iter()
            .map(|spec| spec.resolve(grid).map_err(SimError::from))
            .collect()
    }

    /// Validate the whole scenario and build a simulation at tick 0.
    pub fn build(&self) -> SimResult<Sim> {
        self.builder()?.build()
    }

    /// Like [`build`][Self::build] but returns the builder so callers can add
    /// custom strategies or entry points first.
    pub fn builder(&self) -> SimResult<SimBuilder> {
        let grid = Grid::new(self.rows, self.cols)?;

        let names: Vec<&String> = self.strategies.keys().collect();
        let index_of = |name: &str| names.iter().position(|n| n.as_str() == name);

        let default = match &self.default_strategy {
            Some(name) => index_of(name).ok_or_else(|| {
                SimError::Config(format!("default strategy {name:?} is not defined"))
            })?,
            None if names.is_empty() => {
                return Err(SimError::Config("strategy table is empty".into()));
            }
            None => 0,
        };

        let mut bindings = vec![default; grid.intersection_count()];
        for b in &self.bindings {
            let at = grid.intersection_at(b.row, b.col)?;
            bindings[at.index()] = index_of(&b.strategy).ok_or_else(|| SimError::UnknownStrategy {
                intersection: at,
                strategy:     b.strategy.clone(),
            })?;
        }

        let strategies = self
            .strategies
            .values()
            .map(|cfg| cfg.build().map_err(SimError::from))
            .collect::<SimResult<Vec<_>>>()?;

        Ok(SimBuilder::new(self.config.clone(), grid)
            .capacity(self.capacity)
            .phase_plan(self.phase_plan.clone())
            .conflicts(self.conflicts)
            .right_turn_on_red(self.right_turn_on_red)
            .strategies(strategies)
            .bindings(bindings)
            .entry_points(self.resolve_entry_points(&grid)?))
    }
}
