//! Serializable strategy selection.

use serde::{Deserialize, Serialize};

use crate::{Adaptive, ControlStrategy, FixedCycle, HoldPhase, SignalResult, WaitWeighted};

/// A built-in strategy and its parameters, as written in a scenario file.
///
/// ```json
/// { "kind": "fixed_cycle", "cycle_length": 30 }
/// { "kind": "adaptive", "min_green": 5, "max_green": 60, "threshold": 2 }
/// { "kind": "wait_weighted", "min_green": 5, "max_green": 30, "wait_weight": 1.5 }
/// { "kind": "hold" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    FixedCycle {
        cycle_length: u64,
        #[serde(default)]
        offset: u64,
    },
    Adaptive {
        #[serde(default)]
        min_green: u32,
        #[serde(default)]
        max_green: Option<u32>,
        #[serde(default)]
        threshold: u32,
    },
    WaitWeighted {
        #[serde(default = "default_min_green")]
        min_green:    u32,
        #[serde(default = "default_max_green")]
        max_green:    Option<u32>,
        #[serde(default = "default_wait_weight")]
        wait_weight:  f64,
        #[serde(default = "default_switch_ratio")]
        switch_ratio: f64,
    },
    Hold,
}

fn default_min_green() -> u32 {
    WaitWeighted::DEFAULT_MIN_GREEN
}

fn default_max_green() -> Option<u32> {
    Some(WaitWeighted::DEFAULT_MAX_GREEN)
}

fn default_wait_weight() -> f64 {
    WaitWeighted::DEFAULT_WAIT_WEIGHT
}

fn default_switch_ratio() -> f64 {
    WaitWeighted::DEFAULT_SWITCH_RATIO
}

impl StrategyConfig {
    /// Validate the parameters and box the strategy.
    pub fn build(&self) -> SignalResult<Box<dyn ControlStrategy>> {
        let strategy: Box<dyn ControlStrategy> = match *self {
            StrategyConfig::FixedCycle { cycle_length, offset } => {
                Box::new(FixedCycle::new(cycle_length, offset)?)
            }
            StrategyConfig::Adaptive { min_green, max_green, threshold } => {
                Box::new(Adaptive::new(min_green, max_green, threshold)?)
            }
            StrategyConfig::WaitWeighted { min_green, max_green, wait_weight, switch_ratio } => {
                Box::new(WaitWeighted::new(min_green, max_green, wait_weight, switch_ratio)?)
            }
            StrategyConfig::Hold => Box::new(HoldPhase),
        };
        Ok(strategy)
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::FixedCycle { cycle_length: 10, offset: 0 }
    }
}
