//! `tf-signal` provides traffic lights and the control-strategy extension point.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                   |
//! |-----------------|------------------------------------------------------------|
//! | [`phase`]       | `PhaseIndex`, `PhasePlan`, `ConflictSet` and plan validation |
//! | [`light`]       | `TrafficLight`: current phase, timer, switch counter       |
//! | [`observation`] | `Observation<'a>`: read-only view handed to strategies     |
//! | [`strategy`]    | `ControlStrategy` trait                                    |
//! | [`fixed`]       | `FixedCycle`: time-driven rotation                         |
//! | [`adaptive`]    | `Adaptive`: queue-pressure rule with min/max green          |
//! | [`weighted`]    | `WaitWeighted`: queue and waiting-time score               |
//! | [`hold`]        | `HoldPhase`: never switches                                |
//! | [`config`]      | `StrategyConfig`: serde-tagged strategy selection          |
//! | [`error`]       | `SignalError`, `SignalResult<T>`                           |
//!
//! # Decision model
//!
//! At the end of tick `t` the simulation builds one [`Observation`] per
//! intersection from the state *before* tick `t` moved anything, asks the
//! bound strategy for the phase of tick `t + 1`, checks every answer against
//! the [`PhasePlan`], and only then applies them all.  Strategies never see
//! a partially updated grid and cannot mutate it.

pub mod adaptive;
pub mod config;
pub mod error;
pub mod fixed;
pub mod hold;
pub mod light;
pub mod observation;
pub mod phase;
pub mod strategy;
pub mod weighted;


pub use adaptive::Adaptive;
pub use config::StrategyConfig;
pub use error::{SignalError, SignalResult};
pub use fixed::FixedCycle;
pub use hold::HoldPhase;
pub use light::TrafficLight;
pub use observation::Observation;
pub use phase::{ConflictSet, PhaseIndex, PhasePlan};
pub use strategy::ControlStrategy;
pub use weighted::WaitWeighted;
