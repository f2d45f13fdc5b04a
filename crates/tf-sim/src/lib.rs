//! `tf-sim` is the tick loop orchestrator for the rust_tf framework.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Snapshot   record every light's phase and every segment length.
//!   ② Movement   front vehicles on green cross in ascending SegmentId order,
//!                 admitted while the destination has pre-tick room
//!                 (read phase is parallel with the `parallel` feature).
//!   ③ Generation entry points insert vehicles onto segments with room.
//!   ④ Removal    vehicles on their final crossing leave the grid.
//!   ⑤ Signals    strategies pick next-tick phases from the ① snapshot;
//!                 every pick is validated before any is applied.
//! ```
//!
//! # Crate layout
//!
//! | Module       | Contents                                              |
//! |--------------|-------------------------------------------------------|
//! | [`builder`]  | `SimBuilder`: validation and initial light phases     |
//! | [`sim`]      | `Sim`, `RunOutcome`, the tick loop                    |
//! | [`observer`] | `SimObserver`, `NoopObserver`, `ChannelObserver`      |
//! | [`snapshot`] | `GridSnapshot` and its light/vehicle views            |
//! | [`stats`]    | `TickStats`, `SimStats`                               |
//! | [`scenario`] | JSON `Scenario` files                                 |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the read phase on Rayon's thread pool.            |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tf_core::SimConfig;
//! use tf_grid::Grid;
//! use tf_signal::FixedCycle;
//! use tf_sim::{NoopObserver, SimBuilder};
//!
//! let mut sim = SimBuilder::new(config, Grid::new(4, 4)?)
//!     .strategy(FixedCycle::new(20, 0)?)
//!     .entry_points(entries)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod scenario;
pub mod sim;
pub mod snapshot;
pub mod stats;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{ChannelObserver, NoopObserver, SimObserver};
pub use scenario::{Scenario, StrategyBinding};
pub use sim::{RunOutcome, Sim};
pub use snapshot::{GridSnapshot, LightView, VehiclePosition};
pub use stats::{SimStats, TickStats};
