//! `tf-vehicle` holds vehicles, route policies, and traffic generation.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`vehicle`]   | `Vehicle`, `VehicleState`                                  |
//! | [`route`]     | `RoutePolicy`, `TurnWeights`                               |
//! | [`entry`]     | `EntryPoint`, `EntrySpec`, `RouteSpec`, `GenerationRate`   |
//! | [`generator`] | `Generator` (per-entry-point RNG streams), `SpawnRequest`  |
//! | [`loader`]    | `load_entry_points_csv`, `load_entry_points_reader`        |
//! | [`error`]     | `VehicleError`, `VehicleResult<T>`                         |
//!
//! # Movement intent
//!
//! A vehicle decides where it will go at an intersection when it *enters*
//! the segment leading there, not when it reaches the front of the queue.
//! The intent (`next_heading`) is therefore fixed while the vehicle waits,
//! and the movement engine only has to look at it.

pub mod entry;
pub mod error;
pub mod generator;
pub mod loader;
pub mod route;
pub mod vehicle;


pub use entry::{EntryPoint, EntrySpec, GenerationRate, RouteSpec};
pub use error::{VehicleError, VehicleResult};
pub use generator::{Generator, SpawnRequest};
pub use loader::{load_entry_points_csv, load_entry_points_reader};
pub use route::{RoutePolicy, TurnWeights};
pub use vehicle::{Vehicle, VehicleState};
