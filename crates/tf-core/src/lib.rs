//! `tf-core` holds the foundational types for the `rust_tf` traffic-grid framework.
//!
//! Every other `tf-*` crate depends on this one.  It depends only on `rand`
//! and `thiserror`, plus optional `serde`.
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `IntersectionId`, `SegmentId`, `VehicleId`            |
//! | [`direction`]   | `Direction`, `Turn`, `Axis`, `DirectionSet`           |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                       |
//! | [`rng`]         | `VehicleRng` (per-vehicle), `SimRng` (global)         |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` for ids, directions, `Tick` and  |
//! |         | `SimConfig`.  Enabled by `tf-sim` for JSON scenarios.      |

pub mod direction;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use direction::{Axis, Direction, DirectionSet, Turn};
pub use error::{CoreError, CoreResult};
pub use ids::{IntersectionId, SegmentId, VehicleId};
pub use rng::{SimRng, VehicleRng};
pub use time::{SimClock, SimConfig, Tick};
