//! `tf-grid` provides the toroidal intersection lattice and segment queues.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                         |
//! |--------------|------------------------------------------------------------------|
//! | [`topology`] | `Grid`: N×M torus, neighbor lookup, segment indexing, routing    |
//! | [`segment`]  | `SegmentStore<T>`: FIFO queue per directed segment, `Capacity`   |
//! | [`error`]    | `GridError`, `GridResult<T>`                                     |
//!
//! # Indexing
//!
//! Intersections live in a flat arena indexed `row * cols + col`; segments in
//! a second arena indexed `from * 4 + heading`.  There are no pointer links:
//! every neighbor is computed with modular arithmetic, so every
//! intersection has exactly four neighbors and every lookup is total.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `Capacity`.             |

pub mod error;
pub mod segment;
pub mod topology;


pub use error::{GridError, GridResult};
pub use segment::{Capacity, PushOutcome, SegmentStore};
pub use topology::{Grid, SegmentEnds};
