//! `tf-output` writes simulation output for the rust_tf framework.
//!
//! Three backends are provided behind Cargo features:
//!
//! | Feature   | Backend | Files created                                            |
//! |-----------|---------|----------------------------------------------------------|
//! | *(none)*  | CSV     | `intersection_snapshots.csv`, `tick_summaries.csv`       |
//! | `sqlite`  | SQLite  | `output.db`                                              |
//! | `parquet` | Parquet | `intersection_snapshots.parquet`, `tick_summaries.parquet` |
//!
//! All backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `tf_sim::SimObserver`.  Tick
//! summaries are written every tick; intersection rows only at output ticks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tf_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer, &sim.config);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "parquet")]
pub mod parquet;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{IntersectionSnapshotRow, TickSummaryRow};
pub use writer::OutputWriter;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWriter;

#[cfg(feature = "parquet")]
pub use parquet::ParquetWriter;
