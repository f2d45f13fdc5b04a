//! The `OutputWriter` trait.

use crate::{IntersectionSnapshotRow, OutputResult, TickSummaryRow};

/// A sink for output rows.  Implemented by the CSV, SQLite, and Parquet
/// writers.
///
/// Errors are returned to [`SimOutputObserver`][crate::SimOutputObserver],
/// which keeps the first one for [`take_error`][crate::SimOutputObserver::take_error].
pub trait OutputWriter {
    /// Write every intersection row of one snapshot.
    fn write_intersections(&mut self, rows: &[IntersectionSnapshotRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush and close all underlying handles.  Safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
