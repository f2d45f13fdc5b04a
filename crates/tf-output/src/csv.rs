//! CSV output backend.
//!
//! Creates two files in the output directory:
//! - `intersection_snapshots.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{IntersectionSnapshotRow, OutputResult, TickSummaryRow};

pub(crate) const INTERSECTION_COLUMNS: [&str; 8] =
    ["tick", "intersection", "row", "col", "phase", "green_mask", "ticks_in_phase", "queued"];

pub(crate) const SUMMARY_COLUMNS: [&str; 10] = [
    "tick",
    "elapsed_secs",
    "vehicles",
    "generated",
    "arrived",
    "moves",
    "capacity_rejections",
    "generation_rejections",
    "signal_holds",
    "switches",
];

pub struct CsvWriter {
    intersections: Writer<File>,
    summaries:     Writer<File>,
    finished:      bool,
}

impl CsvWriter {
    /// Create both files in `dir` and write their header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut intersections = Writer::from_path(dir.join("intersection_snapshots.csv"))?;
        intersections.write_record(INTERSECTION_COLUMNS)?;

        let mut summaries = Writer::from_path(dir.join("tick_summaries.csv"))?;
        summaries.write_record(SUMMARY_COLUMNS)?;

        Ok(Self { intersections, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_intersections(&mut self, rows: &[IntersectionSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.intersections.write_record(&[
                row.tick.to_string(),
                row.intersection.to_string(),
                row.row.to_string(),
                row.col.to_string(),
                row.phase.to_string(),
                row.green_mask.to_string(),
                row.ticks_in_phase.to_string(),
                row.queued.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.elapsed_secs.to_string(),
            row.vehicles.to_string(),
            row.generated.to_string(),
            row.arrived.to_string(),
            row.moves.to_string(),
            row.capacity_rejections.to_string(),
            row.generation_rejections.to_string(),
            row.signal_holds.to_string(),
            row.switches.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.intersections.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
