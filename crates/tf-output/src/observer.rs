//! `SimOutputObserver<W>` bridges `SimObserver` to an `OutputWriter`.

use std::sync::Arc;

use tf_core::{SimConfig, Tick};
use tf_sim::{GridSnapshot, SimObserver, SimStats, TickStats};

use crate::row::{IntersectionSnapshotRow, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes tick summaries and intersection snapshots
/// to any [`OutputWriter`] backend.
///
/// `SimObserver` methods cannot fail, so writer errors are stored.  After
/// the run returns, check with [`take_error`][Self::take_error].  Only the
/// first error is kept; later writes are still attempted.
pub struct SimOutputObserver<W: OutputWriter> {
    writer:             W,
    tick_duration_secs: u32,
    rows_written:       u64,
    last_error:         Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// `config` supplies the tick duration used for `elapsed_secs`.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            tick_duration_secs: config.tick_duration_secs,
            rows_written:       0,
            last_error:         None,
        }
    }

    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Intersection rows handed to the writer so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            if self.last_error.is_none() {
                log::error!("output write failed: {e}");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_tick_end(&mut self, stats: &TickStats) {
        let row = TickSummaryRow {
            tick:                  stats.tick.0,
            elapsed_secs:          stats.tick.0 * self.tick_duration_secs as u64,
            vehicles:              stats.vehicles,
            generated:             stats.generated,
            arrived:               stats.arrived,
            moves:                 stats.moves,
            capacity_rejections:   stats.capacity_rejections,
            generation_rejections: stats.generation_rejections,
            signal_holds:          stats.signal_holds,
            switches:              stats.switches,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GridSnapshot>) {
        let cols = snapshot.cols.max(1);
        let rows: Vec<IntersectionSnapshotRow> = snapshot
            .lights
            .iter()
            .zip(&snapshot.queued_at)
            .enumerate()
            .map(|(i, (light, &queued))| {
                let i = i as u32;
                IntersectionSnapshotRow {
                    tick:           snapshot.tick.0,
                    intersection:   i,
                    row:            i / cols,
                    col:            i % cols,
                    phase:          light.phase.0,
                    green_mask:     light.green.bits(),
                    ticks_in_phase: light.ticks_in_phase,
                    queued,
                }
            })
            .collect();

        if !rows.is_empty() {
            self.rows_written += rows.len() as u64;
            let result = self.writer.write_intersections(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick, _stats: &SimStats) {
        let result = self.writer.finish();
        self.store_err(result);
        log::info!("output finished at {final_tick}: {} intersection rows", self.rows_written);
    }
}
