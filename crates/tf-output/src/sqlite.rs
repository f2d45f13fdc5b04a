//! SQLite output backend (feature `sqlite`).
//!
//! One `output.db` file with tables `intersection_snapshots` and
//! `tick_summaries`.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::writer::OutputWriter;
use crate::{IntersectionSnapshotRow, OutputResult, TickSummaryRow};

pub struct SqliteWriter {
    conn:     Connection,
    finished: bool,
}

impl SqliteWriter {
    /// Open (or create) `output.db` in `dir` and create the schema.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;
             CREATE TABLE IF NOT EXISTS intersection_snapshots (
                 tick           INTEGER NOT NULL,
                 intersection   INTEGER NOT NULL,
                 row            INTEGER NOT NULL,
                 col            INTEGER NOT NULL,
                 phase          INTEGER NOT NULL,
                 green_mask     INTEGER NOT NULL,
                 ticks_in_phase INTEGER NOT NULL,
                 queued         INTEGER NOT NULL,
                 PRIMARY KEY (tick, intersection)
             );
             CREATE TABLE IF NOT EXISTS tick_summaries (
                 tick                  INTEGER PRIMARY KEY,
                 elapsed_secs          INTEGER NOT NULL,
                 vehicles              INTEGER NOT NULL,
                 generated             INTEGER NOT NULL,
                 arrived               INTEGER NOT NULL,
                 moves                 INTEGER NOT NULL,
                 capacity_rejections   INTEGER NOT NULL,
                 generation_rejections INTEGER NOT NULL,
                 signal_holds          INTEGER NOT NULL,
                 switches              INTEGER NOT NULL
             );",
        )?;

        Ok(Self { conn, finished: false })
    }
}

impl OutputWriter for SqliteWriter {
    fn write_intersections(&mut self, rows: &[IntersectionSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO intersection_snapshots \
                 (tick, intersection, row, col, phase, green_mask, ticks_in_phase, queued) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for row in rows {
                stmt.execute(params![
                    row.tick as i64,
                    row.intersection,
                    row.row,
                    row.col,
                    row.phase,
                    row.green_mask,
                    row.ticks_in_phase,
                    row.queued,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.conn.execute(
            "INSERT INTO tick_summaries \
             (tick, elapsed_secs, vehicles, generated, arrived, moves, \
              capacity_rejections, generation_rejections, signal_holds, switches) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                row.tick as i64,
                row.elapsed_secs as i64,
                row.vehicles as i64,
                row.generated as i64,
                row.arrived as i64,
                row.moves as i64,
                row.capacity_rejections as i64,
                row.generation_rejections as i64,
                row.signal_holds as i64,
                row.switches as i64,
            ],
        )?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    }
}
