//! Parquet output backend (feature `parquet`).
//!
//! Creates `intersection_snapshots.parquet` and `tick_summaries.parquet`.
//! Tick summaries are buffered and written in batches of
//! [`SUMMARY_BATCH`] rows.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, UInt8Builder, UInt16Builder, UInt32Builder, UInt64Builder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::writer::OutputWriter;
use crate::{IntersectionSnapshotRow, OutputResult, TickSummaryRow};

/// Tick summaries per record batch.
pub const SUMMARY_BATCH: usize = 1024;

fn intersection_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("tick",           DataType::UInt64, false),
        Field::new("intersection",   DataType::UInt32, false),
        Field::new("row",            DataType::UInt32, false),
        Field::new("col",            DataType::UInt32, false),
        Field::new("phase",          DataType::UInt16, false),
        Field::new("green_mask",     DataType::UInt8,  false),
        Field::new("ticks_in_phase", DataType::UInt32, false),
        Field::new("queued",         DataType::UInt32, false),
    ]))
}

fn summary_schema() -> Arc<Schema> {
    let fields = crate::csv::SUMMARY_COLUMNS
        .iter()
        .map(|name| Field::new(*name, DataType::UInt64, false))
        .collect::<Vec<_>>();
    Arc::new(Schema::new(fields))
}

fn snappy_props() -> WriterProperties {
    WriterProperties::builder().set_compression(Compression::SNAPPY).build()
}

/// Writes simulation output to two Parquet files.
///
/// `finish()` **must** be called to write the file footers; files written
/// without it cannot be opened by Parquet readers.
pub struct ParquetWriter {
    intersections:  Option<ArrowWriter<File>>,
    summaries:      Option<ArrowWriter<File>>,
    inter_schema:   Arc<Schema>,
    summ_schema:    Arc<Schema>,
    pending:        Vec<TickSummaryRow>,
}

impl ParquetWriter {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let inter_schema = intersection_schema();
        let summ_schema = summary_schema();

        let file = File::create(dir.join("intersection_snapshots.parquet"))?;
        let intersections = ArrowWriter::try_new(file, Arc::clone(&inter_schema), Some(snappy_props()))?;

        let file = File::create(dir.join("tick_summaries.parquet"))?;
        let summaries = ArrowWriter::try_new(file, Arc::clone(&summ_schema), Some(snappy_props()))?;

        Ok(Self {
            intersections: Some(intersections),
            summaries:     Some(summaries),
            inter_schema,
            summ_schema,
            pending:       Vec::with_capacity(SUMMARY_BATCH),
        })
    }

    fn flush_summaries(&mut self) -> OutputResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let column = |f: fn(&TickSummaryRow) -> u64| -> ArrayRef {
            let mut b = UInt64Builder::with_capacity(self.pending.len());
            for row in &self.pending {
                b.append_value(f(row));
            }
            Arc::new(b.finish())
        };
        let columns: Vec<ArrayRef> = vec![
            column(|r| r.tick),
            column(|r| r.elapsed_secs),
            column(|r| r.vehicles),
            column(|r| r.generated),
            column(|r| r.arrived),
            column(|r| r.moves),
            column(|r| r.capacity_rejections),
            column(|r| r.generation_rejections),
            column(|r| r.signal_holds),
            column(|r| r.switches),
        ];
        let batch = RecordBatch::try_new(Arc::clone(&self.summ_schema), columns)?;
        self.pending.clear();

        if let Some(writer) = self.summaries.as_mut() {
            writer.write(&batch)?;
        }
        Ok(())
    }
}

impl OutputWriter for ParquetWriter {
    fn write_intersections(&mut self, rows: &[IntersectionSnapshotRow]) -> OutputResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let Some(writer) = self.intersections.as_mut() else {
            return Ok(());
        };

        let mut ticks          = UInt64Builder::with_capacity(rows.len());
        let mut ids            = UInt32Builder::with_capacity(rows.len());
        let mut row_idx        = UInt32Builder::with_capacity(rows.len());
        let mut col_idx        = UInt32Builder::with_capacity(rows.len());
        let mut phases         = UInt16Builder::with_capacity(rows.len());
        let mut greens         = UInt8Builder::with_capacity(rows.len());
        let mut ticks_in_phase = UInt32Builder::with_capacity(rows.len());
        let mut queued         = UInt32Builder::with_capacity(rows.len());

        for r in rows {
            ticks.append_value(r.tick);
            ids.append_value(r.intersection);
            row_idx.append_value(r.row);
            col_idx.append_value(r.col);
            phases.append_value(r.phase);
            greens.append_value(r.green_mask);
            ticks_in_phase.append_value(r.ticks_in_phase);
            queued.append_value(r.queued);
        }

        let batch = RecordBatch::try_new(
            Arc::clone(&self.inter_schema),
            vec![
                Arc::new(ticks.finish()),
                Arc::new(ids.finish()),
                Arc::new(row_idx.finish()),
                Arc::new(col_idx.finish()),
                Arc::new(phases.finish()),
                Arc::new(greens.finish()),
                Arc::new(ticks_in_phase.finish()),
                Arc::new(queued.finish()),
            ],
        )?;
        writer.write(&batch)?;
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.pending.push(*row);
        if self.pending.len() >= SUMMARY_BATCH {
            self.flush_summaries()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.flush_summaries()?;
        if let Some(w) = self.intersections.take() {
            w.close()?;
        }
        if let Some(w) = self.summaries.take() {
            w.close()?;
        }
        Ok(())
    }
}
