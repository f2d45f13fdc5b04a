//! Grid-subsystem error type.

use thiserror::Error;

use tf_core::{IntersectionId, SegmentId};

/// Errors produced by `tf-grid`.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid grid dimensions {rows}x{cols}: both must be at least 1 and 4*rows*cols must fit in u32")]
    InvalidDimensions { rows: u32, cols: u32 },

    #[error("invalid segment capacity: bounded capacity must be at least 1")]
    InvalidCapacity,

    #[error("{id} out of range for a grid with {count} intersections")]
    IntersectionOutOfRange { id: IntersectionId, count: usize },

    #[error("coordinates ({row}, {col}) out of range for a {rows}x{cols} grid")]
    CoordinatesOutOfRange { row: u32, col: u32, rows: u32, cols: u32 },

    #[error("{id} out of range for a grid with {count} segments")]
    SegmentOutOfRange { id: SegmentId, count: usize },
}

pub type GridResult<T> = Result<T, GridError>;
