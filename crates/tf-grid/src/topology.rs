//! The N×M torus of intersections.
//!
//! # Data layout
//!
//! `Grid` holds nothing but its dimensions.  Everything else is computed:
//!
//! ```text
//! IntersectionId = row * cols + col
//! SegmentId      = from.index() * 4 + heading.index()
//! neighbor       = ((row + d_row) mod rows, (col + d_col) mod cols)
//! ```
//!
//! Iteration order is always ascending ID (row-major for intersections),
//! which the tick loop relies on for reproducible results.

use tf_core::{Direction, IntersectionId, SegmentId};

use crate::{GridError, GridResult};

/// Source, destination, and heading of one directed segment.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SegmentEnds {
    pub from:    IntersectionId,
    pub to:      IntersectionId,
    pub heading: Direction,
}

/// Toroidal lattice of `rows × cols` intersections with periodic boundaries.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    rows: u32,
    cols: u32,
}

impl Grid {
    /// Build a `rows × cols` torus.
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidDimensions`] if either dimension is zero or the
    /// segment count (`4 * rows * cols`) does not fit in a `u32`.
    pub fn new(rows: u32, cols: u32) -> GridResult<Self> {
        let segments = (rows as u64) * (cols as u64) * 4;
        if rows == 0 || cols == 0 || segments >= u32::MAX as u64 {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> u32 {
        self.cols
    }

    #[inline]
    pub fn intersection_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.intersection_count() * 4
    }

    // ── Intersections ─────────────────────────────────────────────────────

    /// Checked `(row, col) → IntersectionId`.
    pub fn intersection_at(&self, row: u32, col: u32) -> GridResult<IntersectionId> {
        if row >= self.rows || col >= self.cols {
            return Err(GridError::CoordinatesOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(IntersectionId(row * self.cols + col))
    }

    /// `(row, col)` of an intersection.  The ID is assumed valid.
    #[inline]
    pub fn coords(&self, id: IntersectionId) -> (u32, u32) {
        (id.0 / self.cols, id.0 % self.cols)
    }

    #[inline]
    pub fn contains(&self, id: IntersectionId) -> bool {
        id.index() < self.intersection_count()
    }

    /// Returns `id` unchanged if it belongs to this grid.
    pub fn check_intersection(&self, id: IntersectionId) -> GridResult<IntersectionId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(GridError::IntersectionOutOfRange { id, count: self.intersection_count() })
        }
    }

    /// The adjacent intersection in `direction`.
    ///
    /// Total: thanks to the wraparound every direction resolves, so
    /// `neighbor(neighbor(x, d), d.opposite()) == x` for every `x` and `d`.
    pub fn neighbor(&self, id: IntersectionId, direction: Direction) -> IntersectionId {
        let (row, col) = self.coords(id);
        let (d_row, d_col) = direction.delta();
        let row = (row as i64 + d_row).rem_euclid(self.rows as i64) as u32;
        let col = (col as i64 + d_col).rem_euclid(self.cols as i64) as u32;
        IntersectionId(row * self.cols + col)
    }

    /// All intersections in row-major order.
    pub fn all_intersections(&self) -> impl Iterator<Item = IntersectionId> + use<> {
        (0..self.rows * self.cols).map(IntersectionId)
    }

    // ── Segments ──────────────────────────────────────────────────────────

    /// The segment leaving `from` in `heading`.
    #[inline]
    pub fn segment_id(&self, from: IntersectionId, heading: Direction) -> SegmentId {
        SegmentId(from.0 * 4 + heading.index() as u32)
    }

    /// The segment that arrives at `at` while travelling `heading`, i.e. the
    /// one leaving the neighbor on the opposite side.
    #[inline]
    pub fn incoming_segment(&self, at: IntersectionId, heading: Direction) -> SegmentId {
        self.segment_id(self.neighbor(at, heading.opposite()), heading)
    }

    #[inline]
    pub fn contains_segment(&self, id: SegmentId) -> bool {
        id.index() < self.segment_count()
    }

    /// Source, destination, and heading of `id`.
    pub fn segment_ends(&self, id: SegmentId) -> GridResult<SegmentEnds> {
        if !self.contains_segment(id) {
            return Err(GridError::SegmentOutOfRange { id, count: self.segment_count() });
        }
        let from = IntersectionId(id.0 / 4);
        let heading = Direction::ALL[(id.0 % 4) as usize];
        Ok(SegmentEnds { from, to: self.neighbor(from, heading), heading })
    }

    /// All segments in ascending `SegmentId` order, the stable iteration
    /// order of the movement engine.
    pub fn all_segments(&self) -> impl Iterator<Item = SegmentId> + use<> {
        (0..self.segment_count() as u32).map(SegmentId)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Shortest signed `(d_row, d_col)` from `from` to `to` on the torus.
    ///
    /// Each component lies in `(-n/2, n/2]` for its axis length `n`.
    pub fn wrapped_offset(&self, from: IntersectionId, to: IntersectionId) -> (i64, i64) {
        let (fr, fc) = self.coords(from);
        let (tr, tc) = self.coords(to);
        (
            wrap(tr as i64 - fr as i64, self.rows as i64),
            wrap(tc as i64 - fc as i64, self.cols as i64),
        )
    }

    /// Manhattan distance on the torus.
    pub fn distance(&self, from: IntersectionId, to: IntersectionId) -> u64 {
        let (dr, dc) = self.wrapped_offset(from, to);
        dr.unsigned_abs() + dc.unsigned_abs()
    }

    /// First heading of a shortest path from `from` to `to`, or `None` when
    /// they are the same intersection.
    ///
    /// The axis with the larger remaining offset is travelled first; on a tie
    /// the vehicle moves north/south first.
    pub fn heading_towards(&self, from: IntersectionId, to: IntersectionId) -> Option<Direction> {
        let (dr, dc) = self.wrapped_offset(from, to);
        if dr == 0 && dc == 0 {
            return None;
        }
        if dc.abs() > dr.abs() {
            Some(if dc > 0 { Direction::East } else { Direction::West })
        } else {
            Some(if dr > 0 { Direction::South } else { Direction::North })
        }
    }
}

/// Map `d` into `(-n/2, n/2]`.
fn wrap(d: i64, n: i64) -> i64 {
    let d = d.rem_euclid(n);
    if d > n / 2 { d - n } else { d }
}
