//! Per-segment FIFO queues.
//!
//! `SegmentStore<T>` is generic over the queued item so the grid crate does
//! not depend on the vehicle type; `tf-sim` instantiates it with
//! `tf_vehicle::Vehicle`.  Items are owned by exactly one queue at a time;
//! moving one between segments is a `pop_front` followed by a `push_back`.

use std::collections::VecDeque;

use tf_core::{Direction, IntersectionId, SegmentId};

use crate::{Grid, GridError, GridResult};

// ── Capacity ──────────────────────────────────────────────────────────────────

/// How many vehicles one segment may hold.  Fixed for the whole grid.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Capacity {
    /// Logical queue with no limit.
    #[default]
    Unbounded,
    /// At most `n` vehicles (`n >= 1`).
    Bounded(u32),
}

impl Capacity {
    /// `true` if a segment currently holding `occupied` vehicles can take one
    /// more.
    #[inline]
    pub fn admits(self, occupied: usize) -> bool {
        match self {
            Capacity::Unbounded  => true,
            Capacity::Bounded(n) => occupied < n as usize,
        }
    }

    pub fn limit(self) -> Option<u32> {
        match self {
            Capacity::Unbounded  => None,
            Capacity::Bounded(n) => Some(n),
        }
    }

    fn validate(self) -> GridResult<Self> {
        match self {
            Capacity::Bounded(0) => Err(GridError::InvalidCapacity),
            c => Ok(c),
        }
    }
}

/// Result of [`SegmentStore::push_back`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub enum PushOutcome<T> {
    Accepted,
    /// The segment was full; the item is handed back untouched.
    Full(T),
}

// ── SegmentStore ──────────────────────────────────────────────────────────────

/// One FIFO queue per directed segment, indexed by `SegmentId`.
///
/// The front of each queue is the item closest to the segment's destination
/// intersection.
#[derive(Clone, Debug)]
pub struct SegmentStore<T> {
    queues:   Vec<VecDeque<T>>,
    capacity: Capacity,
    /// Cached item count across all queues for O(1) `total_len()`.
    total:    usize,
}

impl<T> SegmentStore<T> {
    /// Allocate one empty queue per segment of `grid`.
    pub fn new(grid: &Grid, capacity: Capacity) -> GridResult<Self> {
        let capacity = capacity.validate()?;
        let mut queues = Vec::with_capacity(grid.segment_count());
        queues.resize_with(grid.segment_count(), VecDeque::new);
        Ok(Self { queues, capacity, total: 0 })
    }

    #[inline]
    pub fn capacity(&self) -> Capacity {
        self.capacity
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.queues.len()
    }

    /// Items across every segment.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.total
    }

    fn check(&self, seg: SegmentId) -> GridResult<usize> {
        let i = seg.index();
        if i < self.queues.len() {
            Ok(i)
        } else {
            Err(GridError::SegmentOutOfRange { id: seg, count: self.queues.len() })
        }
    }

    /// Read-only view of one queue.
    pub fn queue(&self, seg: SegmentId) -> GridResult<&VecDeque<T>> {
        let i = self.check(seg)?;
        Ok(&self.queues[i])
    }

    pub fn len(&self, seg: SegmentId) -> GridResult<usize> {
        Ok(self.queue(seg)?.len())
    }

    pub fn front(&self, seg: SegmentId) -> GridResult<Option<&T>> {
        Ok(self.queue(seg)?.front())
    }

    pub fn front_mut(&mut self, seg: SegmentId) -> GridResult<Option<&mut T>> {
        let i = self.check(seg)?;
        Ok(self.queues[i].front_mut())
    }

    /// `true` if `seg` could take one more item after `pending` further
    /// admissions already promised this tick.
    pub fn has_room(&self, seg: SegmentId, pending: usize) -> GridResult<bool> {
        Ok(self.capacity.admits(self.len(seg)? + pending))
    }

    /// Append `item` at the back of `seg`, refusing if the segment is full.
    pub fn push_back(&mut self, seg: SegmentId, item: T) -> GridResult<PushOutcome<T>> {
        let i = self.check(seg)?;
        if !self.capacity.admits(self.queues[i].len()) {
            return Ok(PushOutcome::Full(item));
        }
        self.queues[i].push_back(item);
        self.total += 1;
        Ok(PushOutcome::Accepted)
    }

    pub fn pop_front(&mut self, seg: SegmentId) -> GridResult<Option<T>> {
        let i = self.check(seg)?;
        let item = self.queues[i].pop_front();
        if item.is_some() {
            self.total -= 1;
        }
        Ok(item)
    }

    /// Queue length of every segment, indexed by `SegmentId`.
    pub fn lengths(&self) -> Vec<u32> {
        self.queues.iter().map(|q| q.len() as u32).collect()
    }

    /// Incoming queue length at `at` for each heading, indexed by
    /// `Direction::index()`.
    pub fn incoming_lengths(&self, grid: &Grid, at: IntersectionId) -> [u32; 4] {
        Direction::ALL.map(|heading| {
            let seg = grid.incoming_segment(at, heading);
            self.queues.get(seg.index()).map_or(0, |q| q.len() as u32)
        })
    }

    /// `(SegmentId, queue)` pairs in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &VecDeque<T>)> {
        self.queues
            .iter()
            .enumerate()
            .map(|(i, q)| (SegmentId(i as u32), q))
    }

    /// Mutable access to every queued item.  Queue membership cannot change
    /// through this iterator, so the cached total stays valid.
    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.queues.iter_mut().flat_map(|q| q.iter_mut())
    }
}
