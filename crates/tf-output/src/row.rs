//! Plain row types written by the output backends.

/// Counters of one completed tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummaryRow {
    pub tick:                  u64,
    /// Simulated seconds at the start of `tick`.
    pub elapsed_secs:          u64,
    /// Vehicles on the grid after the tick.
    pub vehicles:              u64,
    pub generated:             u64,
    pub arrived:               u64,
    pub moves:                 u64,
    pub capacity_rejections:   u64,
    pub generation_rejections: u64,
    pub signal_holds:          u64,
    pub switches:              u64,
}

/// One intersection at an output tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionSnapshotRow {
    pub tick:           u64,
    pub intersection:   u32,
    pub row:            u32,
    pub col:            u32,
    /// Phase installed for the following tick.
    pub phase:          u16,
    /// Green headings as a bit mask: N = 1, E = 2, S = 4, W = 8.
    pub green_mask:     u8,
    pub ticks_in_phase: u32,
    /// Vehicles on the four incoming segments.
    pub queued:         u32,
}
