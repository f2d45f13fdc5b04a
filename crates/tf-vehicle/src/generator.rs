//! Per-tick generation attempts across all entry points.

use tf_core::{SimRng, Tick};

use crate::EntryPoint;

/// One generation attempt produced by [`Generator::due`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SpawnRequest {
    /// Index into [`Generator::entries`].
    pub entry: usize,
}

/// Owns the entry points and one RNG stream per entry point.
///
/// Streams are derived from the run seed in entry-point order, so a given
/// entry point fires on the same ticks regardless of which other entry points
/// exist after it.
#[derive(Clone, Debug)]
pub struct Generator {
    entries: Vec<EntryPoint>,
    streams: Vec<SimRng>,
}

/// Offset separating the generation root stream from other uses of the seed.
const GENERATION_STREAM: u64 = 0x6765_6e65_7261_7465;

impl Generator {
    pub fn new(entries: Vec<EntryPoint>, seed: u64) -> Self {
        let mut root = SimRng::new(seed ^ GENERATION_STREAM);
        let streams = (0..entries.len() as u64).map(|i| root.child(i)).collect();
        Self { entries, streams }
    }

    #[inline]
    pub fn entries(&self) -> &[EntryPoint] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry points attempting generation at `tick`, in entry-point order.
    ///
    /// Call exactly once per tick: probabilistic entry points advance their
    /// stream on every call.
    pub fn due(&mut self, tick: Tick) -> Vec<SpawnRequest> {
        self.entries
            .iter()
            .zip(self.streams.iter_mut())
            .enumerate()
            .filter_map(|(entry, (e, rng))| e.rate.fires(tick, rng).then_some(SpawnRequest { entry }))
            .collect()
    }
}
