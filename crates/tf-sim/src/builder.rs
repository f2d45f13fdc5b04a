//! Fluent builder for constructing a [`Sim`].

use tf_core::{IntersectionId, SimConfig, Tick};
use tf_grid::{Capacity, Grid, SegmentStore};
use tf_signal::{ConflictSet, ControlStrategy, PhasePlan, TrafficLight};
use tf_vehicle::{EntryPoint, Generator};

use crate::{Sim, SimError, SimResult, TickStats};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: total ticks, seed, output interval, ...
/// - [`Grid`]: the torus dimensions
/// - at least one control strategy, via [`strategy`][Self::strategy] or
///   [`strategies`][Self::strategies]
///
/// # Optional inputs (have defaults)
///
/// | Method                    | Default                                   |
/// |---------------------------|-------------------------------------------|
/// | `.capacity(c)`            | `Capacity::Unbounded`                     |
/// | `.phase_plan(p)`          | `PhasePlan::default()` (N/S, then E/W)    |
/// | `.conflicts(c)`           | `ConflictSet::default()` (N/S × E/W)      |
/// | `.right_turn_on_red(b)`   | `false`                                   |
/// | `.bindings(v)`            | every intersection uses strategy 0        |
/// | `.entry_points(v)`        | none: the grid only drains                |
///
/// # Example
///
/// ```rust,ignore
/// let grid = Grid::new(3, 3)?;
/// let mut sim = SimBuilder::new(config, grid)
///     .strategy(FixedCycle::new(30, 0)?)
///     .capacity(Capacity::Bounded(8))
///     .entry_points(entries)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:            SimConfig,
    grid:              Grid,
    capacity:          Capacity,
    plan:              PhasePlan,
    conflicts:         ConflictSet,
    right_turn_on_red: bool,
    strategies:        Vec<Box<dyn ControlStrategy>>,
    bindings:          Option<Vec<usize>>,
    entries:           Vec<EntryPoint>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, grid: Grid) -> Self {
        Self {
            config,
            grid,
            capacity:          Capacity::Unbounded,
            plan:              PhasePlan::default(),
            conflicts:         ConflictSet::default(),
            right_turn_on_red: false,
            strategies:        Vec::new(),
            bindings:          None,
            entries:           Vec::new(),
        }
    }

    pub fn capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn phase_plan(mut self, plan: PhasePlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn conflicts(mut self, conflicts: ConflictSet) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Let a vehicle turning right cross while its heading is red.
    pub fn right_turn_on_red(mut self, enabled: bool) -> Self {
        self.right_turn_on_red = enabled;
        self
    }

    /// Use `strategy` at every intersection.  Replaces any strategies and
    /// bindings supplied earlier.
    pub fn strategy<S: ControlStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategies = vec![Box::new(strategy)];
        self.bindings = None;
        self
    }

    /// Supply a strategy table.  Without [`bindings`][Self::bindings] every
    /// intersection uses entry 0.
    pub fn strategies(mut self, strategies: Vec<Box<dyn ControlStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    /// Per-intersection index into the strategy table, indexed by
    /// `IntersectionId`.  Must have one entry per intersection.
    pub fn bindings(mut self, bindings: Vec<usize>) -> Self {
        self.bindings = Some(bindings);
        self
    }

    pub fn entry_point(mut self, entry: EntryPoint) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entry_points(mut self, entries: impl IntoIterator<Item = EntryPoint>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Validate every input, install each light's initial phase, and return
    /// a ready-to-run [`Sim`] at tick 0.
    pub fn build(self) -> SimResult<Sim> {
        let intersections = self.grid.intersection_count();

        // ── Signals ───────────────────────────────────────────────────────
        self.plan.validate(&self.conflicts)?;

        if self.strategies.is_empty() {
            return Err(SimError::Config("no control strategy supplied".into()));
        }

        let bindings = match self.bindings {
            Some(b) => {
                if b.len() != intersections {
                    return Err(SimError::BindingCountMismatch {
                        expected: intersections,
                        got:      b.len(),
                    });
                }
                if let Some((i, &idx)) = b.iter().enumerate().find(|(_, idx)| **idx >= self.strategies.len()) {
                    return Err(SimError::UnknownStrategy {
                        intersection: IntersectionId(i as u32),
                        strategy:     format!("#{idx}"),
                    });
                }
                b
            }
            None => vec![0; intersections],
        };

        let mut lights = Vec::with_capacity(intersections);
        for (i, &idx) in bindings.iter().enumerate() {
            let strategy = &self.strategies[idx];
            let initial = self.plan.check(strategy.initial_phase(&self.plan)).map_err(|source| {
                SimError::InvalidDecision {
                    tick:         Tick::ZERO,
                    intersection: IntersectionId(i as u32),
                    strategy:     strategy.name().to_string(),
                    source,
                }
            })?;
            lights.push(TrafficLight::new(initial));
        }

        // ── Vehicles ──────────────────────────────────────────────────────
        for entry in &self.entries {
            entry.validate(&self.grid)?;
        }
        let segments = SegmentStore::new(&self.grid, self.capacity)?;
        let entry_count = self.entries.len();
        let generator = Generator::new(self.entries, self.config.seed);

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        log::info!(
            "built {}x{} grid: {} segments, capacity {:?}, {} phases, {} strategies, {} entry points",
            self.grid.rows(),
            self.grid.cols(),
            self.grid.segment_count(),
            self.capacity,
            self.plan.len(),
            self.strategies.len(),
            entry_count,
        );

        Ok(Sim {
            clock:             self.config.make_clock(),
            config:            self.config,
            grid:              self.grid,
            segments,
            lights,
            plan:              self.plan,
            strategies:        self.strategies,
            bindings,
            generator,
            right_turn_on_red: self.right_turn_on_red,
            next_vehicle:      0,
            stats:             Default::default(),
            last:              TickStats::default(),
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}
