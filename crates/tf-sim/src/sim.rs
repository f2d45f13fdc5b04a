//! The `Sim` struct and its tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use tf_core::{Direction, DirectionSet, IntersectionId, SegmentId, SimClock, SimConfig, Tick, Turn, VehicleId};
use tf_grid::{Grid, PushOutcome, SegmentStore};
use tf_signal::{ControlStrategy, Observation, PhaseIndex, PhasePlan, TrafficLight};
use tf_vehicle::{Generator, Vehicle, VehicleState};

use crate::snapshot::{LightView, VehiclePosition};
use crate::{GridSnapshot, NoopObserver, SimError, SimObserver, SimResult, SimStats, TickStats};

// ── Read-phase results ────────────────────────────────────────────────────────

/// What the front vehicle of one segment does this tick.
#[derive(Clone, Copy, Debug)]
enum FrontOutcome {
    Empty,
    /// Stopped by a red light.
    Held,
    Cross(Crossing),
}

#[derive(Clone, Copy, Debug)]
struct Crossing {
    source:  SegmentId,
    vehicle: VehicleId,
    kind:    CrossingKind,
}

#[derive(Clone, Copy, Debug)]
enum CrossingKind {
    /// Final crossing: the vehicle leaves the grid.
    Exit,
    Advance {
        dest:        SegmentId,
        heading:     Direction,
        arriving_at: IntersectionId,
    },
}

/// How a run loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Reached `config.total_ticks`.
    Completed,
    /// Stopped by the cancellation flag before starting tick `at`.
    Cancelled { at: Tick },
}

/// Borrowed pre-tick state shared by the (possibly parallel) read phase.
struct ReadView<'a> {
    grid:              &'a Grid,
    segments:          &'a SegmentStore<Vehicle>,
    plan:              &'a PhasePlan,
    phases:            &'a [PhaseIndex],
    right_turn_on_red: bool,
}

impl ReadView<'_> {
    fn front_outcome(&self, seg: SegmentId) -> SimResult<FrontOutcome> {
        let Some(v) = self.segments.front(seg)? else {
            return Ok(FrontOutcome::Empty);
        };
        let ends = self.grid.segment_ends(seg)?;
        let green = self.plan.green(self.phases[ends.to.index()]).unwrap_or(DirectionSet::EMPTY);

        let permitted = green.contains(ends.heading)
            || (self.right_turn_on_red && v.turn() == Some(Turn::Right));
        if !permitted {
            return Ok(FrontOutcome::Held);
        }

        let kind = if v.is_final_crossing(ends.to) {
            CrossingKind::Exit
        } else {
            CrossingKind::Advance {
                dest:        self.grid.segment_id(ends.to, v.next_heading),
                heading:     v.next_heading,
                arriving_at: self.grid.neighbor(ends.to, v.next_heading),
            }
        };
        Ok(FrontOutcome::Cross(Crossing { source: seg, vehicle: v.id, kind }))
    }
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// Holds the whole grid state and drives the tick loop.  Each tick runs in
/// a fixed order:
///
/// 1. **Pre-tick snapshot**: every light's phase and every segment length.
/// 2. **Movement**: the front vehicle of each segment (ascending
///    `SegmentId`) crosses if its light is green.  Crossings are granted in
///    that same order while the destination's pre-tick length plus earlier
///    grants stays below capacity; the rest count as capacity rejections.
/// 3. **Generation**: entry points insert new vehicles where there is room.
/// 4. **Removal**: vehicles on their final crossing leave the grid.
/// 5. **Signals**: every strategy picks the phase for the next tick from
///    pre-tick observations; all picks are validated, then applied together.
/// 6. **Clock**: advances by exactly one tick.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim {
    /// Run-level configuration (total ticks, seed, output interval, ...).
    pub config: SimConfig,

    pub(crate) clock:             SimClock,
    pub(crate) grid:              Grid,
    pub(crate) segments:          SegmentStore<Vehicle>,
    /// Indexed by `IntersectionId`.
    pub(crate) lights:            Vec<TrafficLight>,
    pub(crate) plan:              PhasePlan,
    pub(crate) strategies:        Vec<Box<dyn ControlStrategy>>,
    /// Index into `strategies` per intersection.
    pub(crate) bindings:          Vec<usize>,
    pub(crate) generator:         Generator,
    pub(crate) right_turn_on_red: bool,
    pub(crate) next_vehicle:      u64,
    pub(crate) stats:             SimStats,
    /// Counters of the most recent tick.
    pub(crate) last:              TickStats,
    #[cfg(feature = "parallel")]
    pub(crate) pool:              Option<rayon::ThreadPool>,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// Advance exactly one tick.
    pub fn step(&mut self) -> SimResult<TickStats> {
        self.step_with(&mut NoopObserver)
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step_with(observer)?;
        }
        Ok(())
    }

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let never = AtomicBool::new(false);
        self.run_until(observer, &never).map(|_| ())
    }

    /// Like [`run`][Self::run], but checks `cancel` before every tick and
    /// stops cleanly once it is set.  A tick in progress always completes.
    pub fn run_until<O: SimObserver>(
        &mut self,
        observer: &mut O,
        cancel:   &AtomicBool,
    ) -> SimResult<RunOutcome> {
        let end = self.config.end_tick();
        log::info!("running from {} to {end}", self.clock.current_tick());

        let outcome = loop {
            let now = self.clock.current_tick();
            if now >= end {
                break RunOutcome::Completed;
            }
            if cancel.load(Ordering::Relaxed) {
                log::info!("cancelled before {now}");
                break RunOutcome::Cancelled { at: now };
            }
            self.step_with(observer)?;
        };

        let final_tick = self.clock.current_tick();
        log::info!(
            "stopped at {final_tick}: {} vehicles, {} generated, {} arrived",
            self.vehicle_count(),
            self.stats.generated,
            self.stats.arrived,
        );
        observer.on_sim_end(final_tick, &self.stats);
        Ok(outcome)
    }

    /// The next tick to be processed.
    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick()
    }

    #[inline]
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    #[inline]
    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Counters of the most recently completed tick.
    #[inline]
    pub fn last_tick_stats(&self) -> &TickStats {
        &self.last
    }

    #[inline]
    pub fn vehicle_count(&self) -> usize {
        self.segments.total_len()
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn segments(&self) -> &SegmentStore<Vehicle> {
        &self.segments
    }

    #[inline]
    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    pub fn light(&self, at: IntersectionId) -> Option<&TrafficLight> {
        self.lights.get(at.index())
    }

    /// Name of the strategy bound to `at`.
    pub fn strategy_name(&self, at: IntersectionId) -> Option<&str> {
        let idx = *self.bindings.get(at.index())?;
        Some(self.strategies[idx].name())
    }

    /// Owned copy of the current state, as handed to observers.
    pub fn snapshot(&self) -> GridSnapshot {
        self.build_snapshot(self.last.clone())
    }

    // ── Tick driver ───────────────────────────────────────────────────────

    fn step_with<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickStats> {
        let now = self.clock.current_tick();
        observer.on_tick_start(now);

        let stats = self.process_tick(now)?;
        self.stats.absorb(&stats, self.grid.segment_count());
        self.last = stats.clone();
        self.clock.advance();

        log::debug!(
            "{now}: {} vehicles, +{} -{} moved {} held {} rejected {}/{} switched {}",
            stats.vehicles,
            stats.generated,
            stats.arrived,
            stats.moves,
            stats.signal_holds,
            stats.capacity_rejections,
            stats.generation_rejections,
            stats.switches,
        );

        observer.on_tick_end(&stats);
        if self.config.is_output_tick(now) && observer.wants_snapshots() {
            let snapshot = Arc::new(self.build_snapshot(stats.clone()));
            observer.on_snapshot(&snapshot);
        }
        Ok(stats)
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self, now: Tick) -> SimResult<TickStats> {
        let mut stats = TickStats { tick: now, ..TickStats::default() };
        let before = self.segments.total_len() as u64;

        // ── ① Pre-tick state ──────────────────────────────────────────────
        let phases: Vec<PhaseIndex> = self.lights.iter().map(TrafficLight::phase).collect();
        let pre_len = self.segments.lengths();

        // ── ② Read phase: front crossings and next-tick decisions ─────────
        //
        // Nothing is mutated until every read is done, so the parallel and
        // sequential paths see identical inputs.
        let outcomes = self.read_fronts(&phases)?;
        let decisions = self.decide_all(now.next(), &pre_len);
        self.check_decisions(now.next(), &decisions)?;

        // ── ② Write phase: grant crossings in source-segment order ────────
        let capacity = self.segments.capacity();
        let mut granted: FxHashMap<SegmentId, u32> = FxHashMap::default();
        let mut moves = Vec::new();
        let mut exits = Vec::new();

        for outcome in outcomes {
            match outcome {
                FrontOutcome::Empty => {}
                FrontOutcome::Held => stats.signal_holds += 1,
                FrontOutcome::Cross(c) => match c.kind {
                    CrossingKind::Exit => exits.push(c),
                    CrossingKind::Advance { dest, .. } => {
                        let pending = granted.entry(dest).or_insert(0);
                        let occupied = pre_len[dest.index()] as usize + *pending as usize;
                        if capacity.admits(occupied) {
                            *pending += 1;
                            moves.push(c);
                        } else {
                            stats.capacity_rejections += 1;
                            log::trace!("{now}: {} refused entry to full {dest}", c.vehicle);
                        }
                    }
                },
            }
        }

        for c in &moves {
            let CrossingKind::Advance { dest, heading, arriving_at } = c.kind else {
                continue;
            };
            let mut v = self.take_front(c, now)?;
            v.enter(dest, heading, arriving_at, now, &self.grid);
            if let PushOutcome::Full(v) = self.segments.push_back(dest, v)? {
                return Err(SimError::integrity(now, format!("{} overflowed admitted {dest}", v.id)));
            }
            stats.moves += 1;
        }

        // ── ③ Generation ──────────────────────────────────────────────────
        for request in self.generator.due(now) {
            let entry = self.generator.entries()[request.entry].clone();
            let seg = self.grid.incoming_segment(entry.at, entry.heading);
            if !self.segments.has_room(seg, 0)? {
                stats.generation_rejections += 1;
                log::trace!("{now}: entry point {} blocked, {seg} full", request.entry);
                continue;
            }
            let id = VehicleId(self.next_vehicle);
            self.next_vehicle += 1;
            let v = Vehicle::new(
                id,
                seg,
                entry.heading,
                entry.at,
                entry.route,
                entry.trip_hops,
                now,
                self.config.seed,
                &self.grid,
            );
            if let PushOutcome::Full(v) = self.segments.push_back(seg, v)? {
                return Err(SimError::integrity(now, format!("{} overflowed {seg} with room", v.id)));
            }
            stats.generated += 1;
        }

        // ── ④ Removal ─────────────────────────────────────────────────────
        for c in &exits {
            let mut v = self.take_front(c, now)?;
            v.hops += 1;
            v.state = VehicleState::Arrived;
            stats.arrived += 1;
            stats.trip_ticks += v.trip_ticks(now);
            stats.wait_ticks += v.wait_ticks;
        }

        // ── ⑤ Apply next-tick phases ──────────────────────────────────────
        for (light, next) in self.lights.iter_mut().zip(decisions) {
            if light.apply(next) {
                stats.switches += 1;
            }
        }

        // ── Post-tick checks and bookkeeping ──────────────────────────────
        let after = self.segments.total_len() as u64;
        if before + stats.generated != after + stats.arrived {
            return Err(SimError::integrity(
                now,
                format!(
                    "vehicle count not conserved: {before} before, +{} generated, -{} arrived, {after} after",
                    stats.generated, stats.arrived,
                ),
            ));
        }

        for v in self.segments.items_mut() {
            if v.last_moved != now {
                v.hold();
            }
        }

        if self.config.verify_integrity {
            self.verify_integrity(now)?;
        }

        stats.vehicles = after;
        Ok(stats)
    }

    /// Pop the front of `c.source`, checking it is the vehicle the read phase
    /// saw there.
    fn take_front(&mut self, c: &Crossing, now: Tick) -> SimResult<Vehicle> {
        match self.segments.pop_front(c.source)? {
            Some(v) if v.id == c.vehicle => Ok(v),
            Some(v) => Err(SimError::integrity(
                now,
                format!("expected {} at the front of {}, found {}", c.vehicle, c.source, v.id),
            )),
            None => Err(SimError::integrity(
                now,
                format!("{} vanished from {}", c.vehicle, c.source),
            )),
        }
    }

    /// Front outcome of every segment, in ascending `SegmentId` order.
    fn read_fronts(&self, phases: &[PhaseIndex]) -> SimResult<Vec<FrontOutcome>> {
        let view = ReadView {
            grid:              &self.grid,
            segments:          &self.segments,
            plan:              &self.plan,
            phases,
            right_turn_on_red: self.right_turn_on_red,
        };

        #[cfg(not(feature = "parallel"))]
        {
            self.grid.all_segments().map(|seg| view.front_outcome(seg)).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let count = self.grid.segment_count() as u32;
            let run = || -> SimResult<Vec<FrontOutcome>> {
                (0..count)
                    .into_par_iter()
                    .map(|i| view.front_outcome(SegmentId(i)))
                    .collect()
            };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }
    }

    /// Each intersection's strategy decision for `next`, indexed by
    /// `IntersectionId`.  Observations use the pre-tick phase, timer,
    /// `pre_len` queue lengths and queued wait ticks; no segment has been
    /// touched yet when this runs.
    fn decide_all(&self, next: Tick, pre_len: &[u32]) -> Vec<PhaseIndex> {
        let decide = |i: usize| -> PhaseIndex {
            let at = IntersectionId(i as u32);
            let light = &self.lights[i];
            let incoming = Direction::ALL.map(|d| self.grid.incoming_segment(at, d));
            let queues = incoming.map(|seg| pre_len[seg.index()]);
            let waits = incoming.map(|seg| {
                self.segments
                    .queue(seg)
                    .map_or(0, |q| q.iter().map(|v| v.wait_ticks).sum::<u64>())
            });
            let obs = Observation {
                intersection:   at,
                phase:          light.phase(),
                ticks_in_phase: light.ticks_in_phase(),
                queues,
                waits,
                plan:           &self.plan,
            };
            self.strategies[self.bindings[i]].decide(&obs, next)
        };

        #[cfg(not(feature = "parallel"))]
        {
            (0..self.lights.len()).map(decide).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let count = self.lights.len();
            let run = || -> Vec<PhaseIndex> { (0..count).into_par_iter().map(decide).collect() };
            match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            }
        }
    }

    fn check_decisions(&self, next: Tick, decisions: &[PhaseIndex]) -> SimResult<()> {
        for (i, &phase) in decisions.iter().enumerate() {
            self.plan.check(phase).map_err(|source| SimError::InvalidDecision {
                tick:         next,
                intersection: IntersectionId(i as u32),
                strategy:     self.strategies[self.bindings[i]].name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Full O(vehicles) consistency scan.
    fn verify_integrity(&self, now: Tick) -> SimResult<()> {
        let mut seen: FxHashSet<VehicleId> = FxHashSet::default();
        seen.reserve(self.segments.total_len());

        for (seg, queue) in self.segments.iter() {
            let ends = self
                .grid
                .segment_ends(seg)
                .map_err(|e| SimError::integrity(now, e.to_string()))?;
            for v in queue {
                if !seen.insert(v.id) {
                    return Err(SimError::integrity(now, format!("{} found in two segments", v.id)));
                }
                if v.segment != seg {
                    return Err(SimError::integrity(
                        now,
                        format!("{} records {} but is queued on {seg}", v.id, v.segment),
                    ));
                }
                if v.heading != ends.heading {
                    return Err(SimError::integrity(
                        now,
                        format!("{} heads {} on a {} segment", v.id, v.heading, ends.heading),
                    ));
                }
                if v.state == VehicleState::Arrived {
                    return Err(SimError::integrity(now, format!("arrived {} still queued on {seg}", v.id)));
                }
            }
        }
        Ok(())
    }

    fn build_snapshot(&self, stats: TickStats) -> GridSnapshot {
        let lights: Vec<LightView> = self
            .lights
            .iter()
            .map(|l| LightView {
                phase:          l.phase(),
                green:          self.plan.green(l.phase()).unwrap_or(DirectionSet::EMPTY),
                ticks_in_phase: l.ticks_in_phase(),
            })
            .collect();

        let queued_at: Vec<u32> = self
            .grid
            .all_intersections()
            .map(|at| self.segments.incoming_lengths(&self.grid, at).iter().sum::<u32>())
            .collect();

        let vehicles: Vec<VehiclePosition> = self
            .segments
            .iter()
            .flat_map(|(segment, queue)| {
                queue.iter().enumerate().map(move |(position, v)| VehiclePosition {
                    id: v.id,
                    segment,
                    position: position as u32,
                    moving: v.state == VehicleState::Moving,
                })
            })
            .collect();

        GridSnapshot {
            tick:           stats.tick,
            rows:           self.grid.rows(),
            cols:           self.grid.cols(),
            lights,
            segment_counts: self.segments.lengths(),
            queued_at,
            vehicles,
            stats,
        }
    }
}
