//! Integration tests for tf-sim.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tf_core::{Direction, IntersectionId, SegmentId, SimConfig, Tick, VehicleId};
use tf_grid::{Capacity, Grid};
use tf_signal::{ControlStrategy, FixedCycle, HoldPhase, Observation, PhaseIndex, PhasePlan};
use tf_vehicle::{EntryPoint, GenerationRate, RoutePolicy, TurnWeights};

use crate::{GridSnapshot, SimObserver, SimStats, TickStats};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(total_ticks: u64) -> SimConfig {
    SimConfig {
        tick_duration_secs:    1,
        total_ticks,
        seed:                  42,
        num_threads:           Some(1),
        output_interval_ticks: 1,
        verify_integrity:      true,
    }
}

/// Fires at tick 0 and then never again within a test run.
fn once() -> GenerationRate {
    GenerationRate::Interval { every: 1_000_000, offset: 0 }
}

fn entry(grid: &Grid, row: u32, col: u32, heading: Direction, rate: GenerationRate) -> EntryPoint {
    EntryPoint {
        at: grid.intersection_at(row, col).unwrap(),
        heading,
        rate,
        route: RoutePolicy::Straight,
        trip_hops: None,
    }
}

fn only(straight: f64, left: f64, right: f64) -> RoutePolicy {
    RoutePolicy::RandomTurn(TurnWeights { straight, left, right })
}

/// Records everything it is shown.
#[derive(Default)]
struct Recorder {
    ticks:     Vec<TickStats>,
    snapshots: Vec<Arc<GridSnapshot>>,
    ended:     Option<(Tick, SimStats)>,
}

impl SimObserver for Recorder {
    fn on_tick_end(&mut self, stats: &TickStats) {
        self.ticks.push(stats.clone());
    }

    fn on_snapshot(&mut self, snapshot: &Arc<GridSnapshot>) {
        self.snapshots.push(Arc::clone(snapshot));
    }

    fn on_sim_end(&mut self, final_tick: Tick, stats: &SimStats) {
        self.ended = Some((final_tick, stats.clone()));
    }
}

/// Always answers with a fixed phase index, valid or not.
struct Stubborn {
    initial: PhaseIndex,
    decide:  PhaseIndex,
}

impl ControlStrategy for Stubborn {
    fn name(&self) -> &str {
        "stubborn"
    }

    fn initial_phase(&self, _plan: &PhasePlan) -> PhaseIndex {
        self.initial
    }

    fn decide(&self, _obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
        self.decide
    }
}

/// A busy 4×4 run: random turns, bounded segments, four entry points.
fn busy_sim(seed: u64, total_ticks: u64) -> crate::Sim {
    let grid = Grid::new(4, 4).unwrap();
    let sources = [
        (0, 0, Direction::East),
        (1, 2, Direction::South),
        (3, 3, Direction::West),
        (2, 1, Direction::North),
    ];
    let entries: Vec<EntryPoint> = sources
        .into_iter()
        .map(|(r, c, h)| EntryPoint {
            route: RoutePolicy::RandomTurn(TurnWeights::default()),
            trip_hops: Some(6),
            ..entry(&grid, r, c, h, GenerationRate::Probability { p: 0.3 })
        })
        .collect();
    let config = SimConfig { seed, ..test_config(total_ticks) };
    crate::SimBuilder::new(config, grid)
        .strategy(FixedCycle::new(3, 0).unwrap())
        .capacity(Capacity::Bounded(3))
        .entry_points(entries)
        .build()
        .unwrap()
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use tf_core::DirectionSet;
    use tf_signal::ConflictSet;
    use crate::{SimBuilder, SimError};

    #[test]
    fn builds_with_defaults() {
        let sim = SimBuilder::new(test_config(10), Grid::new(3, 4).unwrap())
            .strategy(HoldPhase)
            .build()
            .unwrap();
        assert_eq!(sim.current_tick(), Tick::ZERO);
        assert_eq!(sim.vehicle_count(), 0);
        assert_eq!(sim.grid().segment_count(), 48);
        assert_eq!(sim.strategy_name(IntersectionId(11)), Some("hold"));
        assert_eq!(sim.light(IntersectionId(0)).unwrap().phase(), PhaseIndex(0));
    }

    #[test]
    fn missing_strategy_errors() {
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap()).build();
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn binding_count_mismatch_errors() {
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategy(HoldPhase)
            .bindings(vec![0; 3])
            .build();
        assert!(matches!(result, Err(SimError::BindingCountMismatch { expected: 4, got: 3 })));
    }

    #[test]
    fn binding_out_of_table_errors() {
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategy(HoldPhase)
            .bindings(vec![0, 0, 1, 0])
            .build();
        match result {
            Err(SimError::UnknownStrategy { intersection, .. }) => assert_eq!(intersection, IntersectionId(2)),
            other => panic!("expected UnknownStrategy, got {:?}", other.err()),
        }
    }

    #[test]
    fn mixed_bindings_resolve_per_intersection() {
        let strategies: Vec<Box<dyn ControlStrategy>> =
            vec![Box::new(HoldPhase), Box::new(FixedCycle::new(5, 0).unwrap())];
        let sim = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategies(strategies)
            .bindings(vec![0, 1, 1, 0])
            .build()
            .unwrap();
        assert_eq!(sim.strategy_name(IntersectionId(0)), Some("hold"));
        assert_eq!(sim.strategy_name(IntersectionId(1)), Some("fixed_cycle"));
        assert_eq!(sim.strategy_name(IntersectionId(4)), None);
    }

    #[test]
    fn conflicting_phase_plan_errors() {
        let plan = PhasePlan::new(vec![DirectionSet::single(Direction::North).with(Direction::East)]);
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategy(HoldPhase)
            .phase_plan(plan.clone())
            .build();
        assert!(matches!(result, Err(SimError::Signal(_))));

        // The same plan is fine once nothing conflicts.
        assert!(
            SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
                .strategy(HoldPhase)
                .phase_plan(plan)
                .conflicts(ConflictSet::none())
                .build()
                .is_ok()
        );
    }

    #[test]
    fn invalid_initial_phase_errors() {
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategy(Stubborn { initial: PhaseIndex(9), decide: PhaseIndex(0) })
            .build();
        match result {
            Err(SimError::InvalidDecision { tick, strategy, .. }) => {
                assert_eq!(tick, Tick::ZERO);
                assert_eq!(strategy, "stubborn");
            }
            other => panic!("expected InvalidDecision, got {:?}", other.err()),
        }
    }

    #[test]
    fn invalid_entry_point_errors() {
        let grid = Grid::new(2, 2).unwrap();
        let bad = EntryPoint { trip_hops: Some(0), ..entry(&grid, 0, 0, Direction::East, once()) };
        let result = SimBuilder::new(test_config(10), grid).strategy(HoldPhase).entry_point(bad).build();
        assert!(matches!(result, Err(SimError::Vehicle(_))));
    }

    #[test]
    fn overflowing_turn_weights_fail_at_build() {
        let grid = Grid::new(3, 3).unwrap();
        let bad = EntryPoint { route: only(1e308, 1e308, 1e308), ..entry(&grid, 0, 0, Direction::East, once()) };
        let result = SimBuilder::new(test_config(10), grid).strategy(HoldPhase).entry_point(bad).build();
        assert!(matches!(
            result,
            Err(SimError::Vehicle(tf_vehicle::VehicleError::InvalidTurnWeights(_)))
        ));
    }

    #[test]
    fn zero_capacity_errors() {
        let result = SimBuilder::new(test_config(10), Grid::new(2, 2).unwrap())
            .strategy(HoldPhase)
            .capacity(Capacity::Bounded(0))
            .build();
        assert!(matches!(result, Err(SimError::Grid(_))));
    }
}

// ── Movement ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod movement {
    use super::*;
    use tf_core::Axis;
    use tf_vehicle::VehicleState;
    use crate::SimBuilder;

    /// 3×3, east/west green first, two-tick cycle, one eastbound vehicle
    /// generated at (0, 0) at tick 0.
    fn eastbound() -> crate::Sim {
        let grid = Grid::new(3, 3).unwrap();
        let e = entry(&grid, 0, 0, Direction::East, once());
        SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(Axis::EastWest))
            .strategy(FixedCycle::new(2, 0).unwrap())
            .entry_point(e)
            .build()
            .unwrap()
    }

    #[test]
    fn generated_vehicle_crosses_its_entry_intersection() {
        let mut sim = eastbound();
        let grid = *sim.grid();
        let origin = grid.intersection_at(0, 0).unwrap();

        let t0 = sim.step().unwrap();
        assert_eq!(t0.generated, 1);
        let spawn_seg = grid.incoming_segment(origin, Direction::East);
        assert_eq!(sim.segments().len(spawn_seg).unwrap(), 1);

        let t1 = sim.step().unwrap();
        assert_eq!(t1.moves, 1);
        let seg = grid.segment_id(origin, Direction::East);
        let v = sim.segments().front(seg).unwrap().unwrap();
        assert_eq!(v.id, VehicleId(0));
        assert_eq!(v.hops, 1);
        assert_eq!(v.state, VehicleState::Moving);
    }

    #[test]
    fn red_light_holds_front_vehicle() {
        let mut sim = eastbound();
        let grid = *sim.grid();
        let seg = grid.segment_id(grid.intersection_at(0, 0).unwrap(), Direction::East);

        sim.run_ticks(2, &mut crate::NoopObserver).unwrap();
        // Ticks 2 and 3 are north/south green.
        let t2 = sim.step().unwrap();
        assert_eq!(t2.signal_holds, 1);
        assert_eq!(t2.moves, 0);
        sim.step().unwrap();

        let v = sim.segments().front(seg).unwrap().unwrap();
        assert_eq!(v.wait_ticks, 2);
        assert_eq!(v.state, VehicleState::Queued);

        // Tick 4 is east/west green again.
        sim.step().unwrap();
        let next = grid.segment_id(grid.intersection_at(0, 1).unwrap(), Direction::East);
        assert_eq!(sim.segments().front(next).unwrap().unwrap().id, VehicleId(0));
        assert_eq!(sim.segments().len(seg).unwrap(), 0);
    }

    #[test]
    fn straight_vehicle_wraps_around_the_torus() {
        let grid = Grid::new(3, 3).unwrap();
        let e = entry(&grid, 0, 0, Direction::East, once());
        let mut sim = SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(Axis::EastWest))
            .strategy(HoldPhase)
            .entry_point(e)
            .build()
            .unwrap();

        // Spawn, then three crossings: (0,0), (0,1), (0,2).
        sim.run_ticks(4, &mut crate::NoopObserver).unwrap();
        let seg = grid.segment_id(grid.intersection_at(0, 2).unwrap(), Direction::East);
        let v = sim.segments().front(seg).unwrap().unwrap();
        assert_eq!(grid.segment_ends(seg).unwrap().to, grid.intersection_at(0, 0).unwrap());
        assert_eq!(v.hops, 3);
        assert_eq!(sim.stats().arrived, 0);
    }

    #[test]
    fn trip_hops_end_the_trip() {
        let grid = Grid::new(3, 3).unwrap();
        let e = EntryPoint { trip_hops: Some(2), ..entry(&grid, 0, 0, Direction::East, once()) };
        let mut sim = SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(Axis::EastWest))
            .strategy(HoldPhase)
            .entry_point(e)
            .build()
            .unwrap();

        sim.step().unwrap();
        sim.step().unwrap();
        let t2 = sim.step().unwrap();
        assert_eq!(t2.arrived, 1);
        assert_eq!(t2.trip_ticks, 2);
        assert_eq!(t2.vehicles, 0);
        assert_eq!(sim.vehicle_count(), 0);
        assert_eq!(sim.stats().mean_trip_ticks(), 2.0);
    }

    #[test]
    fn destination_vehicle_leaves_at_target() {
        let grid = Grid::new(3, 3).unwrap();
        let target = grid.intersection_at(0, 1).unwrap();
        let e = EntryPoint {
            route: RoutePolicy::Destination { target },
            ..entry(&grid, 0, 0, Direction::East, once())
        };
        let mut sim = SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(Axis::EastWest))
            .strategy(HoldPhase)
            .entry_point(e)
            .build()
            .unwrap();

        sim.run_ticks(2, &mut crate::NoopObserver).unwrap();
        assert_eq!(sim.vehicle_count(), 1);
        let t2 = sim.step().unwrap();
        assert_eq!(t2.arrived, 1);
        assert_eq!(sim.vehicle_count(), 0);
    }

    #[test]
    fn exit_still_needs_green() {
        let grid = Grid::new(3, 3).unwrap();
        let e = EntryPoint { trip_hops: Some(1), ..entry(&grid, 0, 0, Direction::East, once()) };
        // North/south green forever: the eastbound vehicle can never leave.
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(HoldPhase)
            .entry_point(e)
            .build()
            .unwrap();

        sim.run_ticks(10, &mut crate::NoopObserver).unwrap();
        assert_eq!(sim.stats().arrived, 0);
        assert_eq!(sim.stats().signal_holds, 9);
        assert_eq!(sim.vehicle_count(), 1);
    }

    #[test]
    fn right_turn_on_red_is_opt_in() {
        let build = |rtor: bool| {
            let grid = Grid::new(3, 3).unwrap();
            let e = EntryPoint { route: only(0.0, 0.0, 1.0), ..entry(&grid, 1, 1, Direction::North, once()) };
            SimBuilder::new(test_config(100), grid)
                .phase_plan(PhasePlan::two_phase(Axis::EastWest))
                .strategy(HoldPhase)
                .right_turn_on_red(rtor)
                .entry_point(e)
                .build()
                .unwrap()
        };

        let mut strict = build(false);
        strict.run_ticks(2, &mut crate::NoopObserver).unwrap();
        assert_eq!(strict.stats().moves, 0);
        assert_eq!(strict.stats().signal_holds, 1);

        let mut lenient = build(true);
        lenient.run_ticks(2, &mut crate::NoopObserver).unwrap();
        assert_eq!(lenient.stats().moves, 1);
        let grid = *lenient.grid();
        let east = grid.segment_id(grid.intersection_at(1, 1).unwrap(), Direction::East);
        assert_eq!(lenient.segments().len(east).unwrap(), 1);
    }
}

// ── Capacity ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod capacity {
    use super::*;
    use crate::SimBuilder;

    #[test]
    fn contended_slot_goes_to_lowest_segment() {
        // A southbound left-turner and a northbound right-turner both want
        // the eastbound segment out of (1, 1), which holds one vehicle.
        let grid = Grid::new(3, 3).unwrap();
        let b = grid.intersection_at(1, 1).unwrap();
        let southbound = EntryPoint { route: only(0.0, 1.0, 0.0), ..entry(&grid, 1, 1, Direction::South, once()) };
        let northbound = EntryPoint { route: only(0.0, 0.0, 1.0), ..entry(&grid, 1, 1, Direction::North, once()) };
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(HoldPhase)
            .capacity(Capacity::Bounded(1))
            .entry_point(southbound)
            .entry_point(northbound)
            .build()
            .unwrap();

        let from_north = grid.incoming_segment(b, Direction::South);
        let from_south = grid.incoming_segment(b, Direction::North);
        assert!(from_north < from_south);

        let t0 = sim.step().unwrap();
        assert_eq!(t0.generated, 2);

        let t1 = sim.step().unwrap();
        assert_eq!(t1.moves, 1);
        assert_eq!(t1.capacity_rejections, 1);

        let east = grid.segment_id(b, Direction::East);
        assert_eq!(sim.segments().front(east).unwrap().unwrap().id, VehicleId(0));
        assert_eq!(sim.segments().front(from_south).unwrap().unwrap().id, VehicleId(1));
        assert_eq!(sim.segments().len(from_north).unwrap(), 0);
    }

    #[test]
    fn departures_do_not_free_space_in_the_same_tick() {
        // Two eastbound vehicles in a row on a capacity-1 road: the leader
        // leaves (0, 1)'s incoming segment in the same tick the follower
        // would need it, so the follower waits one tick.
        let grid = Grid::new(1, 4).unwrap();
        let lead = entry(&grid, 0, 1, Direction::East, once());
        let follow = entry(&grid, 0, 0, Direction::East, once());
        let mut sim = SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(tf_core::Axis::EastWest))
            .strategy(HoldPhase)
            .capacity(Capacity::Bounded(1))
            .entry_point(lead)
            .entry_point(follow)
            .build()
            .unwrap();

        sim.step().unwrap();
        let t1 = sim.step().unwrap();
        assert_eq!(t1.moves, 1);
        assert_eq!(t1.capacity_rejections, 1);

        let t2 = sim.step().unwrap();
        assert_eq!(t2.moves, 2);
        assert_eq!(t2.capacity_rejections, 0);
    }

    #[test]
    fn generation_uses_room_freed_this_tick() {
        // The entry segment of (0, 1) holds one vehicle.  When it crosses,
        // the vehicle generated in the same tick takes its place.
        let grid = Grid::new(1, 4).unwrap();
        let e = entry(&grid, 0, 1, Direction::East, GenerationRate::Interval { every: 1, offset: 0 });
        let mut sim = SimBuilder::new(test_config(100), grid)
            .phase_plan(PhasePlan::two_phase(tf_core::Axis::EastWest))
            .strategy(HoldPhase)
            .capacity(Capacity::Bounded(1))
            .entry_point(e)
            .build()
            .unwrap();

        assert_eq!(sim.step().unwrap().generated, 1);
        let t1 = sim.step().unwrap();
        assert_eq!(t1.moves, 1);
        assert_eq!(t1.generated, 1);
        assert_eq!(t1.generation_rejections, 0);
        let spawn = grid.incoming_segment(grid.intersection_at(0, 1).unwrap(), Direction::East);
        assert_eq!(sim.segments().front(spawn).unwrap().unwrap().id, VehicleId(1));
    }

    #[test]
    fn generation_rejected_on_full_segment() {
        let grid = Grid::new(3, 3).unwrap();
        let e = entry(&grid, 0, 0, Direction::East, GenerationRate::Interval { every: 1, offset: 0 });
        // North/south green forever: the entry segment never drains.
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(HoldPhase)
            .capacity(Capacity::Bounded(2))
            .entry_point(e)
            .build()
            .unwrap();

        sim.run_ticks(5, &mut crate::NoopObserver).unwrap();
        assert_eq!(sim.stats().generated, 2);
        assert_eq!(sim.stats().generation_rejections, 3);
        assert_eq!(sim.vehicle_count(), 2);
    }

    #[test]
    fn bounded_segments_never_overflow() {
        let mut sim = busy_sim(7, 200);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        for snap in &rec.snapshots {
            assert!(snap.segment_counts.iter().all(|&n| n <= 3), "overflow at {}", snap.tick);
        }
    }
}

// ── Conservation & integrity ──────────────────────────────────────────────────

#[cfg(test)]
mod conservation {
    use super::*;
    use crate::{SimBuilder, SimError};

    #[test]
    fn vehicle_count_is_conserved_every_tick() {
        let mut sim = busy_sim(42, 200);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.ticks.len(), 200);
        let mut prev = 0u64;
        for t in &rec.ticks {
            assert_eq!(prev + t.generated, t.vehicles + t.arrived, "at {}", t.tick);
            prev = t.vehicles;
        }

        let stats = sim.stats();
        assert!(stats.generated > 0);
        assert!(stats.arrived > 0);
        assert_eq!(stats.generated - stats.arrived, sim.vehicle_count() as u64);
        assert_eq!(sim.segments().lengths().iter().map(|&n| n as usize).sum::<usize>(), sim.vehicle_count());
    }

    #[test]
    fn low_rate_run_stays_bounded() {
        let grid = Grid::new(3, 3).unwrap();
        let e = EntryPoint {
            trip_hops: Some(4),
            ..entry(&grid, 0, 0, Direction::East, GenerationRate::Probability { p: 0.1 })
        };
        let mut sim = SimBuilder::new(test_config(200), grid)
            .phase_plan(PhasePlan::two_phase(tf_core::Axis::EastWest))
            .strategy(FixedCycle::new(2, 0).unwrap())
            .entry_point(e)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        assert_eq!(rec.ticks.len(), 200);
        let peak = rec.ticks.iter().map(|t| t.vehicles).max().unwrap();
        assert!(peak <= 10, "peak of {peak} vehicles");

        let stats = sim.stats();
        assert!(stats.generated > 0);
        assert!(stats.generated - stats.arrived <= peak);
        assert_eq!(stats.generated - stats.arrived, sim.vehicle_count() as u64);
        assert_eq!(stats.generation_rejections, 0);
    }

    #[test]
    fn snapshot_agrees_with_store() {
        let mut sim = busy_sim(3, 50);
        sim.run(&mut crate::NoopObserver).unwrap();
        let snap = sim.snapshot();
        assert_eq!(snap.vehicle_count(), sim.vehicle_count());
        assert_eq!(snap.queued_at.iter().map(|&n| n as usize).sum::<usize>(), sim.vehicle_count());
        assert_eq!(snap.tick, Tick(49));
        for v in &snap.vehicles {
            assert!(v.position < snap.segment_count_of(v.segment));
        }
    }

    #[test]
    fn duplicate_vehicle_is_an_integrity_error() {
        let grid = Grid::new(3, 3).unwrap();
        let e = entry(&grid, 1, 1, Direction::East, once());
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(HoldPhase)
            .entry_point(e)
            .build()
            .unwrap();
        sim.step().unwrap();

        let seg = grid.incoming_segment(grid.intersection_at(1, 1).unwrap(), Direction::East);
        let clone = sim.segments.front(seg).unwrap().unwrap().clone();
        let _ = sim.segments.push_back(seg, clone).unwrap();

        let err = sim.step().unwrap_err();
        assert!(err.is_integrity());
        assert!(matches!(err, SimError::Integrity { tick: Tick(1), .. }));
    }
}

// ── Signals ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signals {
    use super::*;
    use tf_signal::{Adaptive, WaitWeighted};
    use crate::{SimBuilder, SimError};

    #[test]
    fn fixed_cycle_replays_its_schedule() {
        let strategy = FixedCycle::new(3, 1).unwrap();
        let mut sim = SimBuilder::new(test_config(100), Grid::new(2, 2).unwrap())
            .strategy(strategy.clone())
            .build()
            .unwrap();

        for _ in 0..12 {
            let expected = strategy.phase_at(sim.current_tick(), 2);
            for at in sim.grid().all_intersections() {
                assert_eq!(sim.light(at).unwrap().phase(), expected, "{at} at {}", sim.current_tick());
            }
            sim.step().unwrap();
        }
        // Phase changes at ticks 2, 5, 8, 11 across four lights.
        assert_eq!(sim.stats().switches, 16);
    }

    #[test]
    fn adaptive_holds_on_ties() {
        let mut sim = SimBuilder::new(test_config(100), Grid::new(3, 3).unwrap())
            .strategy(Adaptive::default())
            .build()
            .unwrap();
        sim.run_ticks(20, &mut crate::NoopObserver).unwrap();
        assert_eq!(sim.stats().switches, 0);
    }

    #[test]
    fn adaptive_switches_to_waiting_traffic() {
        let grid = Grid::new(3, 3).unwrap();
        let b = grid.intersection_at(1, 1).unwrap();
        let e = entry(&grid, 1, 1, Direction::East, once());
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(Adaptive::default())
            .entry_point(e)
            .build()
            .unwrap();

        // Tick 0: the queue is still empty when decisions are made.
        assert_eq!(sim.step().unwrap().switches, 0);
        // Tick 1: held on red, and the light turns for tick 2.
        let t1 = sim.step().unwrap();
        assert_eq!(t1.signal_holds, 1);
        assert_eq!(t1.switches, 1);
        assert_eq!(sim.light(b).unwrap().phase(), PhaseIndex(1));
        // Tick 2: the vehicle crosses.
        assert_eq!(sim.step().unwrap().moves, 1);
        assert_eq!(sim.segments().len(grid.segment_id(b, Direction::East)).unwrap(), 1);
    }

    /// Keeps the current phase and records the wait ticks it is shown at
    /// one intersection.
    struct WaitRecorder {
        at:   IntersectionId,
        seen: Arc<std::sync::Mutex<Vec<[u64; 4]>>>,
    }

    impl ControlStrategy for WaitRecorder {
        fn name(&self) -> &str {
            "wait_recorder"
        }

        fn decide(&self, obs: &Observation<'_>, _tick: Tick) -> PhaseIndex {
            if obs.intersection == self.at {
                if let Ok(mut seen) = self.seen.lock() {
                    seen.push(obs.waits);
                }
            }
            obs.phase
        }
    }

    #[test]
    fn observations_carry_queued_wait_ticks() {
        let grid = Grid::new(3, 3).unwrap();
        let b = grid.intersection_at(1, 1).unwrap();
        let e = entry(&grid, 1, 1, Direction::East, once());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        // North/south green throughout: the eastbound vehicle waits.
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(WaitRecorder { at: b, seen: Arc::clone(&seen) })
            .entry_point(e)
            .build()
            .unwrap();
        sim.run_ticks(4, &mut crate::NoopObserver).unwrap();

        let east: Vec<u64> = seen.lock().unwrap().iter().map(|w| w[Direction::East.index()]).collect();
        assert_eq!(east, vec![0, 0, 1, 2]);
    }

    #[test]
    fn wait_weighted_switches_to_waiting_traffic() {
        let grid = Grid::new(3, 3).unwrap();
        let b = grid.intersection_at(1, 1).unwrap();
        let e = entry(&grid, 1, 1, Direction::East, once());
        let mut sim = SimBuilder::new(test_config(100), grid)
            .strategy(WaitWeighted::new(0, None, 1.5, 1.3).unwrap())
            .entry_point(e)
            .build()
            .unwrap();

        assert_eq!(sim.step().unwrap().switches, 0);
        assert_eq!(sim.step().unwrap().switches, 1);
        assert_eq!(sim.light(b).unwrap().phase(), PhaseIndex(1));
        assert_eq!(sim.step().unwrap().moves, 1);
        assert_eq!(sim.strategy_name(b), Some("wait_weighted"));
    }

    #[test]
    fn out_of_range_decision_is_fatal() {
        let mut sim = SimBuilder::new(test_config(100), Grid::new(2, 2).unwrap())
            .strategy(Stubborn { initial: PhaseIndex(0), decide: PhaseIndex(5) })
            .build()
            .unwrap();

        match sim.step() {
            Err(SimError::InvalidDecision { tick, intersection, strategy, .. }) => {
                assert_eq!(tick, Tick(1));
                assert_eq!(intersection, IntersectionId(0));
                assert_eq!(strategy, "stubborn");
            }
            other => panic!("expected InvalidDecision, got {other:?}"),
        }
        // Nothing was committed.
        assert_eq!(sim.current_tick(), Tick::ZERO);
        assert_eq!(sim.light(IntersectionId(0)).unwrap().phase(), PhaseIndex(0));
    }
}

// ── Run loop & observers ──────────────────────────────────────────────────────

#[cfg(test)]
mod observers {
    use super::*;
    use crate::{ChannelObserver, RunOutcome, SimBuilder};

    #[test]
    fn run_stops_at_total_ticks() {
        let mut sim = busy_sim(1, 25);
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(sim.current_tick(), Tick(25));
        assert_eq!(rec.ticks.len(), 25);
        let (final_tick, stats) = rec.ended.unwrap();
        assert_eq!(final_tick, Tick(25));
        assert_eq!(stats.ticks, 25);
    }

    #[test]
    fn snapshots_follow_output_interval() {
        let config = SimConfig { output_interval_ticks: 5, ..test_config(20) };
        let mut sim = SimBuilder::new(config, Grid::new(2, 2).unwrap())
            .strategy(HoldPhase)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        let ticks: Vec<Tick> = rec.snapshots.iter().map(|s| s.tick).collect();
        assert_eq!(ticks, vec![Tick(0), Tick(5), Tick(10), Tick(15)]);
    }

    struct CancelAfter<'a> {
        flag:  &'a AtomicBool,
        after: Tick,
    }

    impl SimObserver for CancelAfter<'_> {
        fn on_tick_end(&mut self, stats: &TickStats) {
            if stats.tick == self.after {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn cancellation_stops_between_ticks() {
        let flag = AtomicBool::new(false);
        let mut sim = busy_sim(5, 100);
        let mut obs = CancelAfter { flag: &flag, after: Tick(5) };
        let outcome = sim.run_until(&mut obs, &flag).unwrap();
        assert_eq!(outcome, RunOutcome::Cancelled { at: Tick(6) });
        assert_eq!(sim.current_tick(), Tick(6));
        assert_eq!(sim.stats().ticks, 6);
    }

    #[test]
    fn channel_observer_drops_when_full() {
        let mut sim = busy_sim(9, 100);
        let (mut obs, rx) = ChannelObserver::bounded(2);
        sim.run_ticks(10, &mut obs).unwrap();

        let received: Vec<Tick> = rx.try_iter().map(|s| s.tick).collect();
        assert_eq!(received, vec![Tick(0), Tick(1)]);
        assert_eq!(obs.dropped(), 8);

        drop(rx);
        sim.run_ticks(1, &mut obs).unwrap();
        assert!(obs.is_disconnected());
    }

    #[test]
    fn fan_out_reaches_both_observers() {
        let mut sim = busy_sim(2, 10);
        let mut pair = (Recorder::default(), Recorder::default());
        sim.run(&mut pair).unwrap();
        assert_eq!(pair.0.ticks, pair.1.ticks);
        assert_eq!(pair.0.snapshots.len(), 10);
    }

    #[test]
    fn same_seed_same_run() {
        let run = |seed| {
            let mut sim = busy_sim(seed, 150);
            let mut rec = Recorder::default();
            sim.run(&mut rec).unwrap();
            let last = serde_json::to_string(&sim.snapshot()).unwrap();
            (rec.ticks, last)
        };
        assert_eq!(run(11), run(11));
    }
}

// ── Scenario files ────────────────────────────────────────────────────────────

#[cfg(test)]
mod scenario {
    use super::*;
    use tf_signal::StrategyConfig;
    use crate::{Scenario, SimError};

    const SAMPLE: &str = r#"{
        "rows": 3, "cols": 3,
        "capacity": { "bounded": 8 },
        "phase_plan": [["east", "west"], ["north", "south"]],
        "strategies": {
            "fixed": { "kind": "fixed_cycle", "cycle_length": 2 },
            "smart": { "kind": "adaptive", "min_green": 2, "max_green": 20 }
        },
        "default_strategy": "fixed",
        "bindings": [{ "row": 1, "col": 1, "strategy": "smart" }],
        "entry_points": [
            { "row": 0, "col": 0, "heading": "east",
              "rate": { "kind": "probability", "p": 0.5 }, "trip_hops": 4 },
            { "row": 2, "col": 1, "heading": "north",
              "rate": { "kind": "interval", "every": 3 },
              "route": { "kind": "destination", "row": 0, "col": 1 } }
        ],
        "config": { "total_ticks": 60, "seed": 7 }
    }"#;

    #[test]
    fn parses_and_runs() {
        let scenario = Scenario::from_json_str(SAMPLE).unwrap();
        assert_eq!(scenario.capacity, Capacity::Bounded(8));
        assert_eq!(scenario.config.total_ticks, 60);
        assert_eq!(scenario.config.output_interval_ticks, 1);

        let mut sim = scenario.build().unwrap();
        let grid = *sim.grid();
        assert_eq!(sim.strategy_name(grid.intersection_at(1, 1).unwrap()), Some("adaptive"));
        assert_eq!(sim.strategy_name(grid.intersection_at(0, 0).unwrap()), Some("fixed_cycle"));

        sim.run(&mut crate::NoopObserver).unwrap();
        assert_eq!(sim.current_tick(), Tick(60));
        assert!(sim.stats().generated > 0);
    }

    #[test]
    fn defaults_fill_everything_but_dimensions() {
        let scenario = Scenario::from_json_str(r#"{ "rows": 2, "cols": 5 }"#).unwrap();
        assert_eq!(scenario, Scenario::new(2, 5));
        let sim = scenario.build().unwrap();
        assert_eq!(sim.strategy_name(IntersectionId(9)), Some("fixed_cycle"));
    }

    #[test]
    fn unknown_binding_name_errors() {
        let json = r#"{ "rows": 2, "cols": 2, "bindings": [{ "row": 1, "col": 0, "strategy": "nope" }] }"#;
        match Scenario::from_json_str(json).unwrap().build() {
            Err(SimError::UnknownStrategy { intersection, strategy }) => {
                assert_eq!(intersection, IntersectionId(2));
                assert_eq!(strategy, "nope");
            }
            other => panic!("expected UnknownStrategy, got {:?}", other.err()),
        }
    }

    #[test]
    fn unknown_default_strategy_errors() {
        let json = r#"{ "rows": 2, "cols": 2, "default_strategy": "missing" }"#;
        assert!(matches!(Scenario::from_json_str(json).unwrap().build(), Err(SimError::Config(_))));
    }

    #[test]
    fn binding_outside_grid_errors() {
        let json = r#"{ "rows": 2, "cols": 2, "bindings": [{ "row": 2, "col": 0, "strategy": "fixed" }] }"#;
        assert!(matches!(Scenario::from_json_str(json).unwrap().build(), Err(SimError::Grid(_))));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{ "rows": 2, "cols": 2, "capacty": "unbounded" }"#;
        assert!(matches!(Scenario::from_json_str(json), Err(SimError::Scenario(_))));
    }

    #[test]
    fn strategy_override_replaces_table() {
        let mut scenario = Scenario::from_json_str(SAMPLE).unwrap();
        scenario.use_strategy_everywhere("hold", StrategyConfig::Hold);
        let sim = scenario.build().unwrap();
        for at in sim.grid().all_intersections() {
            assert_eq!(sim.strategy_name(at), Some("hold"));
        }
    }

    #[test]
    fn json_round_trip_preserves_scenario() {
        let scenario = Scenario::from_json_str(SAMPLE).unwrap();
        let again = Scenario::from_json_str(&scenario.to_json_string().unwrap()).unwrap();
        assert_eq!(scenario, again);
    }

    #[test]
    fn custom_strategy_via_builder() {
        let scenario = Scenario::new(2, 2);
        let sim = scenario
            .builder()
            .unwrap()
            .strategy(HoldPhase)
            .build()
            .unwrap();
        assert_eq!(sim.strategy_name(IntersectionId(3)), Some("hold"));
    }

    #[test]
    fn segment_ids_in_snapshot_are_dense() {
        let sim = Scenario::new(2, 3).build().unwrap();
        let snap = sim.snapshot();
        assert_eq!(snap.segment_counts.len(), 24);
        assert_eq!(snap.segment_count_of(SegmentId(23)), 0);
        assert_eq!(snap.lights.len(), 6);
    }
}
