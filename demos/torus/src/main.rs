//! torus runs a traffic-light scenario on a toroidal grid and prints a
//! summary.
//!
//! Without `--scenario` a synthetic rows × cols grid is used with one
//! eastbound entry point per row and one southbound entry point per column.
//!
//! ```text
//! RUST_LOG=info torus --scenario demos/torus/scenarios/rush_hour.json --output out/
//! torus --rows 8 --cols 8 --strategy adaptive --ticks 5000 --seed 7
//! ```

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};

use tf_core::{Direction, DirectionSet};
use tf_grid::Grid;
use tf_output::{CsvWriter, OutputWriter, SimOutputObserver};
use tf_signal::StrategyConfig;
use tf_sim::{ChannelObserver, GridSnapshot, NoopObserver, Scenario, Sim, SimObserver};
use tf_vehicle::{EntrySpec, GenerationRate, RouteSpec, TurnWeights, load_entry_points_csv};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "torus")]
#[command(about = "Toroidal traffic grid simulation with pluggable signal control")]
struct Cli {
    /// Scenario JSON file.  Overrides --rows/--cols.
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Extra entry points from a CSV file.
    #[arg(long)]
    entries: Option<PathBuf>,

    #[arg(long, default_value = "4")]
    rows: u32,

    #[arg(long, default_value = "4")]
    cols: u32,

    /// Ticks to run.  Defaults to the scenario's `total_ticks`.
    #[arg(long)]
    ticks: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Use one strategy at every intersection.
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Cycle length for `--strategy fixed`.
    #[arg(long, default_value = "10")]
    cycle_length: u64,

    /// Arrival probability per tick for the synthetic entry points.
    #[arg(long, default_value = "0.1")]
    rate: f64,

    /// Write output files to this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Output backend for --output.
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Print a progress line at every output tick.
    #[arg(long)]
    progress: bool,

    /// Run the full integrity scan after every tick.
    #[arg(long)]
    verify: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StrategyKind {
    Fixed,
    Adaptive,
    /// Queue length plus weighted waiting time.
    Weighted,
    Hold,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Sqlite,
    Parquet,
}

// ── Scenario assembly ─────────────────────────────────────────────────────────

fn synthetic_scenario(rows: u32, cols: u32, p: f64) -> Scenario {
    let mut scenario = Scenario::new(rows, cols);
    let route = RouteSpec::RandomTurn(TurnWeights { straight: 3.0, left: 1.0, right: 1.0 });
    let trip_hops = Some(rows + cols);

    let eastbound = (0..rows).map(|row| (row, 0, Direction::East));
    let southbound = (0..cols).map(|col| (0, col, Direction::South));
    scenario.entry_points = eastbound
        .chain(southbound)
        .map(|(row, col, heading)| EntrySpec {
            row,
            col,
            heading,
            rate: GenerationRate::Probability { p },
            route,
            trip_hops,
        })
        .collect();
    scenario
}

fn load_scenario(cli: &Cli) -> Result<Scenario> {
    let mut scenario = match &cli.scenario {
        Some(path) => Scenario::from_json_path(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => synthetic_scenario(cli.rows, cli.cols, cli.rate),
    };

    if let Some(ticks) = cli.ticks {
        scenario.config.total_ticks = ticks;
    }
    if let Some(seed) = cli.seed {
        scenario.config.seed = seed;
    }
    if cli.verify {
        scenario.config.verify_integrity = true;
    }
    match cli.strategy {
        Some(StrategyKind::Fixed) => scenario.use_strategy_everywhere(
            "fixed",
            StrategyConfig::FixedCycle { cycle_length: cli.cycle_length, offset: 0 },
        ),
        Some(StrategyKind::Adaptive) => scenario.use_strategy_everywhere(
            "adaptive",
            StrategyConfig::Adaptive { min_green: 3, max_green: Some(40), threshold: 1 },
        ),
        Some(StrategyKind::Weighted) => scenario.use_strategy_everywhere(
            "weighted",
            StrategyConfig::WaitWeighted {
                min_green:    5,
                max_green:    Some(30),
                wait_weight:  1.5,
                switch_ratio: 1.3,
            },
        ),
        Some(StrategyKind::Hold) => scenario.use_strategy_everywhere("hold", StrategyConfig::Hold),
        None => {}
    }
    Ok(scenario)
}

fn build_sim(cli: &Cli, scenario: &Scenario) -> Result<Sim> {
    let mut builder = scenario.builder()?;
    if let Some(path) = &cli.entries {
        let grid = Grid::new(scenario.rows, scenario.cols)?;
        let extra = load_entry_points_csv(path, &grid)
            .with_context(|| format!("loading entry points {}", path.display()))?;
        builder = builder.entry_points(extra);
    }
    Ok(builder.build()?)
}

// ── Running ───────────────────────────────────────────────────────────────────

/// Spawn a thread printing one line per received snapshot.
fn progress_printer() -> (ChannelObserver, thread::JoinHandle<()>) {
    let (observer, rx) = ChannelObserver::bounded(64);
    let handle = thread::spawn(move || {
        for snap in rx {
            println!(
                "  {:>7}  vehicles {:>6}  max queue {:>4}  arrived {:>4}",
                snap.tick.to_string(),
                snap.vehicle_count(),
                snap.max_queued(),
                snap.stats.arrived,
            );
        }
    });
    (observer, handle)
}

fn run_with<O: SimObserver>(sim: &mut Sim, observer: &mut O, progress: bool) -> Result<()> {
    if progress {
        let (printer, handle) = progress_printer();
        let mut pair = (printer, observer);
        sim.run(&mut pair)?;
        drop(pair);
        if handle.join().is_err() {
            log::warn!("progress printer panicked");
        }
    } else {
        sim.run(observer)?;
    }
    Ok(())
}

fn run_to_output<W: OutputWriter>(sim: &mut Sim, writer: W, progress: bool) -> Result<()> {
    let mut obs = SimOutputObserver::new(writer, &sim.config);
    run_with(sim, &mut obs, progress)?;
    if let Some(e) = obs.take_error() {
        bail!("output error: {e}");
    }
    println!("  {} intersection rows written", obs.rows_written());
    Ok(())
}

fn run_output(sim: &mut Sim, dir: &Path, format: OutputFormat, progress: bool) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    match format {
        OutputFormat::Csv => run_to_output(sim, CsvWriter::new(dir)?, progress),
        #[cfg(feature = "sqlite")]
        OutputFormat::Sqlite => run_to_output(sim, tf_output::SqliteWriter::new(dir)?, progress),
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => run_to_output(sim, tf_output::ParquetWriter::new(dir)?, progress),
        #[allow(unreachable_patterns)]
        _ => bail!("this build does not include that output backend; rebuild with --features sqlite/parquet"),
    }
}

// ── Report ────────────────────────────────────────────────────────────────────

fn light_glyph(green: DirectionSet) -> char {
    if green == DirectionSet::NORTH_SOUTH {
        '|'
    } else if green == DirectionSet::EAST_WEST {
        '-'
    } else if green.is_empty() {
        '.'
    } else {
        '+'
    }
}

/// One cell per intersection: light glyph and queued vehicles.
fn draw_map(snap: &GridSnapshot) {
    for row in 0..snap.rows {
        let line: Vec<String> = (0..snap.cols)
            .map(|col| {
                let i = (row * snap.cols + col) as usize;
                let glyph = snap.lights.get(i).map_or('?', |l| light_glyph(l.green));
                format!("{glyph}{:<3}", snap.queued_at.get(i).copied().unwrap_or(0))
            })
            .collect();
        println!("  {}", line.join(" "));
    }
}

fn report(sim: &Sim, elapsed_secs: f64) {
    let stats = sim.stats();
    let (h, m, s) = sim.clock().elapsed_hms();
    println!();
    println!("Simulated {} ticks ({h:02}:{m:02}:{s:02}) in {elapsed_secs:.3} s", stats.ticks);
    println!("  generated              {:>8}", stats.generated);
    println!("  arrived                {:>8}", stats.arrived);
    println!("  on grid                {:>8}", sim.vehicle_count());
    println!("  moves                  {:>8}", stats.moves);
    println!("  signal holds           {:>8}", stats.signal_holds);
    println!("  capacity rejections    {:>8}", stats.capacity_rejections);
    println!("  generation rejections  {:>8}", stats.generation_rejections);
    println!("  light switches         {:>8}", stats.switches);
    println!("  mean queue / segment   {:>8.3}", stats.mean_queue_length());
    println!("  mean trip ticks        {:>8.2}", stats.mean_trip_ticks());
    println!("  mean wait ticks        {:>8.2}", stats.mean_wait_ticks());
    println!();
    println!("Final state (| = N/S green, - = E/W green, number = queued):");
    draw_map(&sim.snapshot());
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if !(0.0..=1.0).contains(&cli.rate) {
        bail!("--rate must be within [0, 1], got {}", cli.rate);
    }

    let scenario = load_scenario(&cli)?;
    let mut sim = build_sim(&cli, &scenario)?;

    println!("=== torus: rust_tf traffic grid ===");
    println!(
        "Grid {}x{}  |  {} ticks  |  seed {}  |  {} entry points",
        scenario.rows,
        scenario.cols,
        scenario.config.total_ticks,
        scenario.config.seed,
        scenario.entry_points.len(),
    );

    let t0 = Instant::now();
    match &cli.output {
        Some(dir) => run_output(&mut sim, dir, cli.format, cli.progress)?,
        None => run_with(&mut sim, &mut NoopObserver, cli.progress)?,
    }
    report(&sim, t0.elapsed().as_secs_f64());
    Ok(())
}
