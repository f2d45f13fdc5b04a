//! CSV entry-point loader.
//!
//! # CSV format
//!
//! One row per entry point.
//!
//! ```csv
//! row,col,heading,rate_kind,rate,route,target_row,target_col,trip_hops
//! 0,0,east,probability,0.1,straight,,,5
//! 2,1,N,interval,4,random,,,
//! 1,1,west,probability,0.05,destination,0,2,
//! ```
//!
//! | Column       | Meaning                                                    |
//! |--------------|------------------------------------------------------------|
//! | `heading`    | `north`/`east`/`south`/`west` or `N`/`E`/`S`/`W`           |
//! | `rate_kind`  | `probability` (`rate` = p per tick) or `interval` (`rate` = period in ticks) |
//! | `route`      | `straight`, `random` (uniform turns), or `destination`     |
//! | `target_*`   | Required for `destination`, ignored otherwise              |
//! | `trip_hops`  | Optional hop budget                                        |

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use tf_core::Direction;
use tf_grid::Grid;

use crate::{EntryPoint, EntrySpec, GenerationRate, RouteSpec, TurnWeights, VehicleError, VehicleResult};

// ── CSV record ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EntryRecord {
    row:        u32,
    col:        u32,
    heading:    String,
    rate_kind:  String,
    rate:       f64,
    route:      String,
    target_row: Option<u32>,
    target_col: Option<u32>,
    trip_hops:  Option<u32>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and resolve entry points from a CSV file.
pub fn load_entry_points_csv(path: &Path, grid: &Grid) -> VehicleResult<Vec<EntryPoint>> {
    let file = std::fs::File::open(path)?;
    load_entry_points_reader(file, grid)
}

/// Like [`load_entry_points_csv`] but accepts any `Read` source.
pub fn load_entry_points_reader<R: Read>(reader: R, grid: &Grid) -> VehicleResult<Vec<EntryPoint>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut entries = Vec::new();

    for (line, result) in csv_reader.deserialize::<EntryRecord>().enumerate() {
        let record = result.map_err(|e| VehicleError::Parse(e.to_string()))?;
        let spec = to_spec(record).map_err(|e| match e {
            VehicleError::Parse(msg) => VehicleError::Parse(format!("record {}: {msg}", line + 1)),
            other => other,
        })?;
        entries.push(spec.resolve(grid)?);
    }

    log::info!("loaded {} entry points", entries.len());
    Ok(entries)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn to_spec(r: EntryRecord) -> VehicleResult<EntrySpec> {
    let heading: Direction = r
        .heading
        .parse()
        .map_err(|e: tf_core::CoreError| VehicleError::Parse(e.to_string()))?;

    let rate = match r.rate_kind.trim().to_ascii_lowercase().as_str() {
        "probability" => GenerationRate::Probability { p: r.rate },
        "interval" => {
            if r.rate.fract() != 0.0 || r.rate < 1.0 {
                return Err(VehicleError::InvalidRate(format!(
                    "interval {} is not a positive whole number of ticks",
                    r.rate
                )));
            }
            GenerationRate::Interval { every: r.rate as u64, offset: 0 }
        }
        other => {
            return Err(VehicleError::Parse(format!(
                "invalid rate_kind {other:?}: expected \"probability\" or \"interval\""
            )));
        }
    };

    let route = match r.route.trim().to_ascii_lowercase().as_str() {
        "straight" => RouteSpec::Straight,
        "random" => RouteSpec::RandomTurn(TurnWeights::default()),
        "destination" => match (r.target_row, r.target_col) {
            (Some(row), Some(col)) => RouteSpec::Destination { row, col },
            _ => {
                return Err(VehicleError::Parse(
                    "destination route needs target_row and target_col".into(),
                ));
            }
        },
        other => {
            return Err(VehicleError::Parse(format!(
                "invalid route {other:?}: expected \"straight\", \"random\", or \"destination\""
            )));
        }
    };

    Ok(EntrySpec {
        row: r.row,
        col: r.col,
        heading,
        rate,
        route,
        trip_hops: r.trip_hops,
    })
}
