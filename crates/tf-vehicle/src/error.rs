use thiserror::Error;

use tf_grid::GridError;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("entry-point parse error: {0}")]
    Parse(String),

    #[error("invalid generation rate: {0}")]
    InvalidRate(String),

    #[error("invalid turn weights: {0}")]
    InvalidTurnWeights(String),

    #[error("trip_hops must be at least 1")]
    InvalidTripHops,

    #[error("grid error: {0}")]
    Grid(#[from] GridError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VehicleResult<T> = Result<T, VehicleError>;
