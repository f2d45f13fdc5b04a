use thiserror::Error;

use tf_core::{IntersectionId, Tick};
use tf_grid::GridError;
use tf_signal::SignalError;
use tf_vehicle::VehicleError;

/// Errors produced by `tf-sim`.
///
/// Every variant except [`Integrity`][SimError::Integrity] is a
/// configuration error: the run cannot start, or a strategy produced an
/// answer the configuration does not allow.  Both kinds are fatal.  Segment
/// overflow is never an error; it only shows up in the statistics.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("grid configuration error: {0}")]
    Grid(#[from] GridError),

    #[error("signal configuration error: {0}")]
    Signal(#[from] SignalError),

    #[error("vehicle configuration error: {0}")]
    Vehicle(#[from] VehicleError),

    #[error("strategy bindings length {got} does not match intersection count {expected}")]
    BindingCountMismatch { expected: usize, got: usize },

    #[error("{intersection} is bound to undefined strategy {strategy:?}")]
    UnknownStrategy { intersection: IntersectionId, strategy: String },

    #[error("strategy {strategy:?} at {intersection} chose an invalid phase for {tick}: {source}")]
    InvalidDecision {
        tick:         Tick,
        intersection: IntersectionId,
        strategy:     String,
        source:       SignalError,
    },

    #[error("scenario parse error: {0}")]
    Scenario(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("integrity violation at {tick}: {detail}")]
    Integrity { tick: Tick, detail: String },
}

impl SimError {
    /// `true` for internal-consistency failures; `false` for configuration
    /// errors.
    pub fn is_integrity(&self) -> bool {
        matches!(self, SimError::Integrity { .. })
    }

    pub(crate) fn integrity(tick: Tick, detail: impl Into<String>) -> Self {
        SimError::Integrity { tick, detail: detail.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
