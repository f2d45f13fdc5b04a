use thiserror::Error;

use tf_core::Direction;

use crate::PhaseIndex;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("phase plan has no phases")]
    EmptyPlan,

    #[error("phase {phase} has no green headings")]
    EmptyPhase { phase: PhaseIndex },

    #[error("phase {phase} gives green to conflicting headings {a} and {b}")]
    ConflictingGreen { phase: PhaseIndex, a: Direction, b: Direction },

    #[error("phase {phase} out of range for a plan with {phases} phases")]
    PhaseOutOfRange { phase: PhaseIndex, phases: usize },

    #[error("invalid strategy parameter: {0}")]
    InvalidParameter(String),
}

pub type SignalResult<T> = Result<T, SignalError>;
