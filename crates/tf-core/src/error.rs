//! Errors raised by the value types in this crate.
//!
//! Each downstream crate has its own enum and wraps or stringifies this one.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A textual value (direction name, turn name) was not recognised.
    #[error("cannot parse {0}")]
    Parse(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
