//! Shared error types used across submodules.

use thiserror::Error;

use crate::equilibrium::SolveError;
use crate::io::TableError;
use crate::modes::ModeError;
use crate::potential::{PotentialError, SampleError};

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum TrapModesError {
    /// Wraps sample validation errors.
    #[error(transparent)]
    Sample(#[from] SampleError),
    /// Wraps potential construction and evaluation errors.
    #[error(transparent)]
    Potential(#[from] PotentialError),
    /// Wraps equilibrium solver errors.
    #[error(transparent)]
    Solve(#[from] SolveError),
    /// Wraps normal-mode solver errors.
    #[error(transparent)]
    Modes(#[from] ModeError),
    /// Wraps tabular field data parsing errors.
    #[error(transparent)]
    Table(#[from] TableError),
}
