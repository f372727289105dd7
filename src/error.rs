use std::io;

use thiserror::Error;

use crate::diet::RunState;
use crate::lp_solver::SolverError;

/// Misuse of the diet model: these indicate a defect in the calling code, not bad data.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("index {index} is out of range for variable group `{label}` with {len} variables")]
    IndexOutOfRange {
        label: String,
        index: usize,
        len: usize,
    },

    #[error("{0} variables must be registered first")]
    VariablesNotRegistered(&'static str),

    #[error("food `{0}` is not part of the problem data")]
    UnknownFood(String),

    #[error("cannot {action} while the run is in state {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: RunState,
    },
}

/// Errors that abort a diet run.
#[derive(Debug, Error)]
pub enum DietError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("cannot write report: {0}")]
    Io(#[from] io::Error),
}

impl DietError {
    pub const MODEL: i32 = 20;
    pub const IO: i32 = 30;

    /// Numeric code reported by the command-line driver
    pub fn code(&self) -> i32 {
        match self {
            DietError::Solver(err) => err.code(),
            DietError::Model(_) => Self::MODEL,
            DietError::Io(_) => Self::IO,
        }
    }
}
