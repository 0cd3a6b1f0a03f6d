//! Errors raised while bridging to the external patch/optimize solver.

use thiserror::Error;

/// Errors raised by a [`crate::bridge::SolverBridge`] implementation.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The solver produced no output file: the request was infeasible.
    #[error("solver rejected the {0:?} request: no output produced")]
    NoSchedule(crate::request::SolverAction),
    /// The solver binary could not be spawned, exited with a failure status,
    /// or wrote a file this crate could not parse. Fatal: propagates out of
    /// `simulate()`.
    #[error("solver I/O error: {0}")]
    Io(String),
}
