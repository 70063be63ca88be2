use thiserror::Error;

/// Typed failures of the driver, the parser and the reducer.
///
/// Application layers carry these inside `anyhow::Error`; use
/// `err.downcast_ref::<Error>()` to match on them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The benchmark client could not be spawned, exited non-zero, timed out,
    /// or printed nothing we could parse.
    #[error("benchmark run {run} failed: {reason}")]
    ExternalProcessFailure { run: usize, reason: String },

    /// A run table's `(categories, samples)` differ from the first run's.
    #[error("run {run} table shape {found:?} differs from the first run's {expected:?}")]
    ShapeMismatch {
        run: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cancelled")]
    Cancelled,
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
