use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the ensemble and its step operators.
///
/// Coincident cells are not an error: their pairwise term is dropped from the
/// interaction sum and the step proceeds.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed construction or call argument.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A completed step produced a non-finite coordinate; nothing was committed.
    #[error("numerical degeneracy: cell {index} has non-finite position ({x}, {y})")]
    NumericalDegeneracy { index: usize, x: f64, y: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }
}
