//! Shared error and result types for the circsim workspace.
//!
//! Every downstream crate (`circsim-devices`, `circsim-solver`, `circsim`)
//! re-exports this type rather than defining its own error hierarchy, so a
//! caller only ever matches on one enum regardless of which layer raised it.

use thiserror::Error;

/// The error kinds this workspace raises: parse, validation, singular
/// matrix, dimension mismatch. Convergence failure is deliberately *not*
/// a variant here — a non-converged DC iteration is reported but not
/// fatal, so it is carried as data on the relevant result type
/// (`DcResult::converged`) instead of being raised as an `Err`.
#[derive(Debug, Error)]
pub enum Error {
    /// A waveform or engineering-value string could not be parsed.
    #[error("parse error in {context}: {message:?} (input: {input:?})")]
    Parse {
        context: &'static str,
        message: String,
        input: String,
    },

    /// A device or circuit failed validation before analysis started.
    #[error("validation error: {0}")]
    Validation(String),

    /// The dense LU factorization hit a pivot below the singularity
    /// threshold.
    #[error("singular or nearly singular matrix at column {column}")]
    Singular { column: usize },

    /// Two array-like operands (matrix/vector, A/b) did not agree in size.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal advisory emitted by circuit validation: floating nodes,
/// missing ground, implausible component values. These never abort
/// analysis; they are collected for the caller to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub message: String,
}

impl Warning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
