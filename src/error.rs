//! Crate-wide error type.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::config::ConfigError;

/// Errors raised while loading scenarios, solving formulations, or writing output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// One or more configuration fields failed validation.
    #[error("{}", ConfigErrors(.0))]
    Config(Vec<ConfigError>),

    /// The solver proved the formulation has no feasible dispatch.
    #[error("{formulation} dispatch is infeasible: demand cannot be met within capacity limits")]
    Infeasible { formulation: &'static str },

    /// The objective is unbounded below (a negative cost with no upper bound).
    #[error("{formulation} dispatch is unbounded")]
    Unbounded { formulation: &'static str },

    /// Any other solver failure.
    #[error("solver failed on {formulation} dispatch: {message}")]
    Solver {
        formulation: &'static str,
        message: String,
    },

    #[error("cannot write \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot render chart \"{}\": {message}", .path.display())]
    Chart { path: PathBuf, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Maps a `good_lp` resolution error onto the formulation that produced it.
    pub(crate) fn from_resolution(
        formulation: &'static str,
        error: good_lp::ResolutionError,
    ) -> Self {
        match error {
            good_lp::ResolutionError::Infeasible => Self::Infeasible { formulation },
            good_lp::ResolutionError::Unbounded => Self::Unbounded { formulation },
            other => Self::Solver {
                formulation,
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(vec![error])
    }
}

struct ConfigErrors<'a>(&'a [ConfigError]);

impl fmt::Display for ConfigErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}
