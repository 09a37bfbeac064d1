use crate::params::ParameterPath;

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or running a breeding tree.
///
/// Missing required configuration, structural mismatches and contract
/// violations are all fatal: they propagate to the top of the run, which
/// is expected to report them and stop.
#[derive(Error, Debug)]
pub enum EcError {
    #[error("parameter {path} does not exist")]
    ParameterMissing { path: ParameterPath },

    #[error("bad {kind} ({value}) for parameter {path}")]
    BadFormat {
        kind: &'static str,
        value: String,
        path: ParameterPath,
    },

    #[error("parameter {path}: {constraint}")]
    RangeViolation {
        path: ParameterPath,
        constraint: String,
    },

    #[error("{operator}: {message}")]
    StructuralMismatch {
        operator: &'static str,
        message: String,
    },

    #[error("contract violation in {operator}: {message}")]
    ContractViolation {
        operator: &'static str,
        message: String,
    },

    #[error("unknown operator `{name}` for parameter {path}")]
    UnknownOperator { name: String, path: ParameterPath },

    #[error("could not read parameter file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EcError {
    /// Shorthand for a range violation on `path`.
    pub fn range(path: &ParameterPath, constraint: impl Into<String>) -> EcError {
        EcError::RangeViolation {
            path: path.clone(),
            constraint: constraint.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EcError>;
