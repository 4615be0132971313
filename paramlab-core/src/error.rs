//! Errors raised while resolving, counting, or enumerating a parameter space.

use thiserror::Error;

/// Failures of the parameter-space engine.
///
/// All variants are reported synchronously to the caller and none are worth
/// retrying: resolution and counting are deterministic, so the descriptor
/// itself has to change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
    /// A malformed or empty axis (min > max, step <= 0, empty value or
    /// variant list, duplicate names, kind mismatches).
    #[error("invalid axis '{axis}': {reason}")]
    InvalidAxis { axis: String, reason: String },

    /// The total number of combinations does not fit an `i64`.
    #[error("combination space exceeds {} trials", i64::MAX)]
    CombinationSpaceOverflow,

    /// An axis declaration whose kind tag no consumer recognizes.
    #[error("axis '{axis}' has unrecognized kind '{kind}'")]
    UnresolvedAxisType { axis: String, kind: String },
}

impl SpaceError {
    pub(crate) fn invalid(axis: &str, reason: impl Into<String>) -> Self {
        SpaceError::InvalidAxis {
            axis: axis.to_string(),
            reason: reason.into(),
        }
    }
}
