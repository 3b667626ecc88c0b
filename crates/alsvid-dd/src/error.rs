//! Error types for the DD boundary.

use alsvid_ir::Qubit;
use thiserror::Error;

/// Errors raised while driving a decision-diagram package.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DdError {
    /// A non-unitary operation reached a unitary-only pipeline.
    #[error("operation '{0}' is not unitary")]
    NonUnitary(String),

    /// A permutation key expected in the tracked mapping was missing.
    #[error("key {0} was not found in the source permutation")]
    PermutationKey(Qubit),

    /// A permutation value expected in the tracked mapping was missing.
    #[error("value {0} was not found in the source permutation")]
    PermutationValue(Qubit),
}

/// Result type for DD-boundary operations.
pub type DdResult<T> = Result<T, DdError>;
