//! Error types for the IR crate.

use crate::Qubit;
use thiserror::Error;

/// Errors that can occur when editing a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Adding the requested qubits would exceed the supported maximum.
    #[error("adding {requested} qubits exceeds the supported maximum of {max}")]
    CapacityExceeded {
        /// Total qubit count the edit would produce.
        requested: usize,
        /// The compile-time maximum.
        max: usize,
    },

    /// Qubit registers cannot grow once ancillae occupy the top of the index
    /// space.
    #[error("cannot add qubit register: ancillae are already present")]
    AncillaePresent,

    /// Only the last-allocated block of a register may be augmented.
    #[error("register '{0}' can only be augmented while it is the last block in the circuit")]
    RegisterNotLast(String),

    /// No register of the given name exists.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    /// No register covers the given index.
    #[error("qubit index {0} not found in any register")]
    QubitNotInRegister(Qubit),

    /// The logical qubit is not assigned in the initial layout.
    #[error("logical qubit {0} not found in the initial layout")]
    QubitNotFound(Qubit),

    /// The physical qubit already appears in a layout map.
    #[error("physical qubit {0} is already assigned")]
    QubitAlreadyAssigned(Qubit),

    /// A qubit occurs both as control and as target of one operation.
    #[error("qubit {0} cannot be control and target at the same time")]
    DuplicateQubit(Qubit),

    /// Logical index beyond the current qubit range.
    #[error("logical qubit {index} cannot be inserted into a circuit of {nqubits} qubits")]
    QubitIndexOutOfRange {
        /// The offending logical index.
        index: Qubit,
        /// Current non-ancilla qubit count.
        nqubits: Qubit,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
