//! Alsvid Circuit Intermediate Representation
//!
//! This crate provides the core data structures for representing reversible
//! and quantum programs in Alsvid: the operation list, the register system,
//! and the layout maps that relate physical wires to logical qubits across
//! circuit edits.
//!
//! # Overview
//!
//! A [`Circuit`] owns an ordered list of [`Operation`]s together with three
//! register maps (quantum, classical, ancillary) and two partial permutations:
//!
//! - the *initial layout* maps every assigned physical wire to the logical
//!   qubit it carries at the start of the circuit;
//! - the *output permutation* maps a physical wire to the logical qubit it
//!   carries at the end — a missing entry marks the wire as garbage.
//!
//! Ancillary and garbage qubits are tracked in bitsets indexed by logical
//! qubit. Ancillae always occupy the topmost logical indices.
//!
//! # Example
//!
//! ```rust
//! use alsvid_ir::{Circuit, Control, OpKind, StandardOperation};
//!
//! let mut circuit = Circuit::new("bell");
//! circuit.add_qubit_register(2, "q").unwrap();
//! circuit.push_standard(StandardOperation::new(2, 0, OpKind::H));
//! circuit.push_standard(StandardOperation::controlled(
//!     2,
//!     vec![Control::pos(0)],
//!     1,
//!     OpKind::X,
//! ));
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.ops.len(), 2);
//! assert!(!circuit.is_idle_qubit(0));
//! ```

pub mod circuit;
pub mod error;
pub mod operation;
pub mod register;

pub use circuit::{Circuit, Permutation};
pub use error::{IrError, IrResult};
pub use operation::{
    ClassicControlledOperation, CompoundOperation, Control, NonUnitaryKind, NonUnitaryOperation,
    OpKind, Operation, Polarity, StandardOperation,
};
pub use register::{Register, RegisterMap};

/// A physical or logical qubit index.
pub type Qubit = u16;

/// A classical bit index.
pub type Clbit = u16;

/// Upper bound on the total number of qubits in a circuit.
pub const MAX_QUBITS: usize = 128;
