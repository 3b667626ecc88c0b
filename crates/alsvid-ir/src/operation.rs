//! Circuit operations.
//!
//! Operations form a tagged sum: standard (unitary) gates, compounds of
//! standard gates, non-unitary operations, and classically controlled
//! standard operations. Every operation records the total qubit count of its
//! owning circuit; circuit edits re-broadcast that count.

use crate::register::Register;
use crate::{Clbit, Qubit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Control polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Control fires on |1⟩.
    Pos,
    /// Control fires on |0⟩.
    Neg,
}

/// A control line: a qubit together with its polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    /// Controlling qubit.
    pub qubit: Qubit,
    /// Polarity of the control.
    pub polarity: Polarity,
}

impl Control {
    /// Positive control on `qubit`.
    pub fn pos(qubit: Qubit) -> Self {
        Self {
            qubit,
            polarity: Polarity::Pos,
        }
    }

    /// Negative control on `qubit`.
    pub fn neg(qubit: Qubit) -> Self {
        Self {
            qubit,
            polarity: Polarity::Neg,
        }
    }
}

/// The fixed set of standard gate kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    /// Identity.
    I,
    /// Hadamard.
    H,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
    /// Phase gate S.
    S,
    /// Inverse phase gate.
    Sdg,
    /// T gate.
    T,
    /// Inverse T gate.
    Tdg,
    /// Square root of X.
    V,
    /// Inverse square root of X.
    Vdg,
    /// Diagonal phase rotation U1(λ).
    U1,
    /// U2(φ, λ).
    U2,
    /// General single-qubit gate U3(θ, φ, λ).
    U3,
    /// Rotation about X.
    RX,
    /// Rotation about Y.
    RY,
    /// Rotation about Z.
    RZ,
    /// SWAP of two targets.
    Swap,
    /// iSWAP of two targets.
    ISwap,
    /// Peres gate.
    Peres,
    /// Inverse Peres gate.
    Peresdg,
}

impl OpKind {
    /// Lower-case gate mnemonic.
    pub fn name(self) -> &'static str {
        match self {
            OpKind::I => "id",
            OpKind::H => "h",
            OpKind::X => "x",
            OpKind::Y => "y",
            OpKind::Z => "z",
            OpKind::S => "s",
            OpKind::Sdg => "sdg",
            OpKind::T => "t",
            OpKind::Tdg => "tdg",
            OpKind::V => "v",
            OpKind::Vdg => "vdg",
            OpKind::U1 => "u1",
            OpKind::U2 => "u2",
            OpKind::U3 => "u3",
            OpKind::RX => "rx",
            OpKind::RY => "ry",
            OpKind::RZ => "rz",
            OpKind::Swap => "swap",
            OpKind::ISwap => "iswap",
            OpKind::Peres => "peres",
            OpKind::Peresdg => "peresdg",
        }
    }

    /// Whether the kind operates on two target wires.
    pub fn is_two_target(self) -> bool {
        matches!(
            self,
            OpKind::Swap | OpKind::ISwap | OpKind::Peres | OpKind::Peresdg
        )
    }

    /// Number of parameter slots the kind reads, counted from `p0`.
    pub fn num_parameters(self) -> usize {
        match self {
            OpKind::U1 | OpKind::RX | OpKind::RY | OpKind::RZ => 1,
            OpKind::U2 => 2,
            OpKind::U3 => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A standard gate applied to explicit targets under explicit controls.
///
/// The parameter slots follow the `(p0, p1, p2) = (λ, φ, θ)` convention:
/// `U1` reads `p0`, `U2` reads `(p0, p1)`, `U3` and the axis rotations read
/// what they need from the front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardOperation {
    /// Total qubit count of the owning circuit.
    pub nqubits: Qubit,
    /// Gate kind.
    pub kind: OpKind,
    /// Control lines.
    pub controls: Vec<Control>,
    /// Target wires (two entries for the two-target kinds).
    pub targets: Vec<Qubit>,
    /// Parameter slots.
    pub parameters: [f64; 3],
}

impl StandardOperation {
    /// Uncontrolled single-target gate.
    pub fn new(nqubits: Qubit, target: Qubit, kind: OpKind) -> Self {
        Self {
            nqubits,
            kind,
            controls: vec![],
            targets: vec![target],
            parameters: [0.0; 3],
        }
    }

    /// Uncontrolled single-target gate with one parameter.
    pub fn with_parameter(nqubits: Qubit, target: Qubit, kind: OpKind, p0: f64) -> Self {
        Self {
            parameters: [p0, 0.0, 0.0],
            ..Self::new(nqubits, target, kind)
        }
    }

    /// Controlled single-target gate.
    pub fn controlled(nqubits: Qubit, controls: Vec<Control>, target: Qubit, kind: OpKind) -> Self {
        Self {
            nqubits,
            kind,
            controls,
            targets: vec![target],
            parameters: [0.0; 3],
        }
    }

    /// Controlled single-target gate with one parameter.
    pub fn controlled_with_parameter(
        nqubits: Qubit,
        controls: Vec<Control>,
        target: Qubit,
        kind: OpKind,
        p0: f64,
    ) -> Self {
        Self {
            parameters: [p0, 0.0, 0.0],
            ..Self::controlled(nqubits, controls, target, kind)
        }
    }

    /// Two-target gate (SWAP, iSWAP, Peres).
    pub fn two_target(
        nqubits: Qubit,
        controls: Vec<Control>,
        target0: Qubit,
        target1: Qubit,
        kind: OpKind,
    ) -> Self {
        Self {
            nqubits,
            kind,
            controls,
            targets: vec![target0, target1],
            parameters: [0.0; 3],
        }
    }

    /// U3 gate with the full parameter triple.
    ///
    /// On an uncontrolled application, parameter values naming a simpler
    /// gate collapse to that gate, so `u3(π, 0, π)` comes out as an `X` and
    /// `u3(π/2, 0, π)` as an `H`. Controlled applications keep the U3 form:
    /// the controlled unitary is sensitive to the single-qubit gate's global
    /// phase, which the named gates do not preserve.
    pub fn u3(
        nqubits: Qubit,
        controls: Vec<Control>,
        target: Qubit,
        lambda: f64,
        phi: f64,
        theta: f64,
    ) -> Self {
        let (kind, parameters) = if controls.is_empty() {
            classify_u3(lambda, phi, theta)
        } else {
            (OpKind::U3, [lambda, phi, theta])
        };
        Self {
            nqubits,
            kind,
            controls,
            targets: vec![target],
            parameters,
        }
    }

    /// Whether the operation touches `qubit` as control or target.
    pub fn acts_on(&self, qubit: Qubit) -> bool {
        self.targets.contains(&qubit) || self.controls.iter().any(|c| c.qubit == qubit)
    }

    /// Whether a qubit appears both in the control and the target set.
    pub fn has_duplicate_qubit(&self) -> Option<Qubit> {
        self.controls
            .iter()
            .map(|c| c.qubit)
            .find(|q| self.targets.contains(q))
    }

    /// Largest wire index touched by the operation.
    pub fn max_index(&self) -> Qubit {
        self.targets
            .iter()
            .copied()
            .chain(self.controls.iter().map(|c| c.qubit))
            .max()
            .unwrap_or(0)
    }
}

/// Recognise U3 parameter triples that name a simpler standard gate.
fn classify_u3(lambda: f64, phi: f64, theta: f64) -> (OpKind, [f64; 3]) {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    if theta == 0.0 && phi == 0.0 {
        return if lambda == 0.0 {
            (OpKind::I, [0.0; 3])
        } else if lambda == PI || lambda == -PI {
            (OpKind::Z, [0.0; 3])
        } else if lambda == FRAC_PI_2 {
            (OpKind::S, [0.0; 3])
        } else if lambda == -FRAC_PI_2 {
            (OpKind::Sdg, [0.0; 3])
        } else if lambda == FRAC_PI_4 {
            (OpKind::T, [0.0; 3])
        } else if lambda == -FRAC_PI_4 {
            (OpKind::Tdg, [0.0; 3])
        } else {
            (OpKind::U1, [lambda, 0.0, 0.0])
        };
    }
    if theta == PI && phi == 0.0 && lambda == PI {
        return (OpKind::X, [0.0; 3]);
    }
    if theta == PI && phi == FRAC_PI_2 && lambda == FRAC_PI_2 {
        return (OpKind::Y, [0.0; 3]);
    }
    if phi == 0.0 && lambda == 0.0 {
        return (OpKind::RY, [theta, 0.0, 0.0]);
    }
    if phi == -FRAC_PI_2 && lambda == FRAC_PI_2 {
        return (OpKind::RX, [theta, 0.0, 0.0]);
    }
    if theta == FRAC_PI_2 {
        if phi == 0.0 && lambda == PI {
            return (OpKind::H, [0.0; 3]);
        }
        return (OpKind::U2, [lambda, phi, 0.0]);
    }
    (OpKind::U3, [lambda, phi, theta])
}

/// Non-unitary operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NonUnitaryKind {
    /// Measurement pairing the i-th qubit with the i-th classical bit.
    Measure {
        /// Measured qubits.
        qubits: Vec<Qubit>,
        /// Classical bits receiving the results.
        classics: Vec<Clbit>,
    },
    /// Reset the listed qubits to |0⟩.
    Reset {
        /// Qubits to reset.
        qubits: Vec<Qubit>,
    },
    /// Synchronisation barrier.
    Barrier {
        /// Qubits covered by the barrier.
        qubits: Vec<Qubit>,
    },
    /// Simulator snapshot request.
    Snapshot {
        /// Qubits to capture.
        qubits: Vec<Qubit>,
        /// Snapshot identifier.
        id: u32,
    },
    /// Request to print the state probabilities.
    ShowProbabilities,
}

/// A non-unitary operation together with the circuit qubit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonUnitaryOperation {
    /// Total qubit count of the owning circuit.
    pub nqubits: Qubit,
    /// Operation payload.
    pub kind: NonUnitaryKind,
}

impl NonUnitaryOperation {
    /// Create a measurement; the i-th qubit is measured into the i-th bit.
    pub fn measure(nqubits: Qubit, qubits: Vec<Qubit>, classics: Vec<Clbit>) -> Self {
        debug_assert_eq!(qubits.len(), classics.len());
        Self {
            nqubits,
            kind: NonUnitaryKind::Measure { qubits, classics },
        }
    }

    /// Create a reset.
    pub fn reset(nqubits: Qubit, qubits: Vec<Qubit>) -> Self {
        Self {
            nqubits,
            kind: NonUnitaryKind::Reset { qubits },
        }
    }

    /// Create a barrier.
    pub fn barrier(nqubits: Qubit, qubits: Vec<Qubit>) -> Self {
        Self {
            nqubits,
            kind: NonUnitaryKind::Barrier { qubits },
        }
    }

    /// Create a snapshot.
    pub fn snapshot(nqubits: Qubit, qubits: Vec<Qubit>, id: u32) -> Self {
        Self {
            nqubits,
            kind: NonUnitaryKind::Snapshot { qubits, id },
        }
    }

    /// Create a probabilities request.
    pub fn show_probabilities(nqubits: Qubit) -> Self {
        Self {
            nqubits,
            kind: NonUnitaryKind::ShowProbabilities,
        }
    }

    /// Whether the operation touches `qubit`.
    pub fn acts_on(&self, qubit: Qubit) -> bool {
        match &self.kind {
            NonUnitaryKind::Measure { qubits, .. }
            | NonUnitaryKind::Reset { qubits }
            | NonUnitaryKind::Barrier { qubits }
            | NonUnitaryKind::Snapshot { qubits, .. } => qubits.contains(&qubit),
            NonUnitaryKind::ShowProbabilities => false,
        }
    }

    /// Largest wire index touched by the operation.
    pub fn max_index(&self) -> Qubit {
        match &self.kind {
            NonUnitaryKind::Measure { qubits, .. }
            | NonUnitaryKind::Reset { qubits }
            | NonUnitaryKind::Barrier { qubits }
            | NonUnitaryKind::Snapshot { qubits, .. } => qubits.iter().copied().max().unwrap_or(0),
            NonUnitaryKind::ShowProbabilities => 0,
        }
    }
}

/// An ordered sequence of standard operations applied left to right.
///
/// A compound exclusively owns its children; destroying it destroys them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundOperation {
    /// Total qubit count of the owning circuit.
    pub nqubits: Qubit,
    /// Child operations in application order.
    pub ops: Vec<StandardOperation>,
}

impl CompoundOperation {
    /// Create an empty compound.
    pub fn new(nqubits: Qubit) -> Self {
        Self {
            nqubits,
            ops: vec![],
        }
    }

    /// Append a child operation.
    pub fn push(&mut self, op: StandardOperation) {
        self.ops.push(op);
    }

    /// Whether any child touches `qubit`.
    pub fn acts_on(&self, qubit: Qubit) -> bool {
        self.ops.iter().any(|op| op.acts_on(qubit))
    }
}

/// A standard operation gated on a classical register comparing equal to a
/// constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicControlledOperation {
    /// The gated operation.
    pub op: Box<Operation>,
    /// The classical register slice tested.
    pub creg: Register,
    /// The value the register must hold for the operation to fire.
    pub expected: u64,
}

/// Any circuit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A standard gate.
    Standard(StandardOperation),
    /// An ordered block of standard gates.
    Compound(CompoundOperation),
    /// A non-unitary operation.
    NonUnitary(NonUnitaryOperation),
    /// A classically controlled standard operation.
    ClassicControlled(ClassicControlledOperation),
}

impl Operation {
    /// Whether the operation touches `qubit` as control or target.
    pub fn acts_on(&self, qubit: Qubit) -> bool {
        match self {
            Operation::Standard(op) => op.acts_on(qubit),
            Operation::Compound(op) => op.acts_on(qubit),
            Operation::NonUnitary(op) => op.acts_on(qubit),
            Operation::ClassicControlled(op) => op.op.acts_on(qubit),
        }
    }

    /// Total qubit count recorded on the operation.
    pub fn nqubits(&self) -> Qubit {
        match self {
            Operation::Standard(op) => op.nqubits,
            Operation::Compound(op) => op.nqubits,
            Operation::NonUnitary(op) => op.nqubits,
            Operation::ClassicControlled(op) => op.op.nqubits(),
        }
    }

    /// Re-broadcast the circuit qubit count.
    pub fn set_nqubits(&mut self, nqubits: Qubit) {
        match self {
            Operation::Standard(op) => op.nqubits = nqubits,
            Operation::Compound(op) => {
                op.nqubits = nqubits;
                for child in &mut op.ops {
                    child.nqubits = nqubits;
                }
            }
            Operation::NonUnitary(op) => op.nqubits = nqubits,
            Operation::ClassicControlled(op) => op.op.set_nqubits(nqubits),
        }
    }

    /// Whether the operation is unitary.
    pub fn is_unitary(&self) -> bool {
        match self {
            Operation::Standard(_) | Operation::Compound(_) => true,
            Operation::NonUnitary(_) | Operation::ClassicControlled(_) => false,
        }
    }

    /// Largest wire index touched by the operation.
    pub fn max_index(&self) -> Qubit {
        match self {
            Operation::Standard(op) => op.max_index(),
            Operation::Compound(op) => op.ops.iter().map(StandardOperation::max_index).max().unwrap_or(0),
            Operation::NonUnitary(op) => op.max_index(),
            Operation::ClassicControlled(op) => op.op.max_index(),
        }
    }
}

impl From<StandardOperation> for Operation {
    fn from(op: StandardOperation) -> Self {
        Operation::Standard(op)
    }
}

impl From<CompoundOperation> for Operation {
    fn from(op: CompoundOperation) -> Self {
        Operation::Compound(op)
    }
}

impl From<NonUnitaryOperation> for Operation {
    fn from(op: NonUnitaryOperation) -> Self {
        Operation::NonUnitary(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acts_on() {
        let op = StandardOperation::controlled(3, vec![Control::pos(0)], 1, OpKind::X);
        assert!(op.acts_on(0));
        assert!(op.acts_on(1));
        assert!(!op.acts_on(2));
    }

    #[test]
    fn test_duplicate_qubit_detection() {
        let op = StandardOperation::controlled(2, vec![Control::pos(0)], 0, OpKind::X);
        assert_eq!(op.has_duplicate_qubit(), Some(0));

        let ok = StandardOperation::controlled(2, vec![Control::pos(0)], 1, OpKind::X);
        assert_eq!(ok.has_duplicate_qubit(), None);
    }

    #[test]
    fn test_set_nqubits_reaches_compound_children() {
        let mut compound = CompoundOperation::new(2);
        compound.push(StandardOperation::new(2, 0, OpKind::H));
        compound.push(StandardOperation::new(2, 1, OpKind::H));
        let mut op = Operation::from(compound);
        op.set_nqubits(5);
        match &op {
            Operation::Compound(c) => {
                assert!(c.ops.iter().all(|child| child.nqubits == 5));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_measure_pairing() {
        let m = NonUnitaryOperation::measure(2, vec![0, 1], vec![0, 1]);
        assert!(m.acts_on(0));
        assert!(m.acts_on(1));
        assert!(!Operation::from(m).is_unitary());
    }

    #[test]
    fn test_max_index() {
        let op = StandardOperation::two_target(8, vec![Control::neg(7)], 2, 4, OpKind::Swap);
        assert_eq!(op.max_index(), 7);
    }

    #[test]
    fn test_u3_parameter_recognition() {
        use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

        let h = StandardOperation::u3(1, vec![], 0, PI, 0.0, FRAC_PI_2);
        assert_eq!(h.kind, OpKind::H);

        let x = StandardOperation::u3(1, vec![], 0, PI, 0.0, PI);
        assert_eq!(x.kind, OpKind::X);

        let t = StandardOperation::u3(1, vec![], 0, FRAC_PI_4, 0.0, 0.0);
        assert_eq!(t.kind, OpKind::T);

        let rx = StandardOperation::u3(1, vec![], 0, FRAC_PI_2, -FRAC_PI_2, 1.25);
        assert_eq!(rx.kind, OpKind::RX);
        assert_eq!(rx.parameters[0], 1.25);

        let generic = StandardOperation::u3(1, vec![], 0, 0.3, 0.2, 0.1);
        assert_eq!(generic.kind, OpKind::U3);
        assert_eq!(generic.parameters, [0.3, 0.2, 0.1]);
    }

    #[test]
    fn test_controlled_u3_is_not_classified() {
        use std::f64::consts::PI;

        let op = StandardOperation::u3(2, vec![Control::pos(0)], 1, PI, 0.0, PI);
        assert_eq!(op.kind, OpKind::U3);
        assert_eq!(op.parameters, [PI, 0.0, PI]);
        assert_eq!(op.controls.len(), 1);
    }
}
