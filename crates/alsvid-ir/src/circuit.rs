//! The circuit model.
//!
//! A [`Circuit`] owns its operations and the register/layout bookkeeping that
//! relates physical wires to logical qubits. Edits keep three invariants:
//! register blocks of one kind never overlap, ancillary registers sit above
//! every non-ancilla register, and the two layout maps stay injective.

use fixedbitset::FixedBitSet;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{IrError, IrResult};
use crate::operation::{Operation, StandardOperation};
use crate::register::{self, Register, RegisterMap, DEFAULT_ANCREG, DEFAULT_CREG, DEFAULT_QREG};
use crate::{Clbit, Qubit, MAX_QUBITS};

/// A partial qubit permutation, keyed by physical index, in insertion order.
pub type Permutation = IndexMap<Qubit, Qubit>;

/// A quantum circuit: registers, layouts, and an ordered operation list.
#[derive(Debug, Clone)]
pub struct Circuit {
    /// Circuit name, usually derived from the imported file.
    pub name: String,
    /// Number of non-ancilla qubits.
    pub nqubits: Qubit,
    /// Number of ancillary qubits.
    pub nancillae: Qubit,
    /// Number of classical bits.
    pub nclassics: Clbit,
    /// Quantum registers.
    pub qregs: RegisterMap,
    /// Classical registers.
    pub cregs: RegisterMap,
    /// Ancillary registers. Always index-higher than every quantum register.
    pub ancregs: RegisterMap,
    /// Operations in application order.
    pub ops: Vec<Operation>,
    /// Physical-to-logical map at circuit entry.
    pub initial_layout: Permutation,
    /// Physical-to-logical map at circuit exit; absent entries are garbage.
    pub output_permutation: Permutation,
    /// Logical qubits that are ancillary.
    pub ancillary: FixedBitSet,
    /// Logical qubits whose output is unconstrained.
    pub garbage: FixedBitSet,
    /// Running maximum control count over all operations.
    pub max_controls: u16,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new("")
    }
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nqubits: 0,
            nancillae: 0,
            nclassics: 0,
            qregs: RegisterMap::new(),
            cregs: RegisterMap::new(),
            ancregs: RegisterMap::new(),
            ops: vec![],
            initial_layout: Permutation::new(),
            output_permutation: Permutation::new(),
            ancillary: FixedBitSet::with_capacity(MAX_QUBITS + 1),
            garbage: FixedBitSet::with_capacity(MAX_QUBITS + 1),
            max_controls: 0,
        }
    }

    /// Create a circuit with default quantum and classical registers of the
    /// given sizes.
    pub fn with_size(name: impl Into<String>, nqubits: Qubit, nclassics: Clbit) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        if nqubits > 0 {
            circuit.add_qubit_register(nqubits, DEFAULT_QREG)?;
        }
        if nclassics > 0 {
            circuit.add_classical_register(nclassics, DEFAULT_CREG)?;
        }
        Ok(circuit)
    }

    /// Total number of qubits including ancillae.
    pub fn total_qubits(&self) -> Qubit {
        self.nqubits + self.nancillae
    }

    /// Number of non-ancilla qubits.
    pub fn num_qubits(&self) -> usize {
        self.nqubits as usize
    }

    /// Restore the circuit to its freshly constructed state.
    pub fn reset(&mut self) {
        self.nqubits = 0;
        self.nancillae = 0;
        self.nclassics = 0;
        self.qregs.clear();
        self.cregs.clear();
        self.ancregs.clear();
        self.ops.clear();
        self.initial_layout.clear();
        self.output_permutation.clear();
        self.ancillary.clear();
        self.garbage.clear();
        self.max_controls = 0;
    }

    /// Append an operation.
    pub fn push(&mut self, op: impl Into<Operation>) {
        self.ops.push(op.into());
    }

    /// Append a standard operation, folding its control count into the
    /// running maximum.
    pub fn push_standard(&mut self, op: StandardOperation) {
        self.update_max_controls(op.controls.len() as u16);
        self.ops.push(Operation::Standard(op));
    }

    /// Raise the running maximum control count.
    pub fn update_max_controls(&mut self, ncontrols: u16) {
        self.max_controls = self.max_controls.max(ncontrols);
    }

    fn broadcast_nqubits(&mut self) {
        let total = self.total_qubits();
        for op in &mut self.ops {
            op.set_nqubits(total);
        }
    }

    fn check_capacity(&self, additional: Qubit) -> IrResult<()> {
        let requested = self.total_qubits() as usize + additional as usize;
        if requested > MAX_QUBITS {
            return Err(IrError::CapacityExceeded {
                requested,
                max: MAX_QUBITS,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Register edits
    // =========================================================================

    /// Append a quantum register of `size` qubits, or extend the register of
    /// that name when its block ends at the current top of the qubit range.
    ///
    /// Fails with [`IrError::AncillaePresent`] once ancillae exist, since
    /// those must keep the topmost indices.
    pub fn add_qubit_register(&mut self, size: u16, name: &str) -> IrResult<()> {
        self.check_capacity(size)?;
        if self.nancillae > 0 {
            return Err(IrError::AncillaePresent);
        }

        if let Some(reg) = self.qregs.get_mut(name) {
            if reg.end() == self.nqubits {
                reg.size += size;
            } else {
                return Err(IrError::RegisterNotLast(name.to_string()));
            }
        } else {
            self.qregs
                .insert(name.to_string(), Register::new(self.nqubits, size));
        }

        for i in 0..size {
            let j = self.nqubits + i;
            self.initial_layout.insert(j, j);
            self.output_permutation.insert(j, j);
        }
        self.nqubits += size;
        self.broadcast_nqubits();
        Ok(())
    }

    /// Append a classical register of `size` bits.
    pub fn add_classical_register(&mut self, size: u16, name: &str) -> IrResult<()> {
        if self.cregs.contains_key(name) {
            return Err(IrError::RegisterNotLast(name.to_string()));
        }
        self.cregs
            .insert(name.to_string(), Register::new(self.nclassics, size));
        self.nclassics += size;
        Ok(())
    }

    /// Append an ancillary register of `size` qubits, or extend the register
    /// of that name when its block ends at the current top of the range.
    pub fn add_ancillary_register(&mut self, size: u16, name: &str) -> IrResult<()> {
        self.check_capacity(size)?;
        let total = self.total_qubits();

        if let Some(reg) = self.ancregs.get_mut(name) {
            if reg.end() == total {
                reg.size += size;
            } else {
                return Err(IrError::RegisterNotLast(name.to_string()));
            }
        } else {
            self.ancregs
                .insert(name.to_string(), Register::new(total, size));
        }

        for i in 0..size {
            let j = total + i;
            self.initial_layout.insert(j, j);
            self.output_permutation.insert(j, j);
            self.ancillary.insert(j as usize);
        }
        self.nancillae += size;
        self.broadcast_nqubits();
        Ok(())
    }

    /// Resolve the register covering a physical qubit, searching quantum then
    /// ancillary registers. Returns the register name and the offset inside
    /// its block.
    pub fn qubit_register_and_index(&self, physical: Qubit) -> IrResult<(String, u16)> {
        register::resolve(&self.qregs, physical)
            .or_else(|| register::resolve(&self.ancregs, physical))
            .map(|(name, offset)| (name.to_string(), offset))
            .ok_or(IrError::QubitNotInRegister(physical))
    }

    /// Resolve the classical register covering a classical index.
    pub fn classical_register_and_index(&self, classical: Clbit) -> IrResult<(String, u16)> {
        register::resolve(&self.cregs, classical)
            .map(|(name, offset)| (name.to_string(), offset))
            .ok_or(IrError::QubitNotInRegister(classical))
    }

    /// Whether a physical qubit lies inside an ancillary register.
    pub fn physical_qubit_is_ancillary(&self, physical: Qubit) -> bool {
        self.ancregs.values().any(|reg| reg.contains(physical))
    }

    /// Mark a logical qubit as garbage.
    pub fn set_logical_qubit_garbage(&mut self, logical: Qubit) {
        self.garbage.insert(logical as usize);
    }

    /// Largest logical index assigned in the initial layout.
    pub fn highest_logical_qubit_index(&self) -> Qubit {
        self.initial_layout.values().copied().max().unwrap_or(0)
    }

    // =========================================================================
    // Qubit surgery
    // =========================================================================

    /// Remove a logical qubit from the circuit.
    ///
    /// Returns the physical index the qubit was assigned to, together with
    /// the logical index it mapped to in the output permutation (if any).
    /// Registers shrink or split (`name_l`/`name_h`) as needed, the bitsets
    /// shift down, and the new qubit count is broadcast to every operation.
    pub fn remove_qubit(&mut self, logical: Qubit) -> IrResult<(Qubit, Option<Qubit>)> {
        let physical = self
            .initial_layout
            .iter()
            .find_map(|(&p, &l)| (l == logical).then_some(p))
            .ok_or(IrError::QubitNotFound(logical))?;

        let (reg_name, offset) = self.qubit_register_and_index(physical)?;
        debug!(logical, physical, register = %reg_name, "removing qubit");

        if self.physical_qubit_is_ancillary(physical) {
            Self::shrink_register(&mut self.ancregs, &reg_name, offset);
            self.nancillae -= 1;
        } else {
            Self::shrink_register(&mut self.qregs, &reg_name, offset);
            self.nqubits -= 1;
        }

        self.initial_layout.shift_remove(&physical);
        let output = self.output_permutation.shift_remove(&physical);

        self.broadcast_nqubits();

        // Shift the ancillary/garbage flags down over the removed index.
        let total = self.total_qubits() as usize;
        for i in logical as usize..total {
            self.ancillary.set(i, self.ancillary.contains(i + 1));
            self.garbage.set(i, self.garbage.contains(i + 1));
        }
        self.ancillary.set(total, false);
        self.garbage.set(total, false);

        Ok((physical, output))
    }

    fn shrink_register(regs: &mut RegisterMap, name: &str, offset: u16) {
        let Some(reg) = regs.get(name).copied() else {
            return;
        };
        if offset == 0 && reg.size == 1 {
            regs.remove(name);
        } else if offset == 0 {
            if let Some(entry) = regs.get_mut(name) {
                entry.start += 1;
                entry.size -= 1;
            }
        } else if offset == reg.size - 1 {
            if let Some(entry) = regs.get_mut(name) {
                entry.size -= 1;
            }
        } else {
            // Interior removal splits the block.
            regs.remove(name);
            regs.insert(format!("{name}_l"), Register::new(reg.start, offset));
            regs.insert(
                format!("{name}_h"),
                Register::new(reg.start + offset + 1, reg.size - offset - 1),
            );
        }
    }

    /// Insert a physical qubit as an ancilla.
    ///
    /// The qubit is fused into an adjacent ancillary register when possible,
    /// otherwise a fresh register is created. The new logical index is the
    /// current top of the range.
    pub fn add_ancillary_qubit(
        &mut self,
        physical: Qubit,
        output: Option<Qubit>,
    ) -> IrResult<()> {
        if self.initial_layout.contains_key(&physical)
            || self.output_permutation.contains_key(&physical)
        {
            return Err(IrError::QubitAlreadyAssigned(physical));
        }
        self.check_capacity(1)?;

        let mut fused = false;
        for reg in self.ancregs.values_mut() {
            if reg.start == physical + 1 {
                reg.start -= 1;
                reg.size += 1;
                fused = true;
                break;
            }
            if reg.end() == physical {
                reg.size += 1;
                fused = true;
                break;
            }
        }
        if self.ancregs.is_empty() {
            self.ancregs
                .insert(DEFAULT_ANCREG.to_string(), Register::new(physical, 1));
        } else if !fused {
            self.ancregs.insert(
                format!("{DEFAULT_ANCREG}_{physical}"),
                Register::new(physical, 1),
            );
        }

        let logical = self.total_qubits();
        self.nancillae += 1;
        self.ancillary.insert(logical as usize);

        self.initial_layout.insert(physical, logical);
        if let Some(out) = output {
            self.output_permutation.insert(physical, out);
        }
        self.broadcast_nqubits();
        Ok(())
    }

    /// Insert a physical qubit carrying the given logical index.
    ///
    /// Ancillary register bases shift up by one when the qubit lands at the
    /// top of the non-ancilla range, keeping ancillae above every quantum
    /// register. Register consolidation runs before a fresh singleton
    /// register would be created.
    pub fn add_qubit(
        &mut self,
        logical: Qubit,
        physical: Qubit,
        output: Option<Qubit>,
    ) -> IrResult<()> {
        if self.initial_layout.contains_key(&physical)
            || self.output_permutation.contains_key(&physical)
        {
            return Err(IrError::QubitAlreadyAssigned(physical));
        }
        if logical > self.nqubits {
            return Err(IrError::QubitIndexOutOfRange {
                index: logical,
                nqubits: self.nqubits,
            });
        }
        self.check_capacity(1)?;

        let mut fused = false;
        for reg in self.qregs.values_mut() {
            if reg.start == physical + 1 {
                reg.start -= 1;
                reg.size += 1;
                fused = true;
                break;
            }
            if reg.end() == physical {
                if physical == self.nqubits {
                    for ancreg in self.ancregs.values_mut() {
                        ancreg.start += 1;
                    }
                }
                reg.size += 1;
                fused = true;
                break;
            }
        }

        register::consolidate(&mut self.qregs);

        if self.qregs.is_empty() {
            self.qregs
                .insert(DEFAULT_QREG.to_string(), Register::new(physical, 1));
        } else if !fused {
            self.qregs.insert(
                format!("{DEFAULT_QREG}_{physical}"),
                Register::new(physical, 1),
            );
        }

        self.nqubits += 1;
        self.initial_layout.insert(physical, logical);
        if let Some(out) = output {
            self.output_permutation.insert(physical, out);
        }
        self.broadcast_nqubits();

        // Shift the ancillary/garbage flags up over the inserted index.
        let total = self.total_qubits() as usize;
        for i in ((logical as usize + 1)..total).rev() {
            self.ancillary.set(i, self.ancillary.contains(i - 1));
            self.garbage.set(i, self.garbage.contains(i - 1));
        }
        self.ancillary.set(logical as usize, false);
        self.garbage.set(logical as usize, false);
        Ok(())
    }

    /// Whether no operation acts on the given physical qubit.
    pub fn is_idle_qubit(&self, physical: Qubit) -> bool {
        !self.ops.iter().any(|op| op.acts_on(physical))
    }

    /// Remove idle qubits from the circuit.
    ///
    /// Visits physical qubits in descending order. A qubit is stripped when
    /// no operation acts on it and either `force` is set or its output
    /// mapping is absent. Remaining layout entries are renumbered so logical
    /// indices stay contiguous.
    pub fn strip_idle_qubits(&mut self, force: bool) -> IrResult<()> {
        let mut physicals: Vec<Qubit> = self.initial_layout.keys().copied().collect();
        physicals.sort_unstable_by(|a, b| b.cmp(a));

        for physical in physicals {
            if !self.is_idle_qubit(physical) {
                continue;
            }
            if self.output_permutation.contains_key(&physical) && !force {
                continue;
            }

            let logical = self.initial_layout[&physical];
            debug!(physical, logical, "stripping idle qubit");
            self.remove_qubit(logical)?;

            if logical < self.total_qubits() {
                for l in self.initial_layout.values_mut() {
                    if *l > logical {
                        *l -= 1;
                    }
                }
                for l in self.output_permutation.values_mut() {
                    if *l > logical {
                        *l -= 1;
                    }
                }
            }
        }
        self.broadcast_nqubits();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Control, OpKind};

    fn check_invariants(circuit: &Circuit) {
        let total = circuit.total_qubits();
        // P1: every touched index is in range.
        for op in &circuit.ops {
            assert!(op.max_index() < total);
        }
        // P3: layouts are injective.
        let mut seen: Vec<Qubit> = circuit.initial_layout.values().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), circuit.initial_layout.len());
        let mut seen: Vec<Qubit> = circuit.output_permutation.values().copied().collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), circuit.output_permutation.len());
        // P4: ancillary flags only above the qubit range.
        for q in 0..circuit.nqubits {
            assert!(!circuit.ancillary.contains(q as usize));
        }
        // P5: register blocks of one kind are pairwise disjoint and ancilla
        // blocks lie above every quantum block.
        for (name_a, a) in &circuit.qregs {
            for (name_b, b) in &circuit.qregs {
                if name_a != name_b {
                    assert!(a.end() <= b.start || b.end() <= a.start);
                }
            }
        }
        for anc in circuit.ancregs.values() {
            for q in circuit.qregs.values() {
                assert!(anc.start >= q.end());
            }
        }
    }

    #[test]
    fn test_add_qubit_register() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(3, "q").unwrap();
        assert_eq!(circuit.nqubits, 3);
        assert_eq!(circuit.initial_layout.len(), 3);
        assert_eq!(circuit.output_permutation.len(), 3);
        check_invariants(&circuit);

        // Extending the register at the top of the range is allowed.
        circuit.add_qubit_register(2, "q").unwrap();
        assert_eq!(circuit.qregs["q"], Register::new(0, 5));
        check_invariants(&circuit);
    }

    #[test]
    fn test_add_qubit_register_rejected_with_ancillae() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(2, "q").unwrap();
        circuit.add_ancillary_register(1, "anc").unwrap();
        assert!(matches!(
            circuit.add_qubit_register(1, "r"),
            Err(IrError::AncillaePresent)
        ));
    }

    #[test]
    fn test_capacity_limit() {
        let mut circuit = Circuit::new("test");
        assert!(matches!(
            circuit.add_qubit_register(MAX_QUBITS as u16 + 1, "q"),
            Err(IrError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn test_ancillary_register_marks_bits() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(2, "q").unwrap();
        circuit.add_ancillary_register(2, "anc").unwrap();
        assert_eq!(circuit.nancillae, 2);
        assert!(circuit.ancillary.contains(2));
        assert!(circuit.ancillary.contains(3));
        assert_eq!(circuit.ancregs["anc"], Register::new(2, 2));
        check_invariants(&circuit);
    }

    #[test]
    fn test_remove_first_and_last_qubit_of_register() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(3, "q").unwrap();

        let (physical, output) = circuit.remove_qubit(0).unwrap();
        assert_eq!(physical, 0);
        assert_eq!(output, Some(0));
        assert_eq!(circuit.qregs["q"], Register::new(1, 2));
        assert_eq!(circuit.nqubits, 2);

        let (physical, _) = circuit.remove_qubit(2).unwrap();
        assert_eq!(physical, 2);
        assert_eq!(circuit.qregs["q"], Register::new(1, 1));
    }

    #[test]
    fn test_remove_interior_qubit_splits_register() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(3, "q").unwrap();
        circuit.remove_qubit(1).unwrap();

        assert_eq!(circuit.qregs.len(), 2);
        assert_eq!(circuit.qregs["q_l"], Register::new(0, 1));
        assert_eq!(circuit.qregs["q_h"], Register::new(2, 1));
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(2, "q").unwrap();
        let reference = circuit.clone();

        circuit.add_qubit(2, 2, Some(2)).unwrap();
        assert_eq!(circuit.nqubits, 3);
        circuit.remove_qubit(2).unwrap();

        assert_eq!(circuit.nqubits, reference.nqubits);
        assert_eq!(circuit.qregs, reference.qregs);
        assert_eq!(circuit.initial_layout, reference.initial_layout);
        assert_eq!(circuit.output_permutation, reference.output_permutation);
        check_invariants(&circuit);
    }

    #[test]
    fn test_add_qubit_shifts_ancilla_bases() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(1, "q").unwrap();
        circuit.add_ancillary_register(1, "anc").unwrap();

        // Scatter the ancilla to physical wire 2, leaving wire 1 free.
        circuit.initial_layout.shift_remove(&1);
        circuit.initial_layout.insert(2, 1);
        circuit.output_permutation.shift_remove(&1);
        circuit.output_permutation.insert(2, 1);

        // Inserting at the top of the qubit range pushes the ancilla block up.
        circuit.add_qubit(1, 1, None).unwrap();
        assert_eq!(circuit.qregs["q"], Register::new(0, 2));
        assert_eq!(circuit.ancregs["anc"], Register::new(2, 1));
        assert_eq!(circuit.nqubits, 2);
        assert!(circuit.ancillary.contains(2));
        assert!(!circuit.ancillary.contains(1));
    }

    #[test]
    fn test_add_ancillary_qubit_fuses() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(1, "q").unwrap();
        circuit.add_ancillary_qubit(1, None).unwrap();
        circuit.add_ancillary_qubit(2, Some(2)).unwrap();

        assert_eq!(circuit.ancregs.len(), 1);
        assert_eq!(circuit.ancregs[DEFAULT_ANCREG], Register::new(1, 2));
        assert_eq!(circuit.nancillae, 2);
        assert!(circuit.output_permutation.contains_key(&2));
        assert!(!circuit.output_permutation.contains_key(&1));
    }

    #[test]
    fn test_add_ancillary_qubit_rejects_assigned() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(1, "q").unwrap();
        assert!(matches!(
            circuit.add_ancillary_qubit(0, None),
            Err(IrError::QubitAlreadyAssigned(0))
        ));
    }

    #[test]
    fn test_strip_idle_qubits() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(3, "q").unwrap();
        circuit.push_standard(StandardOperation::new(3, 0, OpKind::H));
        circuit.push_standard(StandardOperation::new(3, 2, OpKind::H));

        circuit.strip_idle_qubits(true).unwrap();

        assert_eq!(circuit.nqubits, 2);
        assert_eq!(circuit.initial_layout.get(&0), Some(&0));
        assert_eq!(circuit.initial_layout.get(&2), Some(&1));
        assert!(!circuit.initial_layout.contains_key(&1));
        check_invariants(&circuit);
    }

    #[test]
    fn test_strip_keeps_live_outputs_without_force() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(2, "q").unwrap();
        circuit.push_standard(StandardOperation::new(2, 0, OpKind::H));

        // Qubit 1 is idle but still mapped in the output permutation.
        circuit.strip_idle_qubits(false).unwrap();
        assert_eq!(circuit.nqubits, 2);

        circuit.output_permutation.shift_remove(&1);
        circuit.strip_idle_qubits(false).unwrap();
        assert_eq!(circuit.nqubits, 1);
    }

    #[test]
    fn test_nqubits_broadcast() {
        let mut circuit = Circuit::new("test");
        circuit.add_qubit_register(2, "q").unwrap();
        circuit.push_standard(StandardOperation::controlled(
            2,
            vec![Control::pos(0)],
            1,
            OpKind::X,
        ));
        circuit.add_ancillary_register(1, "anc").unwrap();
        assert!(circuit.ops.iter().all(|op| op.nqubits() == 3));
    }
}
