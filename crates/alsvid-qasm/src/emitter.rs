//! `OpenQASM` 2 emitter.
//!
//! Writes the reserved layout comments, sorted register declarations, and
//! the operation stream in a form this crate's parser reads back. Register
//! consolidation runs before anything is written.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use alsvid_ir::register::{consolidate, sorted_by_start, DEFAULT_ANCREG, DEFAULT_CREG, DEFAULT_QREG};
use alsvid_ir::{
    Circuit, NonUnitaryKind, OpKind, Operation, Polarity, Qubit, Register, StandardOperation,
};

use crate::error::ParseResult;

/// Serialise a circuit as `OpenQASM` 2.
///
/// Physical wires missing from the initial layout are re-inserted first so
/// the declared registers tile the whole index range.
pub fn dump(circuit: &mut Circuit) -> ParseResult<String> {
    consolidate(&mut circuit.qregs);
    consolidate(&mut circuit.cregs);
    consolidate(&mut circuit.ancregs);

    if !circuit.qregs.is_empty() {
        let top = circuit.initial_layout.keys().copied().max().unwrap_or(0);
        for physical in 0..top {
            if !circuit.initial_layout.contains_key(&physical) {
                let logical = circuit.highest_logical_qubit_index() + 1;
                circuit.add_qubit(logical, physical, None)?;
            }
        }
    }

    let mut out = String::new();

    let inverse_initial: BTreeMap<Qubit, Qubit> = circuit
        .initial_layout
        .iter()
        .map(|(&p, &l)| (l, p))
        .collect();
    out.push_str("// i");
    for physical in inverse_initial.values() {
        let _ = write!(out, " {physical}");
    }
    out.push('\n');

    let inverse_output: BTreeMap<Qubit, Qubit> = circuit
        .output_permutation
        .iter()
        .map(|(&p, &l)| (l, p))
        .collect();
    out.push_str("// o");
    for physical in inverse_output.values() {
        let _ = write!(out, " {physical}");
    }
    out.push('\n');

    out.push_str("OPENQASM 2.0;\n");
    out.push_str("include \"qelib1.inc\";\n");

    emit_registers(&mut out, circuit, "qreg", true);
    emit_registers(&mut out, circuit, "creg", false);
    for (name, reg) in sorted_by_start(&circuit.ancregs) {
        let _ = writeln!(out, "qreg {name}[{}];", reg.size);
    }
    if circuit.ancregs.is_empty() && circuit.nancillae > 0 {
        let _ = writeln!(out, "qreg {DEFAULT_ANCREG}[{}];", circuit.nancillae);
    }

    let mut qnames = register_names(&circuit.qregs, circuit.nqubits, DEFAULT_QREG);
    let cnames = register_names(&circuit.cregs, circuit.nclassics, DEFAULT_CREG);
    qnames.extend(register_names(
        &circuit.ancregs,
        circuit.nancillae,
        DEFAULT_ANCREG,
    ));

    for op in &circuit.ops {
        emit_op(&mut out, circuit, op, &qnames, &cnames, "");
    }
    Ok(out)
}

fn emit_registers(out: &mut String, circuit: &Circuit, keyword: &str, quantum: bool) {
    let (regs, count, default) = if quantum {
        (&circuit.qregs, circuit.nqubits, DEFAULT_QREG)
    } else {
        (&circuit.cregs, circuit.nclassics, DEFAULT_CREG)
    };
    if regs.is_empty() {
        if count > 0 {
            let _ = writeln!(out, "{keyword} {default}[{count}];");
        }
        return;
    }
    for (name, reg) in sorted_by_start(regs) {
        let _ = writeln!(out, "{keyword} {name}[{}];", reg.size);
    }
}

/// Wire-indexed `(register, register[offset])` name pairs.
fn register_names(
    regs: &alsvid_ir::RegisterMap,
    default_count: u16,
    default_name: &str,
) -> Vec<(String, String)> {
    let mut names = Vec::new();
    if regs.is_empty() {
        for i in 0..default_count {
            names.push((default_name.to_string(), format!("{default_name}[{i}]")));
        }
        return names;
    }
    for (name, reg) in sorted_by_start(regs) {
        for i in 0..reg.size {
            names.push((name.to_string(), format!("{name}[{i}]")));
        }
    }
    names
}

fn whole_register(names: &[(String, String)], first: Qubit, last: Qubit, count: usize) -> bool {
    let (Some(head), Some(tail)) = (names.get(first as usize), names.get(last as usize)) else {
        return false;
    };
    head.0 == tail.0
        && head.1.ends_with("[0]")
        && names
            .iter()
            .filter(|(reg, _)| *reg == head.0)
            .count()
            == count
}

fn emit_op(
    out: &mut String,
    circuit: &Circuit,
    op: &Operation,
    qnames: &[(String, String)],
    cnames: &[(String, String)],
    prefix: &str,
) {
    match op {
        Operation::Standard(std_op) => emit_standard(out, std_op, qnames, prefix),
        Operation::Compound(compound) => {
            for child in &compound.ops {
                emit_standard(out, child, qnames, prefix);
            }
        }
        Operation::NonUnitary(nu) => match &nu.kind {
            NonUnitaryKind::Measure { qubits, classics } => {
                let collapse = !qubits.is_empty()
                    && whole_register(qnames, qubits[0], qubits[qubits.len() - 1], qubits.len())
                    && whole_register(
                        cnames,
                        classics[0],
                        classics[classics.len() - 1],
                        classics.len(),
                    );
                if collapse {
                    let _ = writeln!(
                        out,
                        "{prefix}measure {} -> {};",
                        qnames[qubits[0] as usize].0, cnames[classics[0] as usize].0
                    );
                } else {
                    for (q, c) in qubits.iter().zip(classics) {
                        let _ = writeln!(
                            out,
                            "{prefix}measure {} -> {};",
                            qnames[*q as usize].1, cnames[*c as usize].1
                        );
                    }
                }
            }
            NonUnitaryKind::Reset { qubits } => {
                if !qubits.is_empty()
                    && whole_register(qnames, qubits[0], qubits[qubits.len() - 1], qubits.len())
                {
                    let _ = writeln!(out, "{prefix}reset {};", qnames[qubits[0] as usize].0);
                } else {
                    for q in qubits {
                        let _ = writeln!(out, "{prefix}reset {};", qnames[*q as usize].1);
                    }
                }
            }
            NonUnitaryKind::Barrier { qubits } => {
                if !qubits.is_empty()
                    && whole_register(qnames, qubits[0], qubits[qubits.len() - 1], qubits.len())
                {
                    let _ = writeln!(out, "{prefix}barrier {};", qnames[qubits[0] as usize].0);
                } else {
                    for q in qubits {
                        let _ = writeln!(out, "{prefix}barrier {};", qnames[*q as usize].1);
                    }
                }
            }
            NonUnitaryKind::Snapshot { qubits, id } => {
                if !qubits.is_empty() {
                    let args: Vec<&str> = qubits
                        .iter()
                        .map(|q| qnames[*q as usize].1.as_str())
                        .collect();
                    let _ = writeln!(out, "{prefix}snapshot({id}) {};", args.join(", "));
                }
            }
            NonUnitaryKind::ShowProbabilities => {
                let _ = writeln!(out, "{prefix}show_probabilities;");
            }
        },
        Operation::ClassicControlled(cc) => {
            let creg_name = classical_register_name(circuit, cc.creg);
            let if_prefix = format!("{prefix}if ({creg_name} == {}) ", cc.expected);
            emit_op(out, circuit, &cc.op, qnames, cnames, &if_prefix);
        }
    }
}

fn classical_register_name(circuit: &Circuit, slice: Register) -> String {
    circuit
        .cregs
        .iter()
        .find(|(_, reg)| **reg == slice)
        .map(|(name, _)| name.clone())
        .unwrap_or_else(|| DEFAULT_CREG.to_string())
}

fn emit_standard(
    out: &mut String,
    op: &StandardOperation,
    qnames: &[(String, String)],
    prefix: &str,
) {
    // Negative controls are realised by conjugating with X.
    let negatives: Vec<Qubit> = op
        .controls
        .iter()
        .filter(|c| c.polarity == Polarity::Neg)
        .map(|c| c.qubit)
        .collect();
    for q in &negatives {
        let _ = writeln!(out, "{prefix}x {};", qnames[*q as usize].1);
    }

    let controls = "c".repeat(op.controls.len());
    let p = op.parameters;
    let mnemonic = match op.kind {
        OpKind::U3 => format!("u3({},{},{})", p[2], p[1], p[0]),
        OpKind::U2 => format!("u2({},{})", p[1], p[0]),
        OpKind::U1 => format!("u1({})", p[0]),
        OpKind::RX => format!("rx({})", p[0]),
        OpKind::RY => format!("ry({})", p[0]),
        OpKind::RZ => format!("rz({})", p[0]),
        OpKind::V => "u3(1.5707963267948966,-1.5707963267948966,1.5707963267948966)".to_string(),
        OpKind::Vdg => "u3(1.5707963267948966,1.5707963267948966,-1.5707963267948966)".to_string(),
        kind => kind.name().to_string(),
    };

    let mut operands: Vec<&str> = op
        .controls
        .iter()
        .map(|c| qnames[c.qubit as usize].1.as_str())
        .collect();

    match op.kind {
        OpKind::ISwap => {
            // iSWAP = SWAP · (S ⊗ S) · CZ, emitted as its expansion.
            let a = qnames[op.targets[0] as usize].1.as_str();
            let b = qnames[op.targets[1] as usize].1.as_str();
            let _ = writeln!(out, "{prefix}cz {a},{b};");
            let _ = writeln!(out, "{prefix}s {a};");
            let _ = writeln!(out, "{prefix}s {b};");
            let _ = writeln!(out, "{prefix}swap {a},{b};");
        }
        OpKind::Peres | OpKind::Peresdg => {
            let t0 = qnames[op.targets[0] as usize].1.as_str();
            let t1 = qnames[op.targets[1] as usize].1.as_str();
            let ctrl_list = if operands.is_empty() {
                String::new()
            } else {
                format!("{},", operands.join(","))
            };
            let toffoli = format!(
                "{prefix}{}x {ctrl_list}{t1},{t0};",
                "c".repeat(op.controls.len() + 1)
            );
            let cnot = format!("{prefix}{}x {ctrl_list}{t1};", "c".repeat(op.controls.len()));
            if op.kind == OpKind::Peres {
                let _ = writeln!(out, "{toffoli}");
                let _ = writeln!(out, "{cnot}");
            } else {
                let _ = writeln!(out, "{cnot}");
                let _ = writeln!(out, "{toffoli}");
            }
        }
        _ => {
            for target in &op.targets {
                operands.push(qnames[*target as usize].1.as_str());
            }
            let _ = writeln!(out, "{prefix}{controls}{mnemonic} {};", operands.join(","));
        }
    }

    for q in &negatives {
        let _ = writeln!(out, "{prefix}x {};", qnames[*q as usize].1);
    }
}
