//! REAL (RevLib) importer.
//!
//! Header commands declare the variable set; gate lines have the shape
//! `⟨gate⟩[⟨n⟩][:⟨λ⟩] ⟨q1⟩ … ⟨qk⟩` where `⟨n⟩` counts the touched qubits and
//! `⟨λ⟩` carries the rotation divisor. A leading `-` on a qubit label marks a
//! negative control. `.define` blocks are not supported and are skipped with
//! a warning.

use alsvid_ir::{Circuit, Control, OpKind, Register, StandardOperation};
use regex::Regex;
use tracing::warn;

use crate::error::{FormatError, FormatResult};

const RZ_DIVISOR_TOLERANCE: f64 = 1e-10;

/// Parse a REAL source into a circuit.
pub fn parse_real(source: &str) -> FormatResult<Circuit> {
    parse_real_named(source, "real")
}

/// Parse a REAL source into a circuit with the given name.
pub fn parse_real_named(source: &str, name: &str) -> FormatResult<Circuit> {
    let mut circuit = Circuit::new(name);
    let mut lines = source.lines().enumerate();
    read_header(&mut circuit, &mut lines)?;
    read_gates(&mut circuit, &mut lines)?;
    Ok(circuit)
}

fn read_header<'a>(
    circuit: &mut Circuit,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> FormatResult<()> {
    let mut in_define = false;
    for (index, raw) in lines.by_ref() {
        let line = index + 1;
        let mut tokens = raw.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        if first.starts_with('#') {
            continue;
        }

        let cmd = first.to_ascii_uppercase();
        if in_define {
            if cmd == ".ENDDEFINE" {
                in_define = false;
            }
            continue;
        }

        if !cmd.starts_with('.') {
            return Err(FormatError::BadHeader {
                line,
                message: "invalid file header".into(),
            });
        }

        match cmd.as_str() {
            ".BEGIN" => return Ok(()),
            ".NUMVARS" => {
                let nqubits = tokens.next().and_then(|t| t.parse::<u16>().ok()).unwrap_or(0);
                circuit.nqubits = nqubits;
                circuit.nclassics = nqubits;
            }
            ".VARIABLES" => {
                for i in 0..circuit.nqubits {
                    let Some(variable) = tokens.next().filter(|v| !v.starts_with('.')) else {
                        return Err(FormatError::BadHeader {
                            line,
                            message: "invalid or insufficient variables declared".into(),
                        });
                    };
                    circuit
                        .qregs
                        .insert(variable.to_string(), Register::new(i, 1));
                    circuit
                        .cregs
                        .insert(format!("c_{variable}"), Register::new(i, 1));
                    circuit.initial_layout.insert(i, i);
                    circuit.output_permutation.insert(i, i);
                }
            }
            ".CONSTANTS" => {
                let Some(values) = tokens.next() else {
                    return Err(FormatError::BadHeader {
                        line,
                        message: "failed read in '.constants' line".into(),
                    });
                };
                let mut chars = values.chars();
                for i in 0..circuit.nqubits {
                    match chars.next() {
                        Some('1') => {
                            let op = StandardOperation::new(circuit.nqubits, i, OpKind::X);
                            circuit.push_standard(op);
                        }
                        Some('0' | '-') => {}
                        Some(other) => {
                            return Err(FormatError::BadHeader {
                                line,
                                message: format!(
                                    "invalid value in '.constants' header: '{other}'"
                                ),
                            });
                        }
                        None => {
                            return Err(FormatError::BadHeader {
                                line,
                                message: "failed read in '.constants' line".into(),
                            });
                        }
                    }
                }
            }
            ".INPUTS" | ".OUTPUTS" | ".GARBAGE" | ".VERSION" | ".INPUTBUS" | ".OUTPUTBUS" => {}
            ".DEFINE" => {
                warn!("file contains a '.define' statement, which is not supported and skipped");
                in_define = true;
            }
            _ => {
                return Err(FormatError::UnknownCommand {
                    line,
                    command: cmd,
                });
            }
        }
    }
    Err(FormatError::BadHeader {
        line: 0,
        message: "invalid file header".into(),
    })
}

fn read_gates<'a>(
    circuit: &mut Circuit,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> FormatResult<()> {
    let gate_regex = Regex::new(
        r"^(r[xyz]|q|[0a-z](?:[+i])?)(\d+)?(?::([-+]?[0-9]+\.?[0-9]*(?:[eE][-+]?[0-9]+)?))?$",
    )
    .expect("gate regex is valid");

    for (index, raw) in lines.by_ref() {
        let line = index + 1;
        let mut tokens = raw.split_whitespace();
        let Some(first) = tokens.next() else {
            continue;
        };
        if first.starts_with('#') {
            continue;
        }

        let cmd = first.to_ascii_lowercase();
        if cmd == ".end" {
            break;
        }

        let captures = gate_regex
            .captures(&cmd)
            .ok_or_else(|| FormatError::UndefinedGate(cmd.clone()))?;
        let identifier = &captures[1];
        let kind = if identifier == "t" {
            OpKind::X
        } else {
            gate_for_identifier(identifier).ok_or_else(|| FormatError::UndefinedGate(cmd.clone()))?
        };
        let mut ncontrols = captures
            .get(2)
            .and_then(|m| m.as_str().parse::<usize>().ok())
            .map_or(0, |n| n.saturating_sub(1));
        let lambda = captures
            .get(3)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        if matches!(kind, OpKind::V | OpKind::Vdg) || identifier == "c" {
            ncontrols = 1;
        } else if matches!(kind, OpKind::Peres | OpKind::Peresdg) {
            ncontrols = 2;
        }

        if ncontrols as u16 >= circuit.nqubits {
            return Err(FormatError::Syntax {
                line,
                message: format!(
                    "gate acts on {} qubits, but only {} are available",
                    ncontrols + 1,
                    circuit.nqubits
                ),
            });
        }

        let mut controls = Vec::with_capacity(ncontrols);
        for _ in 0..ncontrols {
            let Some(label) = tokens.next() else {
                return Err(FormatError::ArgumentCountMismatch {
                    expected: ncontrols + 1,
                    got: controls.len(),
                });
            };
            let (label, negative) = match label.strip_prefix('-') {
                Some(stripped) => (stripped, true),
                None => (label, false),
            };
            let reg = circuit
                .qregs
                .get(label)
                .ok_or_else(|| FormatError::UnknownRegister(label.to_string()))?;
            controls.push(if negative {
                Control::neg(reg.start)
            } else {
                Control::pos(reg.start)
            });
        }

        let Some(label) = tokens.next() else {
            return Err(FormatError::ArgumentCountMismatch {
                expected: ncontrols + 1,
                got: controls.len(),
            });
        };
        let target = circuit
            .qregs
            .get(label)
            .map(|reg| reg.start)
            .ok_or_else(|| FormatError::UnknownRegister(label.to_string()))?;

        circuit.update_max_controls(ncontrols as u16);
        let nqubits = circuit.nqubits;

        match kind {
            OpKind::I
            | OpKind::H
            | OpKind::Y
            | OpKind::Z
            | OpKind::S
            | OpKind::Sdg
            | OpKind::T
            | OpKind::Tdg
            | OpKind::V
            | OpKind::Vdg
            | OpKind::U3
            | OpKind::U2 => {
                circuit.push_standard(StandardOperation::controlled_with_parameter(
                    nqubits, controls, target, kind, lambda,
                ));
            }
            OpKind::X => {
                circuit.push_standard(StandardOperation::controlled(
                    nqubits,
                    controls,
                    target,
                    OpKind::X,
                ));
            }
            OpKind::RX | OpKind::RY => {
                circuit.push_standard(StandardOperation::controlled_with_parameter(
                    nqubits,
                    controls,
                    target,
                    kind,
                    std::f64::consts::PI / lambda,
                ));
            }
            OpKind::RZ | OpKind::U1 => {
                let op = rz_from_divisor(nqubits, controls, target, kind, lambda);
                circuit.push_standard(op);
            }
            OpKind::Swap | OpKind::Peres | OpKind::Peresdg | OpKind::ISwap => {
                let Some(second) = controls.pop() else {
                    return Err(FormatError::ArgumentCountMismatch {
                        expected: 2,
                        got: 1,
                    });
                };
                circuit.push_standard(StandardOperation::two_target(
                    nqubits,
                    controls,
                    target,
                    second.qubit,
                    kind,
                ));
            }
        }
    }
    Ok(())
}

/// RZ/U1 angles written as divisors of π collapse to the matching phase gate
/// when the divisor is a near-integer.
fn rz_from_divisor(
    nqubits: u16,
    controls: Vec<Control>,
    target: u16,
    kind: OpKind,
    lambda: f64,
) -> StandardOperation {
    let rounded = lambda.round();
    if (lambda - rounded).abs() < RZ_DIVISOR_TOLERANCE {
        let collapsed = if rounded == 1.0 || rounded == -1.0 {
            Some(OpKind::Z)
        } else if rounded == 2.0 {
            Some(OpKind::S)
        } else if rounded == -2.0 {
            Some(OpKind::Sdg)
        } else if rounded == 4.0 {
            Some(OpKind::T)
        } else if rounded == -4.0 {
            Some(OpKind::Tdg)
        } else {
            None
        };
        if let Some(kind) = collapsed {
            return StandardOperation::controlled(nqubits, controls, target, kind);
        }
        return StandardOperation::controlled_with_parameter(
            nqubits,
            controls,
            target,
            kind,
            std::f64::consts::PI / rounded,
        );
    }
    StandardOperation::controlled_with_parameter(
        nqubits,
        controls,
        target,
        kind,
        std::f64::consts::PI / lambda,
    )
}

fn gate_for_identifier(identifier: &str) -> Option<OpKind> {
    Some(match identifier {
        "0" | "i" => OpKind::I,
        "h" => OpKind::H,
        "n" | "c" | "x" => OpKind::X,
        "y" => OpKind::Y,
        "z" => OpKind::Z,
        "s" => OpKind::S,
        "si" | "s+" => OpKind::Sdg,
        "v" => OpKind::V,
        "vi" | "v+" => OpKind::Vdg,
        "rx" => OpKind::RX,
        "ry" => OpKind::RY,
        "rz" => OpKind::RZ,
        "q" => OpKind::U1,
        "f" => OpKind::Swap,
        "p" => OpKind::Peres,
        "pi" | "p+" => OpKind::Peresdg,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::{Operation, Polarity};

    #[test]
    fn test_toffoli() {
        let source = "\
.numvars 3
.variables a b c
.begin
t3 a b c
.end
";
        let circuit = parse_real(source).unwrap();
        assert_eq!(circuit.nqubits, 3);
        assert_eq!(circuit.ops.len(), 1);
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::X);
                assert_eq!(op.controls.len(), 2);
                assert_eq!(op.controls[0].qubit, 0);
                assert_eq!(op.controls[1].qubit, 1);
                assert_eq!(op.targets, vec![2]);
            }
            other => panic!("expected Toffoli, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_control() {
        let source = "\
.numvars 2
.variables a b
.begin
t2 -a b
.end
";
        let circuit = parse_real(source).unwrap();
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.controls[0].polarity, Polarity::Neg);
            }
            other => panic!("expected gate, got {other:?}"),
        }
    }

    #[test]
    fn test_constants_emit_x() {
        let source = "\
.numvars 3
.variables a b c
.constants -1-
.begin
.end
";
        let circuit = parse_real(source).unwrap();
        assert_eq!(circuit.ops.len(), 1);
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::X);
                assert_eq!(op.targets, vec![1]);
            }
            other => panic!("expected constant initialisation, got {other:?}"),
        }
    }

    #[test]
    fn test_rz_divisor_collapse() {
        let source = "\
.numvars 1
.variables a
.begin
q1:2 a
q1:-4 a
q1:3 a
.end
";
        let circuit = parse_real(source).unwrap();
        let kinds: Vec<OpKind> = circuit
            .ops
            .iter()
            .map(|op| match op {
                Operation::Standard(op) => op.kind,
                other => panic!("unexpected op {other:?}"),
            })
            .collect();
        assert_eq!(kinds[0], OpKind::S);
        assert_eq!(kinds[1], OpKind::Tdg);
        assert_eq!(kinds[2], OpKind::U1);
        match &circuit.ops[2] {
            Operation::Standard(op) => {
                assert!((op.parameters[0] - std::f64::consts::PI / 3.0).abs() < 1e-12);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_peres_takes_two_targets() {
        let source = "\
.numvars 3
.variables a b c
.begin
p3 a b c
.end
";
        let circuit = parse_real(source).unwrap();
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::Peres);
                assert_eq!(op.controls.len(), 1);
                assert_eq!(op.targets, vec![2, 1]);
            }
            other => panic!("expected Peres, got {other:?}"),
        }
    }

    #[test]
    fn test_define_block_skipped() {
        let source = "\
.numvars 1
.variables a
.define
t1 a
.enddefine
.begin
t1 a
.end
";
        let circuit = parse_real(source).unwrap();
        assert_eq!(circuit.ops.len(), 1);
    }

    #[test]
    fn test_unknown_command() {
        let source = ".numvars 1\n.bogus\n.begin\n.end\n";
        match parse_real(source) {
            Err(FormatError::UnknownCommand { command, .. }) => {
                assert_eq!(command, ".BOGUS");
            }
            other => panic!("expected UnknownCommand, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_label() {
        let source = "\
.numvars 1
.variables a
.begin
t1 b
.end
";
        match parse_real(source) {
            Err(FormatError::UnknownRegister(label)) => assert_eq!(label, "b"),
            other => panic!("expected UnknownRegister, got {other:?}"),
        }
    }

    #[test]
    fn test_swap_needs_two_operands() {
        let source = "\
.numvars 2
.variables a b
.begin
f1 a
.end
";
        match parse_real(source) {
            Err(FormatError::ArgumentCountMismatch { expected: 2, .. }) => {}
            other => panic!("expected ArgumentCountMismatch, got {other:?}"),
        }
    }
}
