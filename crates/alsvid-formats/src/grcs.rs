//! GRCS importer.
//!
//! The first token is the qubit count; every following non-empty line is a
//! `cycle name args` record drawn from the GRCS benchmark gate set.

use alsvid_ir::{Circuit, Control, OpKind, Qubit, StandardOperation};
use std::f64::consts::FRAC_PI_2;

use crate::error::{FormatError, FormatResult};

/// Parse a GRCS source into a circuit.
pub fn parse_grcs(source: &str) -> FormatResult<Circuit> {
    parse_grcs_named(source, "grcs")
}

/// Parse a GRCS source into a circuit with the given name.
pub fn parse_grcs_named(source: &str, name: &str) -> FormatResult<Circuit> {
    let mut circuit = Circuit::new(name);
    let mut lines = source.lines().enumerate();

    let nqubits = loop {
        match lines.next() {
            Some((line, raw)) => {
                let Some(token) = raw.split_whitespace().next() else {
                    continue;
                };
                break token.parse::<Qubit>().map_err(|_| FormatError::BadHeader {
                    line: line + 1,
                    message: "expected qubit count".into(),
                })?;
            }
            None => {
                return Err(FormatError::BadHeader {
                    line: 0,
                    message: "empty input".into(),
                });
            }
        }
    };
    circuit.nqubits = nqubits;

    for (index, raw) in lines {
        let line = index + 1;
        let mut tokens = raw.split_whitespace();
        let Some(cycle) = tokens.next() else {
            continue;
        };
        cycle.parse::<u32>().map_err(|_| FormatError::Syntax {
            line,
            message: "expected cycle number".into(),
        })?;
        let identifier = tokens.next().ok_or_else(|| FormatError::Syntax {
            line,
            message: "expected gate identifier".into(),
        })?;

        let next_qubit = |tokens: &mut std::str::SplitWhitespace<'_>| {
            tokens
                .next()
                .and_then(|t| t.parse::<Qubit>().ok())
                .ok_or_else(|| FormatError::Syntax {
                    line,
                    message: "expected qubit index".into(),
                })
        };

        match identifier {
            "cz" => {
                let control = next_qubit(&mut tokens)?;
                let target = next_qubit(&mut tokens)?;
                circuit.push_standard(StandardOperation::controlled(
                    nqubits,
                    vec![Control::pos(control)],
                    target,
                    OpKind::Z,
                ));
            }
            "h" => {
                let target = next_qubit(&mut tokens)?;
                circuit.push_standard(StandardOperation::new(nqubits, target, OpKind::H));
            }
            "t" => {
                let target = next_qubit(&mut tokens)?;
                circuit.push_standard(StandardOperation::new(nqubits, target, OpKind::T));
            }
            "x_1_2" => {
                let target = next_qubit(&mut tokens)?;
                circuit.push_standard(StandardOperation::with_parameter(
                    nqubits,
                    target,
                    OpKind::RX,
                    FRAC_PI_2,
                ));
            }
            "y_1_2" => {
                let target = next_qubit(&mut tokens)?;
                circuit.push_standard(StandardOperation::with_parameter(
                    nqubits,
                    target,
                    OpKind::RY,
                    FRAC_PI_2,
                ));
            }
            other => return Err(FormatError::UndefinedGate(other.to_string())),
        }
    }

    for i in 0..nqubits {
        circuit.initial_layout.insert(i, i);
        circuit.output_permutation.insert(i, i);
    }
    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::Operation;

    #[test]
    fn test_grcs_import() {
        let source = "\
4
0 h 0
0 h 1
1 cz 0 1
2 t 2
3 x_1_2 3
4 y_1_2 0
";
        let circuit = parse_grcs(source).unwrap();
        assert_eq!(circuit.nqubits, 4);
        assert_eq!(circuit.ops.len(), 6);
        match &circuit.ops[2] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::Z);
                assert_eq!(op.controls[0].qubit, 0);
                assert_eq!(op.targets, vec![1]);
            }
            other => panic!("expected CZ, got {other:?}"),
        }
        match &circuit.ops[4] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::RX);
                assert!((op.parameters[0] - FRAC_PI_2).abs() < 1e-12);
            }
            other => panic!("expected RX, got {other:?}"),
        }
        assert_eq!(circuit.initial_layout.len(), 4);
        assert_eq!(circuit.output_permutation.len(), 4);
    }

    #[test]
    fn test_unknown_gate() {
        let source = "2\n0 bogus 0\n";
        assert!(matches!(
            parse_grcs(source),
            Err(FormatError::UndefinedGate(name)) if name == "bogus"
        ));
    }
}
