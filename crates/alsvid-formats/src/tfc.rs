//! TFC importer.
//!
//! The header declares variables (`.v`), inputs (`.i`), outputs (`.o`) and
//! constant initial values for the non-input lines (`.c`). Variables that are
//! not listed as outputs are garbage. Gate lines are `t⟨n⟩`/`f⟨n⟩` followed
//! by comma-separated variable names; a `'` suffix marks a negative control.

use alsvid_ir::{Circuit, Control, OpKind, Qubit, StandardOperation};
use regex::Regex;
use std::collections::HashMap;

use crate::error::{FormatError, FormatResult};

/// Parse a TFC source into a circuit.
pub fn parse_tfc(source: &str) -> FormatResult<Circuit> {
    parse_tfc_named(source, "tfc")
}

/// Parse a TFC source into a circuit with the given name.
pub fn parse_tfc_named(source: &str, name: &str) -> FormatResult<Circuit> {
    let mut circuit = Circuit::new(name);
    let mut lines = source.lines().enumerate();
    let var_map = read_header(&mut circuit, &mut lines)?;
    read_gates(&mut circuit, &mut lines, &var_map)?;
    Ok(circuit)
}

fn comma_list(rest: &[&str]) -> Vec<String> {
    rest.join(" ")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn read_header<'a>(
    circuit: &mut Circuit,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> FormatResult<HashMap<String, Qubit>> {
    let mut variables: Vec<String> = vec![];
    let mut inputs: Vec<String> = vec![];
    let mut outputs: Vec<String> = vec![];
    let mut constants: Vec<String> = vec![];
    let mut header_seen = false;

    for (index, raw) in lines.by_ref() {
        let line = index + 1;
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let Some(&first) = tokens.first() else {
            continue;
        };
        if first.starts_with('#') {
            continue;
        }
        if first == "BEGIN" || first == "begin" {
            header_seen = true;
            break;
        }
        if !first.starts_with('.') {
            return Err(FormatError::BadHeader {
                line,
                message: "invalid file header".into(),
            });
        }

        match first {
            ".v" => variables = comma_list(&tokens[1..]),
            ".i" => {
                for input in comma_list(&tokens[1..]) {
                    if !variables.contains(&input) {
                        return Err(FormatError::BadHeader {
                            line,
                            message: format!("unknown variable in input statement: {input}"),
                        });
                    }
                    inputs.push(input);
                }
            }
            ".o" => {
                for output in comma_list(&tokens[1..]) {
                    if !variables.contains(&output) {
                        return Err(FormatError::BadHeader {
                            line,
                            message: format!("unknown variable in output statement: {output}"),
                        });
                    }
                    outputs.push(output);
                }
            }
            ".c" => constants = comma_list(&tokens[1..]),
            ".ol" => {}
            other => {
                return Err(FormatError::UnknownCommand {
                    line,
                    command: other.to_string(),
                });
            }
        }
    }
    if !header_seen {
        return Err(FormatError::BadHeader {
            line: 0,
            message: "invalid file header".into(),
        });
    }

    circuit.add_qubit_register(inputs.len() as u16, "q")?;
    let nconstants = variables.len() - inputs.len();
    if nconstants > 0 {
        circuit.add_ancillary_register(nconstants as u16, "anc")?;
    }

    // Inputs keep the low indices; constant lines move above them and get
    // their initial value applied.
    let mut var_map: HashMap<String, Qubit> = HashMap::new();
    let mut qidx: Qubit = 0;
    let mut constidx = inputs.len() as Qubit;
    let total = circuit.total_qubits();
    for variable in &variables {
        if inputs.contains(variable) {
            var_map.insert(variable.clone(), qidx);
            qidx += 1;
        } else {
            let value = constants
                .get((constidx as usize) - inputs.len())
                .ok_or_else(|| FormatError::BadHeader {
                    line: 0,
                    message: format!("no constant specified for '{variable}'"),
                })?;
            match value.as_str() {
                "1" => {
                    circuit.push_standard(StandardOperation::new(total, constidx, OpKind::X));
                    var_map.insert(variable.clone(), constidx);
                    constidx += 1;
                }
                "0" => {
                    var_map.insert(variable.clone(), constidx);
                    constidx += 1;
                }
                other => {
                    return Err(FormatError::BadHeader {
                        line: 0,
                        message: format!("non-binary constant specified: {other}"),
                    });
                }
            }
        }
    }

    for (q, variable) in variables.iter().enumerate() {
        let q = q as Qubit;
        let p = var_map[variable];
        circuit.initial_layout.insert(q, p);
        if outputs.contains(variable) {
            circuit.output_permutation.insert(q, p);
        } else {
            circuit.output_permutation.shift_remove(&q);
            circuit.set_logical_qubit_garbage(p);
        }
    }

    Ok(var_map)
}

fn read_gates<'a>(
    circuit: &mut Circuit,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    var_map: &HashMap<String, Qubit>,
) -> FormatResult<()> {
    let gate_regex = Regex::new(r"^([tTfF])(\d+)$").expect("gate regex is valid");
    let total = circuit.total_qubits();

    for (index, raw) in lines.by_ref() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed == "END" || trimmed == "end" {
            break;
        }

        let Some((cmd, rest)) = trimmed
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
        else {
            return Err(FormatError::Syntax {
                line,
                message: format!("unsupported gate detected: {trimmed}"),
            });
        };

        let captures = gate_regex
            .captures(cmd)
            .ok_or_else(|| FormatError::UndefinedGate(cmd.to_string()))?;
        let kind = if captures[1].eq_ignore_ascii_case("t") {
            OpKind::X
        } else {
            OpKind::Swap
        };
        let ncontrols = captures[2].parse::<usize>().map_or(0, |n| n.saturating_sub(1));

        if ncontrols as u16 >= total {
            return Err(FormatError::Syntax {
                line,
                message: format!(
                    "gate acts on {} qubits, but only {total} are available",
                    ncontrols + 1
                ),
            });
        }

        let mut operands = Vec::new();
        for label in rest.split(',') {
            let label = label.trim();
            let (label, negative) = match label.strip_suffix('\'') {
                Some(stripped) => (stripped, true),
                None => (label, false),
            };
            let qubit = *var_map
                .get(label)
                .ok_or_else(|| FormatError::UnknownRegister(label.to_string()))?;
            operands.push(if negative {
                Control::neg(qubit)
            } else {
                Control::pos(qubit)
            });
        }

        circuit.update_max_controls(ncontrols as u16);
        if kind == OpKind::X {
            let Some(target) = operands.pop() else {
                return Err(FormatError::ArgumentCountMismatch {
                    expected: ncontrols + 1,
                    got: 0,
                });
            };
            circuit.push_standard(StandardOperation::controlled(
                total,
                operands,
                target.qubit,
                OpKind::X,
            ));
        } else {
            if operands.len() < 2 {
                return Err(FormatError::ArgumentCountMismatch {
                    expected: 2,
                    got: operands.len(),
                });
            }
            let target0 = operands.pop().map(|c| c.qubit).unwrap_or_default();
            let target1 = operands.pop().map(|c| c.qubit).unwrap_or_default();
            circuit.push_standard(StandardOperation::two_target(
                total,
                operands,
                target0,
                target1,
                OpKind::Swap,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alsvid_ir::{Operation, Polarity};

    #[test]
    fn test_toffoli_with_constant_line() {
        let source = "\
.v a,b,c
.i a,b
.o c
.c 1
BEGIN
t3 a,b,c
END
";
        let circuit = parse_tfc(source).unwrap();
        assert_eq!(circuit.nqubits, 2);
        assert_eq!(circuit.nancillae, 1);

        // Constant '1' initialises the ancilla line with an X.
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::X);
                assert_eq!(op.targets, vec![2]);
                assert!(op.controls.is_empty());
            }
            other => panic!("expected constant X, got {other:?}"),
        }
        match &circuit.ops[1] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::X);
                assert_eq!(op.controls.len(), 2);
                assert_eq!(op.targets, vec![2]);
            }
            other => panic!("expected Toffoli, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_marking() {
        let source = "\
.v a,b
.i a,b
.o b
BEGIN
t2 a,b
END
";
        let circuit = parse_tfc(source).unwrap();
        assert!(!circuit.output_permutation.contains_key(&0));
        assert!(circuit.output_permutation.contains_key(&1));
        assert!(circuit.garbage.contains(0));
        assert!(!circuit.garbage.contains(1));
    }

    #[test]
    fn test_negative_control() {
        let source = "\
.v a,b
.i a,b
.o a,b
BEGIN
t2 a',b
END
";
        let circuit = parse_tfc(source).unwrap();
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.controls[0].polarity, Polarity::Neg);
            }
            other => panic!("expected gate, got {other:?}"),
        }
    }

    #[test]
    fn test_fredkin() {
        let source = "\
.v a,b,c
.i a,b,c
.o a,b,c
BEGIN
f3 a,b,c
END
";
        let circuit = parse_tfc(source).unwrap();
        match &circuit.ops[0] {
            Operation::Standard(op) => {
                assert_eq!(op.kind, OpKind::Swap);
                assert_eq!(op.controls.len(), 1);
                assert_eq!(op.controls[0].qubit, 0);
                assert_eq!(op.targets, vec![2, 1]);
            }
            other => panic!("expected Fredkin, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_variable_in_outputs() {
        let source = ".v a\n.i a\n.o z\nBEGIN\nEND\n";
        assert!(matches!(
            parse_tfc(source),
            Err(FormatError::BadHeader { .. })
        ));
    }
}
