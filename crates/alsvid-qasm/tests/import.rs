//! End-to-end import tests for the OpenQASM 2 frontend.

use alsvid_ir::{NonUnitaryKind, OpKind, Operation};
use alsvid_qasm::{parse, ParseError};

#[test]
fn test_bell_state_import() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        creg c[2];
        h q[0];
        cx q[0],q[1];
        measure q -> c;
    "#;

    let circuit = parse(source).unwrap();
    assert_eq!(circuit.nqubits, 2);
    assert_eq!(circuit.nclassics, 2);
    assert_eq!(circuit.ops.len(), 3);

    match &circuit.ops[0] {
        Operation::Standard(op) => {
            assert_eq!(op.kind, OpKind::H);
            assert_eq!(op.targets, vec![0]);
            assert!(op.controls.is_empty());
        }
        other => panic!("expected H, got {other:?}"),
    }
    match &circuit.ops[1] {
        Operation::Standard(op) => {
            assert_eq!(op.kind, OpKind::X);
            assert_eq!(op.targets, vec![1]);
            assert_eq!(op.controls.len(), 1);
            assert_eq!(op.controls[0].qubit, 0);
        }
        other => panic!("expected CX, got {other:?}"),
    }
    match &circuit.ops[2] {
        Operation::NonUnitary(op) => match &op.kind {
            NonUnitaryKind::Measure { qubits, classics } => {
                assert_eq!(qubits, &vec![0, 1]);
                assert_eq!(classics, &vec![0, 1]);
            }
            other => panic!("expected measurement, got {other:?}"),
        },
        other => panic!("expected measurement, got {other:?}"),
    }

    assert_eq!(circuit.initial_layout.get(&0), Some(&0));
    assert_eq!(circuit.initial_layout.get(&1), Some(&1));
    assert_eq!(circuit.output_permutation.get(&0), Some(&0));
    assert_eq!(circuit.output_permutation.get(&1), Some(&1));
}

#[test]
fn test_controlled_gate_inference() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        gate mygate a { u3(pi,0,pi) a; }
        qreg q[3];
        cmygate q[0],q[1];
        ccmygate q[0],q[1],q[2];
    "#;

    let circuit = parse(source).unwrap();
    assert_eq!(circuit.ops.len(), 2);

    match &circuit.ops[0] {
        Operation::Standard(op) => {
            assert_eq!(op.kind, OpKind::U3);
            assert_eq!(op.controls.len(), 1);
            assert_eq!(op.controls[0].qubit, 0);
            assert_eq!(op.targets, vec![1]);
        }
        other => panic!("expected inferred single-controlled op, got {other:?}"),
    }
    match &circuit.ops[1] {
        Operation::Standard(op) => {
            assert_eq!(op.kind, OpKind::U3);
            assert_eq!(op.controls.len(), 2);
            assert_eq!(op.targets, vec![2]);
        }
        other => panic!("expected inferred double-controlled op, got {other:?}"),
    }
}

#[test]
fn test_direct_definition_beats_inference() {
    // cmix is declared before mix exists, so its declaration is kept; by the
    // time it is called, mix also offers a single-gate base for inference.
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        gate cmix(lambda) a,b { u1(lambda/2) b; cx a,b; u1(-lambda/2) b; cx a,b; }
        gate mix(lambda) a { u1(lambda) a; }
        qreg q[2];
        cmix(pi) q[0],q[1];
    "#;

    // The direct definition wins: its four-gate body is expanded instead of
    // synthesising a control around mix.
    let circuit = parse(source).unwrap();
    match &circuit.ops[0] {
        Operation::Compound(compound) => {
            assert_eq!(compound.ops.len(), 4);
            // u1(pi/2) collapses to S, u1(-pi/2) to Sdg.
            assert_eq!(compound.ops[0].kind, OpKind::S);
            assert_eq!(compound.ops[0].targets, vec![1]);
            assert_eq!(compound.ops[1].kind, OpKind::X);
            assert_eq!(compound.ops[1].controls[0].qubit, 0);
            assert_eq!(compound.ops[2].kind, OpKind::Sdg);
            assert_eq!(compound.ops[3].kind, OpKind::X);
        }
        other => panic!("expected expanded direct body, got {other:?}"),
    }
}

#[test]
fn test_register_broadcast_control_overlap() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[3];
        cx q[0], q;
    "#;

    match parse(source) {
        Err(ParseError::DuplicateQubit(0)) => {}
        other => panic!("expected DuplicateQubit(0), got {other:?}"),
    }
}

#[test]
fn test_register_broadcast_shapes() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[3];
        qreg r[3];
        h q;
        cx q, r;
    "#;

    let circuit = parse(source).unwrap();
    match &circuit.ops[0] {
        Operation::Compound(compound) => {
            assert_eq!(compound.ops.len(), 3);
            assert!(compound.ops.iter().all(|op| op.kind == OpKind::H));
        }
        other => panic!("expected broadcast H, got {other:?}"),
    }
    match &circuit.ops[1] {
        Operation::Compound(compound) => {
            assert_eq!(compound.ops.len(), 3);
            for (i, op) in compound.ops.iter().enumerate() {
                assert_eq!(op.controls[0].qubit, i as u16);
                assert_eq!(op.targets, vec![3 + i as u16]);
            }
        }
        other => panic!("expected broadcast CX, got {other:?}"),
    }
}

#[test]
fn test_register_size_mismatch() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        qreg r[3];
        cx q, r;
    "#;

    match parse(source) {
        Err(ParseError::RegisterSizeMismatch) => {}
        other => panic!("expected RegisterSizeMismatch, got {other:?}"),
    }
}

#[test]
fn test_controlled_inference_rejects_register_broadcast() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[1];
        qreg r[2];
        cz q[0], r;
    "#;

    match parse(source) {
        Err(ParseError::CtrlRegisterUnsupported) => {}
        other => panic!("expected CtrlRegisterUnsupported, got {other:?}"),
    }
}

#[test]
fn test_undefined_gate() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[1];
        mystery q[0];
    "#;

    match parse(source) {
        Err(ParseError::UndefinedGate(name)) => assert_eq!(name, "mystery"),
        other => panic!("expected UndefinedGate, got {other:?}"),
    }
}

#[test]
fn test_argument_count_mismatch() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        h q[0], q[1];
    "#;

    match parse(source) {
        Err(ParseError::ArgumentCountMismatch {
            expected: 1,
            got: 2,
        }) => {}
        other => panic!("expected ArgumentCountMismatch, got {other:?}"),
    }
}

#[test]
fn test_classic_controlled() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[1];
        creg c[1];
        measure q -> c;
        if (c == 1) x q[0];
    "#;

    let circuit = parse(source).unwrap();
    match &circuit.ops[1] {
        Operation::ClassicControlled(cc) => {
            assert_eq!(cc.expected, 1);
            assert_eq!(cc.creg.start, 0);
            assert_eq!(cc.creg.size, 1);
            assert!(matches!(&*cc.op, Operation::Standard(op) if op.kind == OpKind::X));
        }
        other => panic!("expected classic-controlled op, got {other:?}"),
    }
}

#[test]
fn test_layout_comments() {
    let source = r#"
        // i 1 0
        // o 1 0
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        h q[0];
        h q[1];
    "#;

    let circuit = parse(source).unwrap();
    assert_eq!(circuit.initial_layout.get(&1), Some(&0));
    assert_eq!(circuit.initial_layout.get(&0), Some(&1));
    assert_eq!(circuit.output_permutation.get(&1), Some(&0));
    assert_eq!(circuit.output_permutation.get(&0), Some(&1));
}

#[test]
fn test_incomplete_output_marks_garbage() {
    let source = r#"
        // i 0 1
        // o 0
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        h q[0];
        h q[1];
    "#;

    let circuit = parse(source).unwrap();
    assert_eq!(circuit.output_permutation.len(), 1);
    assert!(circuit.garbage.contains(1));
    assert!(!circuit.garbage.contains(0));
}

#[test]
fn test_idle_qubits_excluded_from_output() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[3];
        h q[0];
        h q[2];
    "#;

    let circuit = parse(source).unwrap();
    assert_eq!(circuit.initial_layout.len(), 3);
    assert!(circuit.output_permutation.contains_key(&0));
    assert!(!circuit.output_permutation.contains_key(&1));
    assert!(circuit.output_permutation.contains_key(&2));
}

#[test]
fn test_controlled_swap() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[3];
        cswap q[0],q[1],q[2];
    "#;

    let circuit = parse(source).unwrap();
    match &circuit.ops[0] {
        Operation::Standard(op) => {
            assert_eq!(op.kind, OpKind::Swap);
            assert_eq!(op.controls.len(), 1);
            assert_eq!(op.targets, vec![1, 2]);
        }
        other => panic!("expected controlled swap, got {other:?}"),
    }
}

#[test]
fn test_barrier_snapshot_probabilities() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        barrier q;
        snapshot(3) q[0], q[1];
        show_probabilities;
    "#;

    let circuit = parse(source).unwrap();
    assert!(matches!(
        &circuit.ops[0],
        Operation::NonUnitary(op) if matches!(&op.kind, NonUnitaryKind::Barrier { qubits } if qubits == &vec![0, 1])
    ));
    assert!(matches!(
        &circuit.ops[1],
        Operation::NonUnitary(op) if matches!(&op.kind, NonUnitaryKind::Snapshot { id: 3, .. })
    ));
    assert!(matches!(
        &circuit.ops[2],
        Operation::NonUnitary(op) if matches!(op.kind, NonUnitaryKind::ShowProbabilities)
    ));
}

#[test]
fn test_parameterized_user_gate() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        gate rot(angle) a { u1(angle/2) a; }
        qreg q[1];
        rot(pi) q[0];
    "#;

    let circuit = parse(source).unwrap();
    match &circuit.ops[0] {
        Operation::Standard(op) => {
            // u1(pi/2) collapses to S.
            assert_eq!(op.kind, OpKind::S);
        }
        other => panic!("expected folded rotation, got {other:?}"),
    }
}

#[test]
fn test_unknown_register() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[1];
        h r[0];
    "#;

    match parse(source) {
        Err(ParseError::UnknownRegister(name)) => assert_eq!(name, "r"),
        other => panic!("expected UnknownRegister, got {other:?}"),
    }
}

#[test]
fn test_index_out_of_bounds() {
    let source = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[2];
        h q[5];
    "#;

    match parse(source) {
        Err(ParseError::IndexOutOfBounds { index: 5, .. }) => {}
        other => panic!("expected IndexOutOfBounds, got {other:?}"),
    }
}
