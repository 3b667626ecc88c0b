//! Extension-based import dispatch.

use alsvid_formats::{import, FormatError};
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("alsvid-dispatch-{}-{name}", std::process::id()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_import_qasm_by_extension() {
    let path = write_temp("bell.qasm", "OPENQASM 2.0;\ninclude \"qelib1.inc\";\nqreg q[2];\nh q[0];\ncx q[0],q[1];\n");
    let circuit = import(&path).unwrap();
    assert_eq!(circuit.nqubits, 2);
    assert_eq!(circuit.name, format!("alsvid-dispatch-{}-bell", std::process::id()));
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_import_real_by_extension() {
    let path = write_temp("toffoli.real", ".numvars 3\n.variables a b c\n.begin\nt3 a b c\n.end\n");
    let circuit = import(&path).unwrap();
    assert_eq!(circuit.nqubits, 3);
    assert_eq!(circuit.ops.len(), 1);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_import_tfc_by_extension() {
    let path = write_temp("circ.tfc", ".v a,b\n.i a,b\n.o a,b\nBEGIN\nt2 a,b\nEND\n");
    let circuit = import(&path).unwrap();
    assert_eq!(circuit.nqubits, 2);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_import_grcs_by_extension() {
    let path = write_temp("grcs.txt", "2\n0 h 0\n1 cz 0 1\n");
    let circuit = import(&path).unwrap();
    assert_eq!(circuit.nqubits, 2);
    assert_eq!(circuit.ops.len(), 2);
    std::fs::remove_file(path).unwrap();
}

#[test]
fn test_unknown_extension_rejected() {
    let path = write_temp("circ.xyz", "");
    let result = import(&path);
    assert!(matches!(
        result,
        Err(FormatError::UnsupportedExtension(ext)) if ext == "xyz"
    ));
    std::fs::remove_file(path).unwrap();
}
