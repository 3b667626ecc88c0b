//! Auxiliary format importers for the Alsvid circuit IR.
//!
//! Three reversible/quantum benchmark formats share the circuit model with
//! the OpenQASM frontend but differ in header semantics and gate encodings:
//!
//! - **REAL** (RevLib): variable declarations, constant lines, and
//!   `⟨gate⟩⟨n⟩[:λ]` gate records;
//! - **TFC**: variables/inputs/outputs/constants headers with `t⟨n⟩`/`f⟨n⟩`
//!   gate lines;
//! - **GRCS**: cycle-tagged gate records from the random-circuit-sampling
//!   benchmarks.
//!
//! [`import`] dispatches on the file extension (`.qasm`, `.real`, `.tfc`,
//! `.txt`).

pub mod error;
pub mod grcs;
pub mod real;
pub mod tfc;

pub use error::{FormatError, FormatResult};
pub use grcs::parse_grcs;
pub use real::parse_real;
pub use tfc::parse_tfc;

use alsvid_ir::Circuit;
use std::path::Path;

/// Import a circuit file, choosing the format by extension.
pub fn import(path: impl AsRef<Path>) -> FormatResult<Circuit> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("circuit")
        .to_string();
    let source = std::fs::read_to_string(path)?;

    match extension.as_str() {
        "qasm" => Ok(alsvid_qasm::parse_named(&source, &name)?),
        "real" => real::parse_real_named(&source, &name),
        "tfc" => tfc::parse_tfc_named(&source, &name),
        "txt" => grcs::parse_grcs_named(&source, &name),
        other => Err(FormatError::UnsupportedExtension(other.to_string())),
    }
}
