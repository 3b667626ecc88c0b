//! `OpenQASM` 2 frontend for the Alsvid circuit IR.
//!
//! The frontend tokenizes an input source (following `include` directives
//! through a LIFO source stack), expands gate applications against a table of
//! compound-gate definitions, and populates an [`alsvid_ir::Circuit`]. The
//! builtin `qelib1.inc` header ships embedded in the crate.
//!
//! Controlled variants need no declaration of their own: a call `ccg a,b,c`
//! resolves against a single-gate definition of `g`, synthesising the two
//! controls at the call site.
//!
//! # Example
//!
//! ```rust
//! use alsvid_qasm::parse;
//!
//! let source = r#"
//!     OPENQASM 2.0;
//!     include "qelib1.inc";
//!     qreg q[2];
//!     creg c[2];
//!     h q[0];
//!     cx q[0], q[1];
//!     measure q -> c;
//! "#;
//!
//! let circuit = parse(source).unwrap();
//! assert_eq!(circuit.nqubits, 2);
//! assert_eq!(circuit.ops.len(), 3);
//! ```

pub mod emitter;
pub mod error;
pub mod expr;
pub mod gates;
pub mod parser;
pub mod scanner;
pub mod token;

pub use emitter::dump;
pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_named};
