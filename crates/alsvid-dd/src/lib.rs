//! Decision-diagram boundary for the Alsvid circuit IR.
//!
//! The DD kernel itself lives outside this workspace; the core talks to it
//! through the [`DdPackage`] trait. This crate supplies everything on the
//! circuit side of that boundary:
//!
//! - the gate-matrix images of standard operations ([`ops::op_dd`]),
//! - the construction and simulation drivers ([`driver::build_functionality`],
//!   [`driver::simulate`]) and their dynamic-reordering variants,
//! - the SWAP-emitting permutation adapter
//!   ([`permutation::change_permutation`]),
//! - the ancilla and garbage reduction passes ([`reduce::reduce_ancillae`],
//!   [`reduce::reduce_garbage`]).

pub mod driver;
pub mod error;
pub mod matrix;
pub mod ops;
pub mod package;
pub mod permutation;
pub mod reduce;

pub use driver::{
    build_functionality, build_functionality_reordered, create_initial_matrix, simulate,
    simulate_reordered,
};
pub use error::{DdError, DdResult};
pub use package::{
    empty_line, standard_variable_map, DdPackage, GateMatrix, Line, Mode, ReorderingStrategy,
    LINE_CONTROL_NEG, LINE_CONTROL_POS, LINE_DEFAULT, LINE_TARGET,
};
pub use permutation::{change_permutation, change_permutation_reordered};
pub use reduce::{reduce_ancillae, reduce_ancillae_reordered, reduce_garbage};
