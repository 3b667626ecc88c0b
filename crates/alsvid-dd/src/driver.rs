//! Functionality construction and simulation drivers.
//!
//! Both drivers left-fold the operation images into the running edge,
//! swapping references strictly (`inc_ref` the new edge, `dec_ref` the old)
//! and collecting garbage between operations. Construction starts from the
//! ancilla-reduced identity; both finish by adapting the tracked permutation
//! to the output permutation.

use alsvid_ir::{Circuit, Permutation};

use crate::error::{DdError, DdResult};
use crate::ops::{op_dd, op_dd_reordered};
use crate::package::{empty_line, standard_variable_map, DdPackage, Mode, ReorderingStrategy};
use crate::permutation::{change_permutation, change_permutation_reordered};
use crate::reduce::{reduce_ancillae, reduce_ancillae_reordered, reduce_garbage};

/// The ancilla-reduced identity over all circuit variables.
pub fn create_initial_matrix<P: DdPackage>(circuit: &Circuit, dd: &mut P) -> P::Edge {
    if circuit.total_qubits() == 0 {
        return dd.one();
    }
    let e = dd.make_ident(0, circuit.total_qubits() - 1);
    dd.inc_ref(&e);
    reduce_ancillae(circuit, e, dd, true)
}

/// Build the circuit's transformation matrix.
pub fn build_functionality<P: DdPackage>(circuit: &Circuit, dd: &mut P) -> DdResult<P::Edge> {
    if circuit.total_qubits() == 0 {
        return Ok(dd.one());
    }

    let mut line = empty_line();
    let mut map = circuit.initial_layout.clone();
    dd.set_mode(Mode::Matrix);
    let mut e = create_initial_matrix(circuit, dd);

    for op in &circuit.ops {
        let image = op_dd(op, dd, &mut line, &map)?;
        let tmp = dd.multiply(&image, &e);
        dd.inc_ref(&tmp);
        dd.dec_ref(&e);
        e = tmp;
        dd.garbage_collect();
    }

    change_permutation(&mut e, &mut map, &circuit.output_permutation, &mut line, dd, true)?;
    let e = reduce_ancillae(circuit, e, dd, true);
    let e = reduce_garbage(circuit, e, dd, true);
    Ok(e)
}

/// Apply the circuit to an input state.
pub fn simulate<P: DdPackage>(
    circuit: &Circuit,
    input: &P::Edge,
    dd: &mut P,
) -> DdResult<P::Edge> {
    let mut line = empty_line();
    let mut map = circuit.initial_layout.clone();
    dd.set_mode(Mode::Vector);
    let mut e = input.clone();
    dd.inc_ref(&e);

    for op in &circuit.ops {
        let image = op_dd(op, dd, &mut line, &map)?;
        let tmp = dd.multiply(&image, &e);
        dd.inc_ref(&tmp);
        dd.dec_ref(&e);
        e = tmp;
        dd.garbage_collect();
    }

    change_permutation(&mut e, &mut map, &circuit.output_permutation, &mut line, dd, true)?;
    let e = reduce_ancillae(circuit, e, dd, true);
    Ok(e)
}

/// Build the transformation matrix with dynamic reordering after every
/// operation. Returns the final edge together with the variable map.
pub fn build_functionality_reordered<P: DdPackage>(
    circuit: &Circuit,
    dd: &mut P,
    strategy: ReorderingStrategy,
) -> DdResult<(P::Edge, Permutation)> {
    if circuit.total_qubits() == 0 {
        return Ok((dd.one(), Permutation::new()));
    }

    let mut line = empty_line();
    let mut map = circuit.initial_layout.clone();
    let mut var_map = standard_variable_map(circuit.total_qubits());

    dd.set_mode(Mode::Matrix);
    let mut e = create_initial_matrix(circuit, dd);

    for op in &circuit.ops {
        if !op.is_unitary() {
            return Err(DdError::NonUnitary("functionality not unitary".into()));
        }
        let image = op_dd_reordered(op, dd, &mut line, &map, &var_map)?;
        let tmp = dd.multiply(&image, &e);
        dd.inc_ref(&tmp);
        dd.dec_ref(&e);
        e = dd.dynamic_reorder(&tmp, &mut var_map, strategy);
    }

    change_permutation_reordered(
        &mut e,
        &mut map,
        &circuit.output_permutation,
        &var_map,
        &mut line,
        dd,
        true,
    )?;
    e = dd.dynamic_reorder(&e, &mut var_map, strategy);
    let e = reduce_ancillae_reordered(circuit, e, dd, &var_map);
    Ok((e, var_map))
}

/// Simulate with dynamic reordering after every operation.
pub fn simulate_reordered<P: DdPackage>(
    circuit: &Circuit,
    input: &P::Edge,
    dd: &mut P,
    strategy: ReorderingStrategy,
) -> DdResult<(P::Edge, Permutation)> {
    let mut line = empty_line();
    let mut map = circuit.initial_layout.clone();
    let mut var_map = standard_variable_map(circuit.total_qubits());

    dd.set_mode(Mode::Vector);
    let mut e = input.clone();
    dd.inc_ref(&e);

    for op in &circuit.ops {
        if !op.is_unitary() {
            return Err(DdError::NonUnitary("functionality not unitary".into()));
        }
        let image = op_dd_reordered(op, dd, &mut line, &map, &var_map)?;
        let tmp = dd.multiply(&image, &e);
        dd.inc_ref(&tmp);
        dd.dec_ref(&e);
        e = dd.dynamic_reorder(&tmp, &mut var_map, strategy);
    }

    change_permutation_reordered(
        &mut e,
        &mut map,
        &circuit.output_permutation,
        &var_map,
        &mut line,
        dd,
        true,
    )?;
    e = dd.dynamic_reorder(&e, &mut var_map, strategy);
    Ok((e, var_map))
}
