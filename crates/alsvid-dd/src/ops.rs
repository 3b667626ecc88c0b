//! Decision-diagram images of circuit operations.
//!
//! The single-target kinds hand their 2×2 matrix to the kernel's gate
//! constructor under the line-buffer protocol; the two-target kinds are built
//! as compositions of such gates. Wire positions run through the tracked
//! permutation (physical index → current variable), and through the variable
//! map as well when dynamic reordering is active.

use alsvid_ir::{OpKind, Operation, Permutation, Polarity, Qubit, StandardOperation};

use crate::error::{DdError, DdResult};
use crate::matrix::{gate_matrix, s_matrix, x_matrix, z_matrix};
use crate::package::{
    DdPackage, Line, LINE_CONTROL_NEG, LINE_CONTROL_POS, LINE_DEFAULT, LINE_TARGET,
};

/// The diagram of one operation under the tracked permutation.
pub fn op_dd<P: DdPackage>(
    op: &Operation,
    dd: &mut P,
    line: &mut Line,
    map: &Permutation,
) -> DdResult<P::Edge> {
    op_image(op, dd, line, map, None)
}

/// The diagram of one operation with an active variable map.
pub fn op_dd_reordered<P: DdPackage>(
    op: &Operation,
    dd: &mut P,
    line: &mut Line,
    map: &Permutation,
    var_map: &Permutation,
) -> DdResult<P::Edge> {
    op_image(op, dd, line, map, Some(var_map))
}

fn op_image<P: DdPackage>(
    op: &Operation,
    dd: &mut P,
    line: &mut Line,
    map: &Permutation,
    var_map: Option<&Permutation>,
) -> DdResult<P::Edge> {
    match op {
        Operation::Standard(standard) => standard_dd(standard, dd, line, map, var_map),
        Operation::Compound(compound) => {
            let mut iter = compound.ops.iter();
            let Some(first) = iter.next() else {
                return Ok(dd.one());
            };
            let mut e = standard_dd(first, dd, line, map, var_map)?;
            for child in iter {
                let g = standard_dd(child, dd, line, map, var_map)?;
                e = dd.multiply(&g, &e);
            }
            Ok(e)
        }
        Operation::NonUnitary(nu) => Err(DdError::NonUnitary(format!("{:?}", nu.kind))),
        Operation::ClassicControlled(_) => {
            Err(DdError::NonUnitary("classic-controlled".to_string()))
        }
    }
}

fn position(
    map: &Permutation,
    var_map: Option<&Permutation>,
    qubit: Qubit,
) -> DdResult<Qubit> {
    let logical = *map.get(&qubit).ok_or(DdError::PermutationKey(qubit))?;
    match var_map {
        Some(vm) => vm
            .get(&logical)
            .copied()
            .ok_or(DdError::PermutationKey(logical)),
        None => Ok(logical),
    }
}

fn standard_dd<P: DdPackage>(
    op: &StandardOperation,
    dd: &mut P,
    line: &mut Line,
    map: &Permutation,
    var_map: Option<&Permutation>,
) -> DdResult<P::Edge> {
    let targets: Vec<Qubit> = op
        .targets
        .iter()
        .map(|&t| position(map, var_map, t))
        .collect::<DdResult<_>>()?;
    let controls: Vec<(Qubit, Polarity)> = op
        .controls
        .iter()
        .map(|c| position(map, var_map, c.qubit).map(|p| (p, c.polarity)))
        .collect::<DdResult<_>>()?;

    for &(pos, polarity) in &controls {
        line[pos as usize] = match polarity {
            Polarity::Pos => LINE_CONTROL_POS,
            Polarity::Neg => LINE_CONTROL_NEG,
        };
    }

    let n = op.nqubits;
    let e = match op.kind {
        OpKind::Swap => swap_dd(dd, n, line, targets[0], targets[1]),
        OpKind::ISwap => iswap_dd(dd, n, line, targets[0], targets[1]),
        OpKind::Peres | OpKind::Peresdg => {
            peres_dd(dd, n, line, targets[0], targets[1], op.kind == OpKind::Peres)
        }
        kind => {
            let matrix = gate_matrix(kind, op.parameters)
                .ok_or_else(|| DdError::NonUnitary(kind.name().to_string()))?;
            line[targets[0] as usize] = LINE_TARGET;
            dd.make_gate_dd(&matrix, n, line)
        }
    };

    for &target in &targets {
        line[target as usize] = LINE_DEFAULT;
    }
    for &(pos, _) in &controls {
        line[pos as usize] = LINE_DEFAULT;
    }
    Ok(e)
}

/// SWAP as three CX diagrams. Any further control markers already present in
/// `line` apply to all three.
pub(crate) fn swap_dd<P: DdPackage>(
    dd: &mut P,
    n: Qubit,
    line: &mut Line,
    a: Qubit,
    b: Qubit,
) -> P::Edge {
    let x = x_matrix();

    line[a as usize] = LINE_CONTROL_POS;
    line[b as usize] = LINE_TARGET;
    let forward = dd.make_gate_dd(&x, n, line);

    line[a as usize] = LINE_TARGET;
    line[b as usize] = LINE_CONTROL_POS;
    let backward = dd.make_gate_dd(&x, n, line);

    let inner = dd.multiply(&backward, &forward);
    dd.multiply(&forward, &inner)
}

/// iSWAP as SWAP · (S ⊗ S) · CZ.
fn iswap_dd<P: DdPackage>(
    dd: &mut P,
    n: Qubit,
    line: &mut Line,
    a: Qubit,
    b: Qubit,
) -> P::Edge {
    let z = z_matrix();
    let s = s_matrix();

    line[a as usize] = LINE_CONTROL_POS;
    line[b as usize] = LINE_TARGET;
    let cz = dd.make_gate_dd(&z, n, line);

    line[a as usize] = LINE_TARGET;
    line[b as usize] = LINE_DEFAULT;
    let s_a = dd.make_gate_dd(&s, n, line);

    line[a as usize] = LINE_DEFAULT;
    line[b as usize] = LINE_TARGET;
    let s_b = dd.make_gate_dd(&s, n, line);

    let mut e = dd.multiply(&s_a, &cz);
    e = dd.multiply(&s_b, &e);
    let swap = swap_dd(dd, n, line, a, b);
    dd.multiply(&swap, &e)
}

/// Peres as a Toffoli into the first target followed by a CX into the
/// second; the inverse applies them in the opposite order.
fn peres_dd<P: DdPackage>(
    dd: &mut P,
    n: Qubit,
    line: &mut Line,
    t0: Qubit,
    t1: Qubit,
    regular: bool,
) -> P::Edge {
    let x = x_matrix();

    line[t1 as usize] = LINE_CONTROL_POS;
    line[t0 as usize] = LINE_TARGET;
    let toffoli = dd.make_gate_dd(&x, n, line);

    line[t1 as usize] = LINE_TARGET;
    line[t0 as usize] = LINE_DEFAULT;
    let cx = dd.make_gate_dd(&x, n, line);

    if regular {
        dd.multiply(&cx, &toffoli)
    } else {
        dd.multiply(&toffoli, &cx)
    }
}
