//! Ancilla and garbage reduction passes.
//!
//! `reduce_ancillae` projects ancillary qubits onto |0⟩: at an ancillary
//! node the edges selecting |1⟩ on that variable are zeroed (columns in
//! regular mode, rows otherwise). `reduce_garbage` sums garbage outputs out
//! by folding the suppressed half of a garbage node into the preserved one.

use alsvid_ir::{Circuit, Permutation, Qubit};

use crate::package::DdPackage;

/// Project the circuit's ancillary qubits onto |0⟩.
pub fn reduce_ancillae<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    regular: bool,
) -> P::Edge {
    let Some(first_ancillary) = circuit.ancillary.ones().next() else {
        return e;
    };
    reduce_ancillae_rec(circuit, e, dd, regular, first_ancillary as Qubit)
}

fn reduce_ancillae_rec<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    regular: bool,
    first: Qubit,
) -> P::Edge {
    if dd.is_terminal(&e) || dd.var(&e) < first {
        return e;
    }

    let v = dd.var(&e);
    let edges = [
        reduce_ancillae_rec(circuit, dd.child(&e, 0), dd, regular, first),
        reduce_ancillae_rec(circuit, dd.child(&e, 1), dd, regular, first),
        reduce_ancillae_rec(circuit, dd.child(&e, 2), dd, regular, first),
        reduce_ancillae_rec(circuit, dd.child(&e, 3), dd, regular, first),
    ];
    let mut f = dd.make_nonterminal(v, edges);

    if circuit.ancillary.contains(v as usize) {
        let one_weight = dd.weight(&dd.child(&f, if regular { 1 } else { 2 }));
        let both_weight = dd.weight(&dd.child(&f, 3));
        if !dd.weight_is_zero(one_weight) || !dd.weight_is_zero(both_weight) {
            f = if regular {
                let edges = [dd.child(&f, 0), dd.zero(), dd.child(&f, 2), dd.zero()];
                dd.make_nonterminal(v, edges)
            } else {
                let edges = [dd.child(&f, 0), dd.child(&f, 1), dd.zero(), dd.zero()];
                dd.make_nonterminal(v, edges)
            };
        }
    }

    let cached = dd.mul_cached(dd.weight(&f), dd.weight(&e));
    let interned = dd.lookup(cached);
    dd.release_cached(cached);
    let f = dd.with_weight(&f, interned);
    dd.inc_ref(&f);
    f
}

/// Sum the circuit's garbage outputs out of the diagram.
pub fn reduce_garbage<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    regular: bool,
) -> P::Edge {
    let Some(first_garbage) = circuit.garbage.ones().next() else {
        return e;
    };
    reduce_garbage_rec(circuit, e, dd, regular, first_garbage as Qubit)
}

fn reduce_garbage_rec<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    regular: bool,
    first: Qubit,
) -> P::Edge {
    if dd.is_terminal(&e) || dd.var(&e) < first {
        return e;
    }

    let v = dd.var(&e);
    let edges = [
        reduce_garbage_rec(circuit, dd.child(&e, 0), dd, regular, first),
        reduce_garbage_rec(circuit, dd.child(&e, 1), dd, regular, first),
        reduce_garbage_rec(circuit, dd.child(&e, 2), dd, regular, first),
        reduce_garbage_rec(circuit, dd.child(&e, 3), dd, regular, first),
    ];
    let mut f = dd.make_nonterminal(v, edges);

    if circuit.garbage.contains(v as usize) {
        let suppressed = dd.weight(&dd.child(&f, if regular { 2 } else { 1 }));
        let both = dd.weight(&dd.child(&f, 3));
        if !dd.weight_is_zero(suppressed) || !dd.weight_is_zero(both) {
            let (keep_a, fold_a, keep_b, fold_b) = if regular {
                (0, 2, 1, 3)
            } else {
                (0, 1, 2, 3)
            };
            let g = fold_children(dd, &f, keep_a, fold_a);
            let h = fold_children(dd, &f, keep_b, fold_b);
            f = if regular {
                dd.make_nonterminal(v, [g, h, dd.zero(), dd.zero()])
            } else {
                dd.make_nonterminal(v, [g, dd.zero(), h, dd.zero()])
            };
        }
    }

    let cached = dd.mul_cached(dd.weight(&f), dd.weight(&e));
    let interned = dd.lookup(cached);
    dd.release_cached(cached);
    let f = dd.with_weight(&f, interned);
    dd.inc_ref(&f);
    f
}

/// Fold the non-zero suppressed child into the kept one via `add`.
fn fold_children<P: DdPackage>(dd: &mut P, f: &P::Edge, keep: usize, fold: usize) -> P::Edge {
    let kept = dd.child(f, keep);
    let folded = dd.child(f, fold);
    let kept_zero = dd.weight_is_zero(dd.weight(&kept));
    let folded_zero = dd.weight_is_zero(dd.weight(&folded));
    if kept_zero && !folded_zero {
        folded
    } else if !folded_zero {
        dd.add(&kept, &folded)
    } else {
        kept
    }
}

/// Ancilla reduction under an active variable map: a node is ancillary when
/// the qubit its variable maps to lies in the ancilla range.
pub fn reduce_ancillae_reordered<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    var_map: &Permutation,
) -> P::Edge {
    if circuit.nancillae == 0 {
        return e;
    }
    let f = reduce_ancillae_reordered_rec(circuit, e, dd, var_map);
    dd.garbage_collect();
    f
}

fn reduce_ancillae_reordered_rec<P: DdPackage>(
    circuit: &Circuit,
    e: P::Edge,
    dd: &mut P,
    var_map: &Permutation,
) -> P::Edge {
    if dd.is_terminal(&e) {
        return e;
    }

    let v = dd.var(&e);
    let edges = [
        reduce_ancillae_reordered_rec(circuit, dd.child(&e, 0), dd, var_map),
        reduce_ancillae_reordered_rec(circuit, dd.child(&e, 1), dd, var_map),
        reduce_ancillae_reordered_rec(circuit, dd.child(&e, 2), dd, var_map),
        reduce_ancillae_reordered_rec(circuit, dd.child(&e, 3), dd, var_map),
    ];
    let mut f = dd.make_nonterminal(v, edges);

    let ancillary = var_map
        .get(&v)
        .is_some_and(|&mapped| mapped >= circuit.nqubits);
    if ancillary {
        let edges = [dd.child(&f, 0), dd.zero(), dd.child(&f, 2), dd.zero()];
        f = dd.make_nonterminal(v, edges);
    }

    let cached = dd.mul_cached(dd.weight(&f), dd.weight(&e));
    let interned = dd.lookup(cached);
    dd.release_cached(cached);
    let f = dd.with_weight(&f, interned);
    dd.inc_ref(&f);
    f
}
