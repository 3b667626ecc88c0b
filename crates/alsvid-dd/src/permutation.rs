//! Permutation adaptation.
//!
//! Reconciles a tracked physical-to-logical mapping against a target mapping
//! by multiplying SWAP diagrams into the edge. Every key of `to` must be
//! present in `from`; each emitted SWAP fixes at least one key, so at most
//! `|to|` SWAPs are produced.

use alsvid_ir::{Permutation, Qubit};

use crate::error::{DdError, DdResult};
use crate::ops::swap_dd;
use crate::package::{DdPackage, Line, LINE_DEFAULT};

/// Adapt `from` towards `to`, multiplying the SWAPs into `on`.
///
/// With `regular` set the SWAP diagrams are left-multiplied, otherwise
/// right-multiplied. `from` equals `to` on `to`'s domain afterwards.
pub fn change_permutation<P: DdPackage>(
    on: &mut P::Edge,
    from: &mut Permutation,
    to: &Permutation,
    line: &mut Line,
    dd: &mut P,
    regular: bool,
) -> DdResult<()> {
    adapt(on, from, to, None, line, dd, regular)
}

/// [`change_permutation`] with wire positions routed through a variable map.
pub fn change_permutation_reordered<P: DdPackage>(
    on: &mut P::Edge,
    from: &mut Permutation,
    to: &Permutation,
    var_map: &Permutation,
    line: &mut Line,
    dd: &mut P,
    regular: bool,
) -> DdResult<()> {
    adapt(on, from, to, Some(var_map), line, dd, regular)
}

fn adapt<P: DdPackage>(
    on: &mut P::Edge,
    from: &mut Permutation,
    to: &Permutation,
    var_map: Option<&Permutation>,
    line: &mut Line,
    dd: &mut P,
    regular: bool,
) -> DdResult<()> {
    debug_assert!(from.len() >= to.len());

    let entries: Vec<(Qubit, Qubit)> = to.iter().map(|(&k, &v)| (k, v)).collect();
    for (i, goal) in entries {
        let current = *from.get(&i).ok_or(DdError::PermutationKey(i))?;
        if current == goal {
            continue;
        }

        // Find the key currently holding the goal value.
        let j = from
            .iter()
            .find_map(|(&key, &value)| (value == goal).then_some(key))
            .ok_or(DdError::PermutationValue(goal))?;

        let (pos_a, pos_b) = match var_map {
            Some(vm) => (
                *vm.get(&current).ok_or(DdError::PermutationKey(current))?,
                *vm.get(&goal).ok_or(DdError::PermutationKey(goal))?,
            ),
            None => (current, goal),
        };

        let n = if dd.is_terminal(on) {
            pos_a.max(pos_b) + 1
        } else {
            dd.var(on) + 1
        };
        let swap = swap_dd(dd, n, line, pos_a, pos_b);
        line[pos_a as usize] = LINE_DEFAULT;
        line[pos_b as usize] = LINE_DEFAULT;

        let saved = on.clone();
        *on = if regular {
            dd.multiply(&swap, on)
        } else {
            dd.multiply(on, &swap)
        };
        dd.inc_ref(on);
        dd.dec_ref(&saved);
        dd.garbage_collect();

        from.insert(i, goal);
        from.insert(j, current);
    }
    Ok(())
}
