//! Register bookkeeping.
//!
//! A register names a contiguous block of qubit or classical indices. The
//! circuit keeps three maps of them: quantum, classical and ancillary.
//! Removing an interior qubit splits a register into a `name_l`/`name_h`
//! pair; [`consolidate`] fuses such pairs back together once their blocks
//! are contiguous again.

use crate::Qubit;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default register names used when a circuit has no declared registers.
pub const DEFAULT_QREG: &str = "q";
/// Default classical register name.
pub const DEFAULT_CREG: &str = "c";
/// Default ancillary register name.
pub const DEFAULT_ANCREG: &str = "anc";

/// A contiguous block of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// First index covered by the block.
    pub start: Qubit,
    /// Number of indices covered.
    pub size: u16,
}

impl Register {
    /// Create a new register block.
    pub fn new(start: Qubit, size: u16) -> Self {
        Self { start, size }
    }

    /// One past the last index covered by the block.
    pub fn end(&self) -> Qubit {
        self.start + self.size
    }

    /// Whether the block covers the given index.
    pub fn contains(&self, index: Qubit) -> bool {
        self.start <= index && index < self.end()
    }
}

/// Name-ordered register map.
pub type RegisterMap = BTreeMap<String, Register>;

/// Fuse `name_l`/`name_h` pairs whose blocks are contiguous back into `name`.
///
/// Runs until no further fusion is possible; the circuit invokes it at dump
/// time and when re-inserting qubits.
pub fn consolidate(regs: &mut RegisterMap) {
    loop {
        let mut fusion: Option<(String, String, String, Register)> = None;
        for (name, reg) in regs.iter() {
            let Some(base) = name.strip_suffix("_l") else {
                continue;
            };
            let high_name = format!("{base}_h");
            if let Some(high) = regs.get(&high_name) {
                if reg.end() == high.start {
                    fusion = Some((
                        name.clone(),
                        high_name,
                        base.to_string(),
                        Register::new(reg.start, reg.size + high.size),
                    ));
                    break;
                }
            }
        }
        match fusion {
            Some((low, high, target, merged)) => {
                regs.remove(&low);
                regs.remove(&high);
                regs.insert(target, merged);
            }
            None => break,
        }
    }
}

/// Registers of a map sorted by start index.
pub fn sorted_by_start(regs: &RegisterMap) -> Vec<(&str, Register)> {
    let mut sorted: Vec<_> = regs.iter().map(|(n, r)| (n.as_str(), *r)).collect();
    sorted.sort_by_key(|(_, r)| r.start);
    sorted
}

/// Resolve the register covering `index`, returning its name and the offset
/// of `index` within the block.
pub fn resolve(regs: &RegisterMap, index: Qubit) -> Option<(&str, u16)> {
    regs.iter()
        .find(|(_, reg)| reg.contains(index))
        .map(|(name, reg)| (name.as_str(), index - reg.start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, Qubit, u16)]) -> RegisterMap {
        entries
            .iter()
            .map(|&(n, s, c)| (n.to_string(), Register::new(s, c)))
            .collect()
    }

    #[test]
    fn test_consolidate_fuses_contiguous_halves() {
        let mut regs = map(&[("q_l", 0, 2), ("q_h", 2, 3)]);
        consolidate(&mut regs);
        assert_eq!(regs.len(), 1);
        assert_eq!(regs["q"], Register::new(0, 5));
    }

    #[test]
    fn test_consolidate_skips_gap() {
        let mut regs = map(&[("q_l", 0, 2), ("q_h", 3, 2)]);
        consolidate(&mut regs);
        assert_eq!(regs.len(), 2);
        assert!(regs.contains_key("q_l"));
    }

    #[test]
    fn test_consolidate_cascades() {
        // q_l_l + q_l_h fuse to q_l, which then fuses with q_h.
        let mut regs = map(&[("q_l_l", 0, 1), ("q_l_h", 1, 1), ("q_h", 2, 2)]);
        consolidate(&mut regs);
        assert_eq!(regs.len(), 1);
        assert_eq!(regs["q"], Register::new(0, 4));
    }

    #[test]
    fn test_resolve() {
        let regs = map(&[("a", 0, 2), ("b", 2, 3)]);
        assert_eq!(resolve(&regs, 0), Some(("a", 0)));
        assert_eq!(resolve(&regs, 3), Some(("b", 1)));
        assert_eq!(resolve(&regs, 5), None);
    }

    #[test]
    fn test_sorted_by_start() {
        let regs = map(&[("z", 0, 1), ("a", 1, 1)]);
        let sorted = sorted_by_start(&regs);
        assert_eq!(sorted[0].0, "z");
        assert_eq!(sorted[1].0, "a");
    }
}
