//! Gate matrices for the standard single-target kinds.

use crate::package::GateMatrix;
use alsvid_ir::OpKind;
use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// The Pauli-X matrix, used by the composition builders.
pub(crate) fn x_matrix() -> GateMatrix {
    [[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]]
}

/// The Pauli-Z matrix, used by the composition builders.
pub(crate) fn z_matrix() -> GateMatrix {
    [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]]
}

/// The S matrix, used by the composition builders.
pub(crate) fn s_matrix() -> GateMatrix {
    [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 1.0)]]
}

/// The 2×2 matrix of a single-target kind.
///
/// Two-target kinds (`Swap`, `ISwap`, `Peres`, `Peresdg`) have no single
/// matrix; their diagrams are built as compositions.
pub fn gate_matrix(kind: OpKind, p: [f64; 3]) -> Option<GateMatrix> {
    let matrix = match kind {
        OpKind::I => [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(1.0, 0.0)]],
        OpKind::H => [
            [c(FRAC_1_SQRT_2, 0.0), c(FRAC_1_SQRT_2, 0.0)],
            [c(FRAC_1_SQRT_2, 0.0), c(-FRAC_1_SQRT_2, 0.0)],
        ],
        OpKind::X => [[c(0.0, 0.0), c(1.0, 0.0)], [c(1.0, 0.0), c(0.0, 0.0)]],
        OpKind::Y => [[c(0.0, 0.0), c(0.0, -1.0)], [c(0.0, 1.0), c(0.0, 0.0)]],
        OpKind::Z => [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(-1.0, 0.0)]],
        OpKind::S => [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, 1.0)]],
        OpKind::Sdg => [[c(1.0, 0.0), c(0.0, 0.0)], [c(0.0, 0.0), c(0.0, -1.0)]],
        OpKind::T => [
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(FRAC_1_SQRT_2, FRAC_1_SQRT_2)],
        ],
        OpKind::Tdg => [
            [c(1.0, 0.0), c(0.0, 0.0)],
            [c(0.0, 0.0), c(FRAC_1_SQRT_2, -FRAC_1_SQRT_2)],
        ],
        // V is the principal square root of X.
        OpKind::V => [[c(0.5, 0.5), c(0.5, -0.5)], [c(0.5, -0.5), c(0.5, 0.5)]],
        OpKind::Vdg => [[c(0.5, -0.5), c(0.5, 0.5)], [c(0.5, 0.5), c(0.5, -0.5)]],
        OpKind::U1 => {
            let lambda = p[0];
            [
                [c(1.0, 0.0), c(0.0, 0.0)],
                [c(0.0, 0.0), Complex64::from_polar(1.0, lambda)],
            ]
        }
        OpKind::U2 => {
            let (lambda, phi) = (p[0], p[1]);
            [
                [
                    c(FRAC_1_SQRT_2, 0.0),
                    -Complex64::from_polar(FRAC_1_SQRT_2, lambda),
                ],
                [
                    Complex64::from_polar(FRAC_1_SQRT_2, phi),
                    Complex64::from_polar(FRAC_1_SQRT_2, lambda + phi),
                ],
            ]
        }
        OpKind::U3 => {
            let (lambda, phi, theta) = (p[0], p[1], p[2]);
            let (sin, cos) = (theta / 2.0).sin_cos();
            [
                [c(cos, 0.0), -Complex64::from_polar(sin, lambda)],
                [
                    Complex64::from_polar(sin, phi),
                    Complex64::from_polar(cos, lambda + phi),
                ],
            ]
        }
        OpKind::RX => {
            let (sin, cos) = (p[0] / 2.0).sin_cos();
            [[c(cos, 0.0), c(0.0, -sin)], [c(0.0, -sin), c(cos, 0.0)]]
        }
        OpKind::RY => {
            let (sin, cos) = (p[0] / 2.0).sin_cos();
            [[c(cos, 0.0), c(-sin, 0.0)], [c(sin, 0.0), c(cos, 0.0)]]
        }
        OpKind::RZ => {
            let half = p[0] / 2.0;
            [
                [Complex64::from_polar(1.0, -half), c(0.0, 0.0)],
                [c(0.0, 0.0), Complex64::from_polar(1.0, half)],
            ]
        }
        OpKind::Swap | OpKind::ISwap | OpKind::Peres | OpKind::Peresdg => return None,
    };
    Some(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_unitary(m: &GateMatrix) -> bool {
        // Rows of a unitary are orthonormal.
        let r0 = (m[0][0].norm_sqr() + m[0][1].norm_sqr() - 1.0).abs() < 1e-12;
        let r1 = (m[1][0].norm_sqr() + m[1][1].norm_sqr() - 1.0).abs() < 1e-12;
        let cross = m[0][0] * m[1][0].conj() + m[0][1] * m[1][1].conj();
        r0 && r1 && cross.norm() < 1e-12
    }

    #[test]
    fn test_all_single_target_matrices_unitary() {
        let kinds = [
            OpKind::I,
            OpKind::H,
            OpKind::X,
            OpKind::Y,
            OpKind::Z,
            OpKind::S,
            OpKind::Sdg,
            OpKind::T,
            OpKind::Tdg,
            OpKind::V,
            OpKind::Vdg,
            OpKind::U1,
            OpKind::U2,
            OpKind::U3,
            OpKind::RX,
            OpKind::RY,
            OpKind::RZ,
        ];
        for kind in kinds {
            let m = gate_matrix(kind, [0.7, 0.3, 1.1]).unwrap();
            assert!(is_unitary(&m), "matrix of {kind:?} is not unitary");
        }
    }

    #[test]
    fn test_two_target_kinds_have_no_matrix() {
        assert!(gate_matrix(OpKind::Swap, [0.0; 3]).is_none());
        assert!(gate_matrix(OpKind::Peres, [0.0; 3]).is_none());
    }

    #[test]
    fn test_v_squares_to_x() {
        let v = gate_matrix(OpKind::V, [0.0; 3]).unwrap();
        let mut square = [[Complex64::new(0.0, 0.0); 2]; 2];
        for (i, row) in square.iter_mut().enumerate() {
            for (j, entry) in row.iter_mut().enumerate() {
                *entry = v[i][0] * v[0][j] + v[i][1] * v[1][j];
            }
        }
        let x = gate_matrix(OpKind::X, [0.0; 3]).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert!((square[i][j] - x[i][j]).norm() < 1e-12);
            }
        }
    }
}
