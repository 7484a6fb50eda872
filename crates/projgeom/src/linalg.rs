//! Internal linear-algebra helpers (not part of the public surface).
//!
//! - `NullSpace`: right null vector of a small homogeneous system `A x = 0`
//!   together with the sorted spectrum used for rank and conditioning checks.
//! - `adjugate3`: classical adjoint of a 3×3 matrix (defined for singular input).

use std::cmp::Ordering;

use nalgebra::{DMatrix, DVector, Matrix3, SVD};

use crate::error::{GeometryError, Result};
use crate::GeomCfg;

/// Least-squares null direction of `A` and the singular values of `A`, sorted
/// in decreasing order.
#[derive(Clone, Debug)]
pub(crate) struct NullSpace {
    pub vector: DVector<f64>,
    pub spectrum: Vec<f64>,
}

impl NullSpace {
    /// Decompose `a`. Systems with fewer rows than columns are padded with
    /// zero rows so the full right singular basis is available.
    pub fn of(a: &DMatrix<f64>) -> Option<Self> {
        let n = a.ncols();
        if n < 2 {
            return None;
        }
        let padded = if a.nrows() < n {
            let mut p = DMatrix::zeros(n, n);
            p.rows_mut(0, a.nrows()).copy_from(a);
            p
        } else {
            a.clone()
        };
        let svd = SVD::new(padded, false, true);
        let vt = svd.v_t?;
        let s = &svd.singular_values;
        if s.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut order: Vec<usize> = (0..s.len()).collect();
        order.sort_by(|&i, &j| s[j].partial_cmp(&s[i]).unwrap_or(Ordering::Equal));
        let k = *order.last()?;
        Some(Self {
            vector: vt.row(k).transpose(),
            spectrum: order.iter().map(|&i| s[i]).collect(),
        })
    }

    /// Number of singular values that are non-negligible relative to the largest.
    pub fn rank(&self, cfg: GeomCfg) -> usize {
        let top = self.spectrum.first().copied().unwrap_or(0.0);
        if top <= 0.0 {
            return 0;
        }
        self.spectrum
            .iter()
            .filter(|&&v| !cfg.is_negligible(v, top))
            .count()
    }

    /// `σ_max / σ_{n-1}`: conditioning of the solve once the null direction is removed.
    pub fn condition(&self) -> f64 {
        let n = self.spectrum.len();
        let next = self.spectrum[n - 2];
        if next <= 0.0 {
            f64::INFINITY
        } else {
            self.spectrum[0] / next
        }
    }

    /// Accept the null vector only if it is unique and well conditioned.
    pub fn into_solution(self, cfg: GeomCfg) -> Result<DVector<f64>> {
        let needed = self.spectrum.len() - 1;
        let got = self.rank(cfg).min(needed);
        if got < needed {
            return Err(GeometryError::InsufficientConstraints { needed, got });
        }
        let condition = self.condition();
        tracing::debug!(condition, limit = cfg.cond_max, "null-space solve");
        if condition > cfg.cond_max {
            return Err(GeometryError::IllConditioned {
                condition,
                limit: cfg.cond_max,
            });
        }
        Ok(self.vector)
    }
}

/// Classical adjoint: `adj(M) M = M adj(M) = det(M) I`.
pub(crate) fn adjugate3(m: &Matrix3<f64>) -> Matrix3<f64> {
    let c = |r0: usize, r1: usize, c0: usize, c1: usize| {
        m[(r0, c0)] * m[(r1, c1)] - m[(r0, c1)] * m[(r1, c0)]
    };
    // adj[i][j] = cofactor[j][i]
    Matrix3::new(
        c(1, 2, 1, 2),
        -c(0, 2, 1, 2),
        c(0, 1, 1, 2),
        -c(1, 2, 0, 2),
        c(0, 2, 0, 2),
        -c(0, 1, 0, 2),
        c(1, 2, 0, 1),
        -c(0, 2, 0, 1),
        c(0, 1, 0, 1),
    )
}

/// Exact symmetric part `(M + Mᵀ)/2`.
#[inline]
pub(crate) fn symmetrize(m: &Matrix3<f64>) -> Matrix3<f64> {
    (m + m.transpose()) * 0.5
}

/// A 3×3 matrix is singular when its determinant is negligible once columns
/// and then rows are scaled to unit norm.
///
/// After that scaling `|det| <= 1` (Hadamard), and the verdict does not depend
/// on coordinate units (pixel-scale conics and translations).
pub(crate) fn is_singular3(m: &Matrix3<f64>, cfg: GeomCfg) -> bool {
    if m.iter().any(|v| !v.is_finite()) {
        return true;
    }
    let mut a = *m;
    for j in 0..3 {
        let n = a.column(j).norm();
        if n == 0.0 {
            return true;
        }
        a.column_mut(j).unscale_mut(n);
    }
    for i in 0..3 {
        let n = a.row(i).norm();
        if n == 0.0 {
            return true;
        }
        a.row_mut(i).unscale_mut(n);
    }
    let det = a.determinant();
    !det.is_finite() || cfg.is_negligible(det, 1.0)
}

/// Two nonzero matrices are equal up to a nonzero scale factor.
pub(crate) fn proportional3(a: &Matrix3<f64>, b: &Matrix3<f64>, cfg: GeomCfg) -> bool {
    let (na, nb) = (a.norm(), b.norm());
    if na == 0.0 || nb == 0.0 {
        return false;
    }
    let (a, b) = (a / na, b / nb);
    let d = (a - b).norm().min((a + b).norm());
    cfg.is_negligible(d, 1.0)
}
