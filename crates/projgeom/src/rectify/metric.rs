//! Stage 2: recover angles and length ratios in an affinely rectified frame.
//!
//! The image of the dual absolute conic there is `diag(S, 0)` with
//! `S = K Kᵀ` symmetric positive definite; the correction is `diag(K⁻¹, 1)`.

use nalgebra::{DMatrix, Matrix2, Matrix3};

use super::{insufficient, LinePair};
use crate::conic::{Conic, DualConic};
use crate::error::{GeometryError, Result};
use crate::homography::Homography;
use crate::linalg::NullSpace;
use crate::GeomCfg;

/// Stage 2 from pairs of lines orthogonal in the world plane, given in the
/// affinely rectified frame.
///
/// Each pair contributes `(l1 m1, l1 m2 + l2 m1, l2 m2) · (s11, s12, s22) = 0`.
pub fn metric_rectification(pairs: &[LinePair], cfg: GeomCfg) -> Result<Homography> {
    if pairs.len() < 2 {
        return Err(insufficient(2, pairs.len()));
    }
    let mut a = DMatrix::zeros(pairs.len(), 3);
    for (k, pair) in pairs.iter().enumerate() {
        let (l, m) = (pair.first.normal(), pair.second.normal());
        let (nl, nm) = (l.norm(), m.norm());
        if cfg.is_negligible(nl, pair.first.coords().norm())
            || cfg.is_negligible(nm, pair.second.coords().norm())
        {
            return Err(GeometryError::DegenerateEntity(
                "line at infinity in an orthogonal pair",
            ));
        }
        let (l, m) = (l / nl, m / nm);
        a[(k, 0)] = l.x * m.x;
        a[(k, 1)] = l.x * m.y + l.y * m.x;
        a[(k, 2)] = l.y * m.y;
    }
    let ns = NullSpace::of(&a).ok_or(GeometryError::DegenerateEntity(
        "orthogonality system failed",
    ))?;
    tracing::debug!(
        pairs = pairs.len(),
        condition = ns.condition(),
        "metric constraint system"
    );
    let s = ns.into_solution(cfg)?;
    correction_from_block(Matrix2::new(s[0], s[1], s[1], s[2]), cfg)
}

/// Stage 2 from the image of a world circle in the affinely rectified frame.
///
/// The top-left block `B` of the conic is `(A Aᵀ)⁻¹` up to scale, so `S ∝ B⁻¹`.
pub fn metric_from_circle(circle: &Conic, cfg: GeomCfg) -> Result<Homography> {
    let b: Matrix2<f64> = circle.matrix().fixed_view::<2, 2>(0, 0).into_owned();
    let s = b
        .try_inverse()
        .ok_or(GeometryError::DegenerateConic("circle image has a singular quadratic part"))?;
    correction_from_block(s, cfg)
}

/// Stage 2 from the imaged dual absolute conic `C*∞'` in the affinely
/// rectified frame (its top-left block is `S`).
pub fn metric_from_dual_conic(dual: &DualConic, cfg: GeomCfg) -> Result<Homography> {
    correction_from_block(dual.matrix().fixed_view::<2, 2>(0, 0).into_owned(), cfg)
}

fn correction_from_block(s: Matrix2<f64>, cfg: GeomCfg) -> Result<Homography> {
    // S is only known up to sign.
    let s = if s.trace() < 0.0 { -s } else { s };
    let chol = s.cholesky().ok_or(GeometryError::DegenerateConic(
        "recovered absolute conic is not positive definite",
    ))?;
    let k = chol.l();
    let k_inv = k
        .try_inverse()
        .ok_or(GeometryError::DegenerateConic("singular absolute conic image"))?;
    Homography::from_matrix(
        Matrix3::new(
            k_inv[(0, 0)],
            k_inv[(0, 1)],
            0.0,
            k_inv[(1, 0)],
            k_inv[(1, 1)],
            0.0,
            0.0,
            0.0,
            1.0,
        ),
        cfg,
    )
}
