//! Factorizations along the subgroup chain.
//!
//! - `AffineDecomposition`: `A = R(θ) R(−φ) diag(λ1, λ2) R(φ)` from the SVD of
//!   the linear block. `λ2 < 0` marks an orientation-reversing map.
//! - `ChainDecomposition`: `H = H_S · H_A · H_P` (similarity, affine with an
//!   upper-triangular unit-determinant block, pure projective). Requires
//!   `h33 ≠ 0`.

use nalgebra::{Matrix2, Matrix3, SVD};

use crate::error::{GeometryError, Result};
use crate::homography::Homography;
use crate::GeomCfg;

/// Rotation–anisotropic-scaling factorization of a 2×2 linear map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineDecomposition {
    pub theta: f64,
    pub phi: f64,
    pub lambda1: f64,
    pub lambda2: f64,
}

#[inline]
fn rot(angle: f64) -> Matrix2<f64> {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, -s, s, c)
}

impl AffineDecomposition {
    pub fn of(a: &Matrix2<f64>) -> Option<Self> {
        let svd = SVD::new(*a, true, true);
        let mut u = svd.u?;
        let mut v = svd.v_t?.transpose();
        let mut d = svd.singular_values;
        if v.determinant() < 0.0 {
            v.column_mut(1).neg_mut();
            u.column_mut(1).neg_mut();
        }
        if u.determinant() < 0.0 {
            u.column_mut(1).neg_mut();
            d[1] = -d[1];
        }
        let r = u * v.transpose();
        Some(Self {
            theta: r[(1, 0)].atan2(r[(0, 0)]),
            // V = R(−φ)
            phi: v[(0, 1)].atan2(v[(0, 0)]),
            lambda1: d[0],
            lambda2: d[1],
        })
    }

    pub fn recompose(&self) -> Matrix2<f64> {
        rot(self.theta)
            * rot(-self.phi)
            * Matrix2::new(self.lambda1, 0.0, 0.0, self.lambda2)
            * rot(self.phi)
    }
}

/// `H = similarity ∘ affine ∘ projective`.
#[derive(Clone, Copy, Debug)]
pub struct ChainDecomposition {
    pub similarity: Homography,
    pub affine: Homography,
    pub projective: Homography,
}

impl ChainDecomposition {
    pub fn of(h: &Homography, cfg: GeomCfg) -> Result<Self> {
        let m = h.matrix();
        let v = m[(2, 2)];
        if cfg.is_negligible(v, m.norm()) {
            return Err(GeometryError::DegenerateEntity(
                "chain decomposition needs h33 != 0",
            ));
        }
        let m = m / v;
        let t = m.fixed_view::<2, 1>(0, 2).into_owned();
        let vt = m.fixed_view::<1, 2>(2, 0).into_owned();
        let b: Matrix2<f64> = m.fixed_view::<2, 2>(0, 0).into_owned() - t * vt;

        let qr = b.qr();
        let (mut q, mut r) = (qr.q(), qr.r());
        for k in 0..2 {
            if r[(k, k)] < 0.0 {
                q.column_mut(k).neg_mut();
                r.row_mut(k).neg_mut();
            }
        }
        let det = r.determinant();
        if !(det > 0.0) {
            return Err(GeometryError::SingularTransform { det });
        }
        let s = det.sqrt();
        let k = r / s;
        let sq = q * s;

        let similarity = Homography::from_matrix(
            Matrix3::new(sq[(0, 0)], sq[(0, 1)], t.x, sq[(1, 0)], sq[(1, 1)], t.y, 0.0, 0.0, 1.0),
            cfg,
        )?;
        let affine = Homography::from_matrix(
            Matrix3::new(k[(0, 0)], k[(0, 1)], 0.0, 0.0, k[(1, 1)], 0.0, 0.0, 0.0, 1.0),
            cfg,
        )?;
        let projective = Homography::from_matrix(
            Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, vt[(0, 0)], vt[(0, 1)], 1.0),
            cfg,
        )?;
        Ok(Self {
            similarity,
            affine,
            projective,
        })
    }

    pub fn recompose(&self) -> Homography {
        self.similarity
            .compose(&self.affine)
            .compose(&self.projective)
    }
}
