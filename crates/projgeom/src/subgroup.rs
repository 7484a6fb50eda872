//! The nested transformation subgroups
//! Euclidean ⊂ Similarity ⊂ Affine ⊂ Projective.
//!
//! Membership is a structural property of the matrix checked at runtime, so
//! the hierarchy is a small ordered enum plus `classify`, not a type chain.
//! `build` goes the other way: minimal parameters → matrix in the subgroup.
//!
//! Parameter layouts for `build`:
//! - Euclidean  `[θ, tx, ty]`
//! - Similarity `[s, θ, tx, ty]`
//! - Affine     `[a11, a12, a21, a22, tx, ty]`
//! - Projective `[a11, a12, a21, a22, tx, ty, v1, v2]` with `h33 = 1`

use std::fmt;
use std::str::FromStr;

use nalgebra::{Matrix2, Matrix3, Vector2};

use crate::error::{GeometryError, Result};
use crate::homography::Homography;
use crate::linalg::is_singular3;
use crate::GeomCfg;

mod decompose;

pub use decompose::{AffineDecomposition, ChainDecomposition};

/// Transformation subgroup, ordered finest to coarsest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subgroup {
    Euclidean,
    Similarity,
    Affine,
    Projective,
}

impl Subgroup {
    pub const ALL: [Subgroup; 4] = [
        Subgroup::Euclidean,
        Subgroup::Similarity,
        Subgroup::Affine,
        Subgroup::Projective,
    ];

    /// Degrees of freedom = length of the `build` parameter vector.
    #[inline]
    pub fn dof(self) -> usize {
        match self {
            Subgroup::Euclidean => 3,
            Subgroup::Similarity => 4,
            Subgroup::Affine => 6,
            Subgroup::Projective => 8,
        }
    }

    /// The smallest subgroup containing both.
    #[inline]
    pub fn coarser(self, other: Subgroup) -> Subgroup {
        self.max(other)
    }

    /// `other` is a subgroup of `self`.
    #[inline]
    pub fn contains(self, other: Subgroup) -> bool {
        other <= self
    }

    pub fn name(self) -> &'static str {
        match self {
            Subgroup::Euclidean => "euclidean",
            Subgroup::Similarity => "similarity",
            Subgroup::Affine => "affine",
            Subgroup::Projective => "projective",
        }
    }
}

impl fmt::Display for Subgroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Subgroup {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Subgroup::ALL
            .into_iter()
            .find(|g| g.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown subgroup `{s}`"))
    }
}

/// Tightest subgroup of a 3×3 matrix. Fails with `SingularTransform` for a
/// singular matrix, which is no transform at all.
pub fn classify(m: &Matrix3<f64>, cfg: GeomCfg) -> Result<Subgroup> {
    if m.iter().any(|v| !v.is_finite()) || is_singular3(m, cfg) {
        return Err(GeometryError::SingularTransform {
            det: m.determinant(),
        });
    }
    Ok(classify_nonsingular(m, cfg))
}

pub(crate) fn classify_nonsingular(m: &Matrix3<f64>, cfg: GeomCfg) -> Subgroup {
    let scale = m.norm();
    let h33 = m[(2, 2)];
    let v = Vector2::new(m[(2, 0)], m[(2, 1)]);
    if cfg.is_negligible(h33, scale) || !cfg.is_negligible(v.norm(), scale) {
        return Subgroup::Projective;
    }
    let a: Matrix2<f64> = m.fixed_view::<2, 2>(0, 0).into_owned() / h33;
    let ata = a.transpose() * a;
    let s2 = 0.5 * ata.trace();
    let iso = (ata - Matrix2::identity() * s2).amax();
    if !cfg.is_negligible(iso, s2) {
        return Subgroup::Affine;
    }
    if cfg.is_negligible(s2 - 1.0, 1.0) {
        Subgroup::Euclidean
    } else {
        Subgroup::Similarity
    }
}

/// Matrix in `subgroup` from its minimal parameters (layouts in the module docs).
pub fn build(subgroup: Subgroup, params: &[f64], cfg: GeomCfg) -> Result<Homography> {
    if params.len() != subgroup.dof() {
        return Err(GeometryError::ParameterCount {
            subgroup,
            expected: subgroup.dof(),
            got: params.len(),
        });
    }
    let p = params;
    let m = match subgroup {
        Subgroup::Euclidean => similarity_matrix(1.0, p[0], p[1], p[2]),
        Subgroup::Similarity => similarity_matrix(p[0], p[1], p[2], p[3]),
        Subgroup::Affine => Matrix3::new(p[0], p[1], p[4], p[2], p[3], p[5], 0.0, 0.0, 1.0),
        Subgroup::Projective => Matrix3::new(p[0], p[1], p[4], p[2], p[3], p[5], p[6], p[7], 1.0),
    };
    Homography::from_matrix(m, cfg)
}

fn similarity_matrix(s: f64, theta: f64, tx: f64, ty: f64) -> Matrix3<f64> {
    let (sn, cs) = theta.sin_cos();
    Matrix3::new(s * cs, -s * sn, tx, s * sn, s * cs, ty, 0.0, 0.0, 1.0)
}
