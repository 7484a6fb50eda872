//! Planar homographies and their action on points, lines and conics.
//!
//! A `Homography` is a non-singular 3×3 matrix up to scale. Singular matrices
//! are rejected at construction, so every value is invertible and `apply` is
//! infallible. The inverse is computed once and kept alongside the matrix.
//!
//! Action (duality-preserving):
//! - point `x ↦ H x`
//! - line `l ↦ H⁻ᵀ l`
//! - conic `C ↦ H⁻ᵀ C H⁻¹`
//! - dual conic `C* ↦ H C* Hᵀ`

use nalgebra::Matrix3;

use crate::conic::{Conic, DualConic};
use crate::error::{GeometryError, Result};
use crate::linalg::{is_singular3, proportional3};
use crate::primitives::{Line, Point};
use crate::subgroup::{classify_nonsingular, Subgroup};
use crate::GeomCfg;

/// Invertible planar projective transformation.
#[derive(Clone, Copy, Debug)]
pub struct Homography {
    m: Matrix3<f64>,
    inv: Matrix3<f64>,
}

/// Entities a homography acts on.
pub trait Transformable: Sized {
    fn transformed(&self, h: &Homography) -> Self;
}

impl Homography {
    /// Fails with `SingularTransform` for a singular or non-finite matrix; the
    /// rank test is insensitive to row and column scale.
    pub fn from_matrix(m: Matrix3<f64>, cfg: GeomCfg) -> Result<Self> {
        let det = m.determinant();
        if m.iter().any(|v| !v.is_finite()) || is_singular3(&m, cfg) {
            return Err(GeometryError::SingularTransform { det });
        }
        let inv = m
            .try_inverse()
            .ok_or(GeometryError::SingularTransform { det })?;
        Ok(Self { m, inv })
    }

    #[inline]
    pub fn identity() -> Self {
        Self {
            m: Matrix3::identity(),
            inv: Matrix3::identity(),
        }
    }

    #[inline]
    pub fn matrix(&self) -> Matrix3<f64> {
        self.m
    }

    #[inline]
    pub fn inverse_matrix(&self) -> Matrix3<f64> {
        self.inv
    }

    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            m: self.inv,
            inv: self.m,
        }
    }

    /// `self ∘ other`: apply `other` first, then `self`.
    #[inline]
    pub fn compose(&self, other: &Homography) -> Self {
        Self {
            m: self.m * other.m,
            inv: other.inv * self.inv,
        }
    }

    #[inline]
    pub fn apply<T: Transformable>(&self, x: &T) -> T {
        x.transformed(self)
    }

    pub fn apply_all<T: Transformable>(&self, xs: &[T]) -> Vec<T> {
        xs.iter().map(|x| x.transformed(self)).collect()
    }

    /// Tightest subgroup containing this transform.
    pub fn classify(&self, cfg: GeomCfg) -> Subgroup {
        classify_nonsingular(&self.m, cfg)
    }

    /// Same projective map (proportional matrices).
    pub fn equiv(&self, other: &Homography, cfg: GeomCfg) -> bool {
        proportional3(&self.m, &other.m, cfg)
    }

    /// Representative with `h33 = 1` when `h33` is non-negligible, unit
    /// Frobenius norm otherwise.
    pub fn normalized(&self, cfg: GeomCfg) -> Self {
        let h33 = self.m[(2, 2)];
        let s = if cfg.is_negligible(h33, self.m.norm()) {
            self.m.norm()
        } else {
            h33
        };
        Self {
            m: self.m / s,
            inv: self.inv * s,
        }
    }
}

impl Default for Homography {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformable for Point {
    fn transformed(&self, h: &Homography) -> Self {
        Point::unchecked(h.m * self.coords())
    }
}

impl Transformable for Line {
    fn transformed(&self, h: &Homography) -> Self {
        Line::unchecked(h.inv.transpose() * self.coords())
    }
}

impl Transformable for Conic {
    fn transformed(&self, h: &Homography) -> Self {
        Conic::from_symmetric_unchecked(h.inv.transpose() * self.matrix() * h.inv)
    }
}

impl Transformable for DualConic {
    fn transformed(&self, h: &Homography) -> Self {
        DualConic::from_symmetric_unchecked(h.m * self.matrix() * h.m.transpose())
    }
}
