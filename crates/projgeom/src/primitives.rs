//! Homogeneous points and lines of the projective plane.
//!
//! - `Point`: `(x1, x2, x3)` up to nonzero scale; `x3 = 0` is an ideal point.
//! - `Line`: `(l1, l2, l3)` up to nonzero scale, the line `l1·x + l2·y + l3 = 0`.
//! - `Location`: tagged finite/ideal view of a point, so callers never divide
//!   by a vanishing finiteness coordinate.
//!
//! Equality is proportionality (`equiv`), never a comparison of raw triples.

use std::fmt;

use nalgebra::{Vector2, Vector3};

use crate::error::{GeometryError, Result};
use crate::GeomCfg;

/// Point of the projective plane in homogeneous coordinates.
///
/// Invariant: the coordinate triple is finite and not the zero vector.
#[derive(Clone, Copy, Debug)]
pub struct Point {
    x: Vector3<f64>,
}

/// Line of the projective plane in homogeneous coordinates.
///
/// Invariant: the coefficient triple is finite and not the zero vector.
#[derive(Clone, Copy, Debug)]
pub struct Line {
    l: Vector3<f64>,
}

/// Where a point lives: at a Euclidean position, or at infinity along a direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Location {
    Finite(Vector2<f64>),
    Ideal(Vector2<f64>),
}

pub(crate) fn validate(v: Vector3<f64>, what: &'static str) -> Result<Vector3<f64>> {
    if v.iter().any(|c| !c.is_finite()) || v.iter().all(|&c| c == 0.0) {
        return Err(GeometryError::DegenerateEntity(what));
    }
    Ok(v)
}

/// Proportionality of two nonzero triples: `|a × b| <= eps·|a|·|b|`.
#[inline]
pub(crate) fn proportional(a: &Vector3<f64>, b: &Vector3<f64>, cfg: GeomCfg) -> bool {
    cfg.is_negligible(a.cross(b).norm(), a.norm() * b.norm())
}

impl Point {
    pub fn new(x1: f64, x2: f64, x3: f64) -> Result<Self> {
        Self::from_vector(Vector3::new(x1, x2, x3))
    }

    pub fn from_vector(x: Vector3<f64>) -> Result<Self> {
        Ok(Self {
            x: validate(x, "zero or non-finite point")?,
        })
    }

    /// Caller guarantees a nonzero triple (e.g. the image under an invertible map).
    #[inline]
    pub(crate) fn unchecked(x: Vector3<f64>) -> Self {
        Self { x }
    }

    /// Finite point `(x, y, 1)`; NaN or infinite coordinates are rejected.
    #[inline]
    pub fn from_euclidean(x: f64, y: f64) -> Result<Self> {
        Self::new(x, y, 1.0)
    }

    /// Ideal point `(dx, dy, 0)` in direction `(dx, dy)`.
    pub fn ideal(dx: f64, dy: f64) -> Result<Self> {
        Self::new(dx, dy, 0.0)
    }

    #[inline]
    pub fn coords(&self) -> Vector3<f64> {
        self.x
    }

    /// `x3` is zero relative to the point's magnitude.
    #[inline]
    pub fn is_ideal(&self, cfg: GeomCfg) -> bool {
        cfg.is_negligible(self.x.z, self.x.norm())
    }

    pub fn locate(&self, cfg: GeomCfg) -> Location {
        if self.is_ideal(cfg) {
            Location::Ideal(Vector2::new(self.x.x, self.x.y))
        } else {
            Location::Finite(Vector2::new(self.x.x / self.x.z, self.x.y / self.x.z))
        }
    }

    /// Euclidean coordinates `(x1/x3, x2/x3)`; ideal points have none.
    pub fn to_euclidean(&self, cfg: GeomCfg) -> Result<Vector2<f64>> {
        match self.locate(cfg) {
            Location::Finite(p) => Ok(p),
            Location::Ideal(_) => Err(GeometryError::DegenerateEntity(
                "ideal point has no Euclidean coordinates",
            )),
        }
    }

    pub fn equiv(&self, other: &Point, cfg: GeomCfg) -> bool {
        proportional(&self.x, &other.x, cfg)
    }

    /// Unit-norm representative (sign kept).
    #[inline]
    pub fn normalized(&self) -> Self {
        Self {
            x: self.x / self.x.norm(),
        }
    }

    /// Unsigned Euclidean distance to `line`. The point must be finite and the
    /// line must not be the line at infinity.
    pub fn distance_to(&self, line: &Line, cfg: GeomCfg) -> Result<f64> {
        let p = self.to_euclidean(cfg)?;
        let n = line.normal();
        let nn = n.norm();
        if cfg.is_negligible(nn, line.l.norm()) {
            return Err(GeometryError::DegenerateEntity(
                "distance to the line at infinity",
            ));
        }
        Ok((n.dot(&p) + line.l.z).abs() / nn)
    }
}

impl Line {
    pub fn new(l1: f64, l2: f64, l3: f64) -> Result<Self> {
        Self::from_vector(Vector3::new(l1, l2, l3))
    }

    pub fn from_vector(l: Vector3<f64>) -> Result<Self> {
        Ok(Self {
            l: validate(l, "zero or non-finite line")?,
        })
    }

    #[inline]
    pub(crate) fn unchecked(l: Vector3<f64>) -> Self {
        Self { l }
    }

    /// Line `a·x + b·y + c = 0`.
    pub fn from_coeffs(a: f64, b: f64, c: f64) -> Result<Self> {
        Self::new(a, b, c)
    }

    /// The line at infinity `(0, 0, 1)`.
    #[inline]
    pub fn at_infinity() -> Self {
        Self {
            l: Vector3::new(0.0, 0.0, 1.0),
        }
    }

    #[inline]
    pub fn coords(&self) -> Vector3<f64> {
        self.l
    }

    /// Normal `(l1, l2)` of the Euclidean line.
    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(self.l.x, self.l.y)
    }

    /// Ideal point of the line: `(l2, -l1, 0)`. Fails for the line at infinity,
    /// which contains every ideal point.
    pub fn direction(&self) -> Result<Point> {
        Point::new(self.l.y, -self.l.x, 0.0)
    }

    pub fn is_at_infinity(&self, cfg: GeomCfg) -> bool {
        proportional(&self.l, &Vector3::z(), cfg)
    }

    pub fn equiv(&self, other: &Line, cfg: GeomCfg) -> bool {
        proportional(&self.l, &other.l, cfg)
    }

    #[inline]
    pub fn normalized(&self) -> Self {
        Self {
            l: self.l / self.l.norm(),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x.x, self.x.y, self.x.z)
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.l.x, self.l.y, self.l.z)
    }
}
