//! Incidence and duality algebra.
//!
//! Join (points → line) and meet (lines → point) are the same operator, the
//! cross product, applied to dual entity types. `Homogeneous` captures that
//! once; `join` and `meet` are thin typed entry points over `cross_join`.

use nalgebra::Vector3;

use crate::conic::{Conic, DualConic};
use crate::error::{GeometryError, Result};
use crate::linalg::{adjugate3, is_singular3};
use crate::primitives::{proportional, Line, Point};
use crate::GeomCfg;

/// Entity with a homogeneous 3-vector and a dual entity type.
pub trait Homogeneous: Sized + Copy {
    type Dual: Homogeneous<Dual = Self>;
    fn coords(&self) -> Vector3<f64>;
    fn from_raw(v: Vector3<f64>) -> Result<Self>;
}

impl Homogeneous for Point {
    type Dual = Line;
    #[inline]
    fn coords(&self) -> Vector3<f64> {
        Point::coords(self)
    }
    fn from_raw(v: Vector3<f64>) -> Result<Self> {
        Point::from_vector(v)
    }
}

impl Homogeneous for Line {
    type Dual = Point;
    #[inline]
    fn coords(&self) -> Vector3<f64> {
        Line::coords(self)
    }
    fn from_raw(v: Vector3<f64>) -> Result<Self> {
        Line::from_vector(v)
    }
}

/// Cross product of two entities, as their dual.
///
/// Fails with `DegenerateEntity` when `a` and `b` are proportional: the cross
/// product vanishes and denotes no entity.
pub fn cross_join<T: Homogeneous>(a: &T, b: &T, cfg: GeomCfg) -> Result<T::Dual> {
    let (va, vb) = (binary_rescale(a.coords()), binary_rescale(b.coords()));
    if proportional(&va, &vb, cfg) {
        return Err(GeometryError::DegenerateEntity(
            "coincident entities have no join/meet",
        ));
    }
    T::Dual::from_raw(va.cross(&vb))
}

/// Scale by a power of two so the largest entry lies in `[1, 2)`. The scaling
/// is exact, so zero components of a cross product stay exactly zero, and
/// coordinates near `f64::MAX` no longer overflow when multiplied.
fn binary_rescale(v: Vector3<f64>) -> Vector3<f64> {
    let k = v.amax().log2().floor().clamp(-1000.0, 1000.0);
    v * (-k).exp2()
}

/// `p` lies on `l`: `|p·l| <= eps·|p|·|l|`.
#[inline]
pub fn incident(p: &Point, l: &Line, cfg: GeomCfg) -> bool {
    let (x, v) = (p.coords(), l.coords());
    cfg.is_negligible(x.dot(&v), x.norm() * v.norm())
}

/// Line through two distinct points.
pub fn join(p: &Point, q: &Point, cfg: GeomCfg) -> Result<Line> {
    cross_join(p, q, cfg)
}

/// Intersection of two distinct lines. Parallel lines meet in an ideal point
/// (`x3 == 0`), which is a valid result, not an error.
pub fn meet(l: &Line, m: &Line, cfg: GeomCfg) -> Result<Point> {
    cross_join(l, m, cfg)
}

/// Tangent `C p` to `conic` at `p`.
///
/// The caller is responsible for `p` lying on the conic (`Conic::contains`);
/// off the conic this is the polar line of `p`. Fails only if `C p` vanishes,
/// i.e. `p` is a singular point of a degenerate conic.
pub fn tangent_at(conic: &Conic, p: &Point) -> Result<Line> {
    conic.polar(p)
}

/// Dual conic `C* = adj(C)`; undefined as a tangent envelope for singular `C`.
pub fn dual(conic: &Conic, cfg: GeomCfg) -> Result<DualConic> {
    let m = conic.matrix();
    if is_singular3(&m, cfg) {
        return Err(GeometryError::DegenerateConic("singular conic has no dual"));
    }
    Ok(DualConic::from_symmetric_unchecked(adjugate3(&m)))
}

/// Three points on a common line.
pub fn collinear(points: &[Point; 3], cfg: GeomCfg) -> bool {
    let [a, b, c] = points.map(|p| p.coords());
    cfg.is_negligible(a.dot(&b.cross(&c)), a.norm() * b.norm() * c.norm())
}

/// Three lines through a common point (dual of `collinear`).
pub fn concurrent(lines: &[Line; 3], cfg: GeomCfg) -> bool {
    let [a, b, c] = lines.map(|l| l.coords());
    cfg.is_negligible(a.dot(&b.cross(&c)), a.norm() * b.norm() * c.norm())
}

/// Euclidean angle between two lines in `[0, π/2]`. Meaningful only in a
/// metric frame; fails for the line at infinity.
pub fn angle_between(l: &Line, m: &Line, cfg: GeomCfg) -> Result<f64> {
    if l.is_at_infinity(cfg) || m.is_at_infinity(cfg) {
        return Err(GeometryError::DegenerateEntity(
            "line at infinity has no direction",
        ));
    }
    let (a, b) = (l.normal(), m.normal());
    let s = (a.x * b.y - a.y * b.x).abs();
    let c = a.dot(&b).abs();
    Ok(s.atan2(c))
}
