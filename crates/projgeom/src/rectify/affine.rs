//! Stage 1: recover the image of the line at infinity and send it home.

use nalgebra::{DMatrix, Matrix3, Vector3};

use super::{insufficient, LinePair};
use crate::error::{GeometryError, Result};
use crate::homography::Homography;
use crate::incidence::{join, meet};
use crate::linalg::NullSpace;
use crate::primitives::{Line, Point};
use crate::GeomCfg;

/// Output of stage 1.
#[derive(Clone, Debug)]
pub struct AffineRectification {
    pub vanishing_points: Vec<Point>,
    pub vanishing_line: Line,
    /// Maps `vanishing_line` to `(0, 0, 1)`; see `vanishing_line_correction`.
    pub correction: Homography,
}

/// Stage 1 from pairs of lines that are parallel in the world plane.
///
/// A pair of identical lines has no vanishing point (`DegenerateEntity`).
pub fn affine_rectification(pairs: &[LinePair], cfg: GeomCfg) -> Result<AffineRectification> {
    if pairs.len() < 2 {
        return Err(insufficient(2, pairs.len()));
    }
    let points = pairs
        .iter()
        .map(|p| meet(&p.first, &p.second, cfg))
        .collect::<Result<Vec<_>>>()?;
    affine_from_vanishing_points(&points, cfg)
}

/// Stage 1 from vanishing points directly. Two points are joined; more are
/// fitted in the least-squares sense. Coincident points carry one constraint
/// only and fail with `InsufficientConstraints`.
pub fn affine_from_vanishing_points(points: &[Point], cfg: GeomCfg) -> Result<AffineRectification> {
    let vanishing_line = match points {
        [] | [_] => return Err(insufficient(2, points.len())),
        [a, b] => join(a, b, cfg).map_err(|_| insufficient(2, 1))?,
        _ => fit_line(points, cfg)?,
    };
    let correction = vanishing_line_correction(&vanishing_line, cfg)?;
    Ok(AffineRectification {
        vanishing_points: points.to_vec(),
        vanishing_line,
        correction,
    })
}

/// Line minimizing `Σ (l · v̂_k)²` over unit-normalized points.
fn fit_line(points: &[Point], cfg: GeomCfg) -> Result<Line> {
    let mut a = DMatrix::zeros(points.len(), 3);
    for (k, p) in points.iter().enumerate() {
        let v = p.normalized().coords();
        a[(k, 0)] = v.x;
        a[(k, 1)] = v.y;
        a[(k, 2)] = v.z;
    }
    let l = NullSpace::of(&a)
        .ok_or(GeometryError::DegenerateEntity("vanishing line fit failed"))?
        .into_solution(cfg)?;
    Line::new(l[0], l[1], l[2])
}

/// Correction sending `l` to the line at infinity: `[[1,0,0],[0,1,0],l]` with
/// `l` scaled to `l3 = 1`.
///
/// When `l` passes through the origin (`l3 ≈ 0`) that matrix is singular, so
/// the origin is first moved a unit distance off the line and the result is
/// `H_P(l') · T`. `T` is a translation, so the output is still affine-rectifying.
pub fn vanishing_line_correction(l: &Line, cfg: GeomCfg) -> Result<Homography> {
    let v = l.coords();
    if !cfg.is_negligible(v.z, v.norm()) {
        return pure_projective(&(v / v.z), cfg);
    }
    // A line with l3 ≈ 0 has a non-negligible normal.
    let v = v / v.xy().norm();
    let shift = Homography::from_matrix(
        Matrix3::new(1.0, 0.0, -v.x, 0.0, 1.0, -v.y, 0.0, 0.0, 1.0),
        cfg,
    )?;
    // T⁻ᵀ l = (l1, l2, l3 + 1) for unit-normal l
    let moved = shift.apply(l).coords();
    tracing::debug!(line = %l, "vanishing line through the origin, translating first");
    Ok(pure_projective(&(moved / moved.z), cfg)?.compose(&shift))
}

fn pure_projective(v: &Vector3<f64>, cfg: GeomCfg) -> Result<Homography> {
    Homography::from_matrix(
        Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, v.x, v.y, v.z),
        cfg,
    )
}
