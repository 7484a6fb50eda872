//! Homography estimation from point or line correspondences (normalized DLT).
//!
//! - Points: Hartley conditioning (centroid to the origin, mean distance √2)
//!   on both sides, DLT null vector, then de-normalization.
//! - Lines: lines map by `H⁻ᵀ`, so the DLT estimates `G = H⁻ᵀ` on unit-norm
//!   line coordinates and `H = G⁻ᵀ`.
//!
//! Four correspondences in general position determine `H`; more are solved in
//! the least-squares sense.

use nalgebra::{DMatrix, Matrix3, Vector2, Vector3};

use crate::error::{GeometryError, Result};
use crate::homography::Homography;
use crate::linalg::NullSpace;
use crate::primitives::{Line, Point};
use crate::GeomCfg;

/// Estimate `H` with `dst_k ≃ H src_k`. Points must be finite.
pub fn from_point_correspondences(src: &[Point], dst: &[Point], cfg: GeomCfg) -> Result<Homography> {
    check_counts(src.len(), dst.len())?;
    let src = src
        .iter()
        .map(|p| p.to_euclidean(cfg))
        .collect::<Result<Vec<_>>>()?;
    let dst = dst
        .iter()
        .map(|p| p.to_euclidean(cfg))
        .collect::<Result<Vec<_>>>()?;
    let (src_n, ts) = hartley(&src, cfg)?;
    let (dst_n, td) = hartley(&dst, cfg)?;
    let hn = dlt(&src_n, &dst_n, cfg)?;
    // H = Td⁻¹ Hn Ts
    let td_inv = td
        .try_inverse()
        .ok_or(GeometryError::SingularTransform { det: td.determinant() })?;
    Homography::from_matrix(td_inv * hn * ts, cfg)
}

/// Estimate `H` with `dst_k ≃ H⁻ᵀ src_k` (the line action of `H`).
pub fn from_line_correspondences(src: &[Line], dst: &[Line], cfg: GeomCfg) -> Result<Homography> {
    check_counts(src.len(), dst.len())?;
    let s: Vec<Vector3<f64>> = src.iter().map(|l| l.normalized().coords()).collect();
    let d: Vec<Vector3<f64>> = dst.iter().map(|l| l.normalized().coords()).collect();
    let g = Homography::from_matrix(dlt(&s, &d, cfg)?, cfg)?;
    Homography::from_matrix(g.inverse_matrix().transpose(), cfg)
}

/// RMS Euclidean distance between `H src_k` and `dst_k`.
pub fn transfer_error(h: &Homography, src: &[Point], dst: &[Point], cfg: GeomCfg) -> Result<f64> {
    if src.len() != dst.len() {
        return Err(GeometryError::Mismatch {
            left: src.len(),
            right: dst.len(),
        });
    }
    if src.is_empty() {
        return Ok(0.0);
    }
    let mut sum = 0.0;
    for (p, q) in src.iter().zip(dst) {
        let mapped = h.apply(p).to_euclidean(cfg)?;
        sum += (mapped - q.to_euclidean(cfg)?).norm_squared();
    }
    Ok((sum / src.len() as f64).sqrt())
}

fn check_counts(left: usize, right: usize) -> Result<()> {
    if left != right {
        return Err(GeometryError::Mismatch { left, right });
    }
    if left < 4 {
        return Err(GeometryError::InsufficientConstraints {
            needed: 4,
            got: left,
        });
    }
    Ok(())
}

/// Similarity `T` moving the centroid to the origin with mean distance √2.
fn hartley(pts: &[Vector2<f64>], cfg: GeomCfg) -> Result<(Vec<Vector3<f64>>, Matrix3<f64>)> {
    let n = pts.len() as f64;
    let c = pts.iter().fold(Vector2::zeros(), |acc, p| acc + p) / n;
    let mean = pts.iter().map(|p| (p - c).norm()).sum::<f64>() / n;
    let spread = c.norm().max(mean);
    if cfg.is_negligible(mean, spread) {
        return Err(GeometryError::DegenerateEntity(
            "correspondence points coincide",
        ));
    }
    let s = std::f64::consts::SQRT_2 / mean;
    let t = Matrix3::new(s, 0.0, -s * c.x, 0.0, s, -s * c.y, 0.0, 0.0, 1.0);
    let out = pts
        .iter()
        .map(|p| Vector3::new(s * (p.x - c.x), s * (p.y - c.y), 1.0))
        .collect();
    Ok((out, t))
}

/// Null vector of the stacked `x' × (H x) = 0` rows, as a row-major matrix.
fn dlt(src: &[Vector3<f64>], dst: &[Vector3<f64>], cfg: GeomCfg) -> Result<Matrix3<f64>> {
    let mut a = DMatrix::zeros(2 * src.len(), 9);
    for (k, (x, y)) in src.iter().zip(dst).enumerate() {
        let (r0, r1) = (2 * k, 2 * k + 1);
        for j in 0..3 {
            // [ 0ᵀ, -w' xᵀ, y' xᵀ ]
            a[(r0, 3 + j)] = -y.z * x[j];
            a[(r0, 6 + j)] = y.y * x[j];
            // [ w' xᵀ, 0ᵀ, -x' xᵀ ]
            a[(r1, j)] = y.z * x[j];
            a[(r1, 6 + j)] = -y.x * x[j];
        }
    }
    let ns = NullSpace::of(&a).ok_or(GeometryError::DegenerateEntity("DLT solve failed"))?;
    tracing::debug!(
        correspondences = src.len(),
        condition = ns.condition(),
        "dlt"
    );
    let h = ns.into_solution(cfg)?;
    Ok(Matrix3::from_row_slice(h.as_slice()))
}
