//! Point conics `xᵀ C x = 0` and dual (line) conics `lᵀ C* l = 0`.
//!
//! Both are symmetric 3×3 matrices up to nonzero scale; every constructor and
//! transform keeps the stored matrix exactly symmetric.

use nalgebra::{DMatrix, Matrix3, Vector2};

use crate::error::{GeometryError, Result};
use crate::linalg::{is_singular3, proportional3, symmetrize, NullSpace};
use crate::primitives::{Line, Point};
use crate::GeomCfg;

/// Point conic.
#[derive(Clone, Copy, Debug)]
pub struct Conic {
    m: Matrix3<f64>,
}

/// Dual conic: the envelope of lines tangent to a conic.
#[derive(Clone, Copy, Debug)]
pub struct DualConic {
    m: Matrix3<f64>,
}

fn validate_sym(m: &Matrix3<f64>, what: &'static str) -> Result<Matrix3<f64>> {
    let s = symmetrize(m);
    if s.iter().any(|v| !v.is_finite()) || s.iter().all(|&v| v == 0.0) {
        return Err(GeometryError::DegenerateConic(what));
    }
    Ok(s)
}

impl Conic {
    /// Conic from any nonzero matrix; only its symmetric part is kept.
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self> {
        Ok(Self {
            m: validate_sym(&m, "zero or non-finite conic")?,
        })
    }

    /// `a x² + b xy + c y² + d x + e y + f = 0`.
    pub fn from_coeffs(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Result<Self> {
        Self::from_matrix(Matrix3::new(
            a,
            b * 0.5,
            d * 0.5,
            b * 0.5,
            c,
            e * 0.5,
            d * 0.5,
            e * 0.5,
            f,
        ))
    }

    pub fn circle(center: Vector2<f64>, radius: f64) -> Result<Self> {
        if !(radius > 0.0) {
            return Err(GeometryError::DegenerateConic("circle radius must be positive"));
        }
        let (cx, cy) = (center.x, center.y);
        Self::from_coeffs(
            1.0,
            0.0,
            1.0,
            -2.0 * cx,
            -2.0 * cy,
            cx * cx + cy * cy - radius * radius,
        )
    }

    /// The unique conic through five points in general position.
    ///
    /// Fails with `InsufficientConstraints` when the points leave a pencil of
    /// conics (e.g. four of them collinear).
    pub fn through_points(points: &[Point; 5], cfg: GeomCfg) -> Result<Self> {
        let mut a = DMatrix::zeros(5, 6);
        for (k, p) in points.iter().enumerate() {
            let v = p.normalized().coords();
            let (x, y, w) = (v.x, v.y, v.z);
            let row = [x * x, x * y, y * y, x * w, y * w, w * w];
            for (j, r) in row.iter().enumerate() {
                a[(k, j)] = *r;
            }
        }
        let c = NullSpace::of(&a)
            .ok_or(GeometryError::DegenerateConic("conic fit failed"))?
            .into_solution(cfg)?;
        Self::from_coeffs(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    #[inline]
    pub fn matrix(&self) -> Matrix3<f64> {
        self.m
    }

    /// `xᵀ C x`.
    #[inline]
    pub fn eval(&self, p: &Point) -> f64 {
        let x = p.coords();
        x.dot(&(self.m * x))
    }

    /// `p` lies on the conic within tolerance.
    pub fn contains(&self, p: &Point, cfg: GeomCfg) -> bool {
        let x = p.coords();
        cfg.is_negligible(self.eval(p), self.m.norm() * x.norm_squared())
    }

    /// Rank < 3: a line pair, a repeated line, or a single point.
    pub fn is_degenerate(&self, cfg: GeomCfg) -> bool {
        is_singular3(&self.m, cfg)
    }

    pub fn equiv(&self, other: &Conic, cfg: GeomCfg) -> bool {
        proportional3(&self.m, &other.m, cfg)
    }

    /// Polar line of `p`: `C p`. For `p` on the conic this is the tangent.
    pub fn polar(&self, p: &Point) -> Result<Line> {
        Line::from_vector(self.m * p.coords())
    }

    pub(crate) fn from_symmetric_unchecked(m: Matrix3<f64>) -> Self {
        Self { m: symmetrize(&m) }
    }
}

impl DualConic {
    pub fn from_matrix(m: Matrix3<f64>) -> Result<Self> {
        Ok(Self {
            m: validate_sym(&m, "zero or non-finite dual conic")?,
        })
    }

    /// Dual conic of the circular points, `C*∞ = I Jᵀ + J Iᵀ ∝ diag(1, 1, 0)`.
    /// Fixed exactly by similarity transforms.
    #[inline]
    pub fn absolute() -> Self {
        Self {
            m: Matrix3::from_diagonal(&nalgebra::Vector3::new(1.0, 1.0, 0.0)),
        }
    }

    #[inline]
    pub fn matrix(&self) -> Matrix3<f64> {
        self.m
    }

    /// `lᵀ C* l`.
    #[inline]
    pub fn eval(&self, l: &Line) -> f64 {
        let v = l.coords();
        v.dot(&(self.m * v))
    }

    /// `l` is tangent to the underlying conic within tolerance.
    pub fn contains_line(&self, l: &Line, cfg: GeomCfg) -> bool {
        cfg.is_negligible(self.eval(l), self.m.norm() * l.coords().norm_squared())
    }

    pub fn is_degenerate(&self, cfg: GeomCfg) -> bool {
        is_singular3(&self.m, cfg)
    }

    pub fn equiv(&self, other: &DualConic, cfg: GeomCfg) -> bool {
        proportional3(&self.m, &other.m, cfg)
    }

    pub(crate) fn from_symmetric_unchecked(m: Matrix3<f64>) -> Self {
        Self { m: symmetrize(&m) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    #[test]
    fn circle_contains_its_points() {
        let cfg = GeomCfg::default();
        let c = Conic::circle(vector![1.0, -2.0], 3.0).unwrap();
        for k in 0..8 {
            let th = k as f64 * 0.7;
            let p = Point::from_euclidean(1.0 + 3.0 * th.cos(), -2.0 + 3.0 * th.sin()).unwrap();
            assert!(c.contains(&p, cfg), "point {k} off circle");
        }
        assert!(!c.contains(&Point::from_euclidean(1.0, -2.0).unwrap(), cfg));
        assert!(!c.is_degenerate(cfg));
        assert_eq!(c.matrix(), c.matrix().transpose());
    }

    #[test]
    fn asymmetric_input_is_symmetrized() {
        let m = Matrix3::new(1.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, -1.0);
        let c = Conic::from_matrix(m).unwrap();
        assert_eq!(c.matrix(), c.matrix().transpose());
        assert!((c.matrix()[(0, 1)] - 1.0).abs() < 1e-15);
        assert!(Conic::from_matrix(Matrix3::zeros()).is_err());
    }

    #[test]
    fn pixel_scale_circle_is_proper() {
        let cfg = GeomCfg::default();
        let cases = [
            (vector![640.0, 480.0], 50.0),
            (vector![1000.0, 1000.0], 100.0),
            (vector![0.0, 0.0], 2000.0),
        ];
        for (c, r) in cases {
            let circle = Conic::circle(c, r).unwrap();
            assert!(!circle.is_degenerate(cfg));
            let star = crate::incidence::dual(&circle, cfg).unwrap();
            assert!(!star.is_degenerate(cfg));
            // the tangent at the rightmost point is the vertical line x = cx + r
            let p = Point::from_euclidean(c.x + r, c.y).unwrap();
            let t = circle.polar(&p).unwrap();
            assert!(star.contains_line(&t, cfg));
        }
    }

    #[test]
    fn line_pair_is_degenerate() {
        // xy = 0
        let c = Conic::from_coeffs(0.0, 1.0, 0.0, 0.0, 0.0, 0.0).unwrap();
        assert!(c.is_degenerate(GeomCfg::default()));
    }

    #[test]
    fn five_points_recover_ellipse() {
        let cfg = GeomCfg::default().with_eps(1e-9);
        // x²/4 + y² = 1
        let truth = Conic::from_coeffs(0.25, 0.0, 1.0, 0.0, 0.0, -1.0).unwrap();
        let angles = [0.1, 1.0, 2.2, 3.5, 5.0];
        let pts = angles.map(|t: f64| Point::from_euclidean(2.0 * t.cos(), t.sin()).unwrap());
        let fitted = Conic::through_points(&pts, cfg).unwrap();
        assert!(fitted.equiv(&truth, cfg));
    }

    #[test]
    fn collinear_points_leave_a_pencil() {
        let pts = [
            Point::from_euclidean(0.0, 0.0).unwrap(),
            Point::from_euclidean(1.0, 0.0).unwrap(),
            Point::from_euclidean(2.0, 0.0).unwrap(),
            Point::from_euclidean(3.0, 0.0).unwrap(),
            Point::from_euclidean(0.0, 1.0).unwrap(),
        ];
        assert!(matches!(
            Conic::through_points(&pts, GeomCfg::default()),
            Err(GeometryError::InsufficientConstraints { .. })
        ));
    }

    #[test]
    fn absolute_dual_conic_contains_no_real_line() {
        let cfg = GeomCfg::default();
        let c = DualConic::absolute();
        assert!(c.is_degenerate(cfg));
        assert!(!c.contains_line(&Line::new(1.0, 2.0, 3.0).unwrap(), cfg));
        assert!(c.contains_line(&Line::at_infinity(), cfg));
    }
}
