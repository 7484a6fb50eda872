//! Two-stage rectification of a projectively distorted plane.
//!
//! Stage 1 (affine): images of parallel world lines meet in vanishing points;
//! the line through them is the image of the line at infinity, and mapping it
//! back to `(0, 0, 1)` restores parallelism.
//!
//! Stage 2 (metric): in the affinely rectified frame, each orthogonal pair
//! constrains the image `S = K Kᵀ` of the dual absolute conic (equivalently,
//! locates the circular points). Two independent constraints fix `S`; its
//! Cholesky factor gives the correction `diag(K⁻¹, 1)`.
//!
//! Every stage reports under-determined or unstable input as an error; there is
//! no fallback to the identity.

use crate::conic::Conic;
use crate::error::{GeometryError, Result};
use crate::homography::{Homography, Transformable};
use crate::primitives::Line;
use crate::subgroup::Subgroup;
use crate::GeomCfg;

mod affine;
mod metric;

pub use affine::{
    affine_from_vanishing_points, affine_rectification, vanishing_line_correction,
    AffineRectification,
};
pub use metric::{metric_from_circle, metric_from_dual_conic, metric_rectification};

/// Two image lines with a known relation in the world plane.
#[derive(Clone, Copy, Debug)]
pub struct LinePair {
    pub first: Line,
    pub second: Line,
}

impl LinePair {
    #[inline]
    pub fn new(first: Line, second: Line) -> Self {
        Self { first, second }
    }
}

impl Transformable for LinePair {
    fn transformed(&self, h: &Homography) -> Self {
        Self {
            first: h.apply(&self.first),
            second: h.apply(&self.second),
        }
    }
}

/// World-plane relation of a `LinePair`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Constraint {
    Parallel,
    Orthogonal,
}

/// Correspondence data supplied by a feature-matching front end.
#[derive(Clone, Debug, Default)]
pub struct Correspondences {
    pub parallel: Vec<LinePair>,
    pub orthogonal: Vec<LinePair>,
    /// Image of a world circle, usable for the metric stage instead of
    /// orthogonal pairs.
    pub circle: Option<Conic>,
}

impl Correspondences {
    pub fn push(&mut self, kind: Constraint, pair: LinePair) {
        match kind {
            Constraint::Parallel => self.parallel.push(pair),
            Constraint::Orthogonal => self.orthogonal.push(pair),
        }
    }

    pub fn from_tagged<I: IntoIterator<Item = (Constraint, LinePair)>>(pairs: I) -> Self {
        let mut out = Self::default();
        for (kind, pair) in pairs {
            out.push(kind, pair);
        }
        out
    }
}

/// Result of `Rectifier::rectify`.
#[derive(Clone, Copy, Debug)]
pub struct Rectification {
    /// Image of the line at infinity recovered by stage 1.
    pub vanishing_line: Line,
    /// Stage 1 correction (pure projective, preceded by a unit translation
    /// when the vanishing line passes through the origin).
    pub affine: Homography,
    /// Stage 2 correction, applied after `affine`.
    pub metric: Option<Homography>,
    /// `metric ∘ affine`, or `affine` alone.
    pub combined: Homography,
    /// Structure recovered: `Affine` or `Similarity`.
    pub level: Subgroup,
}

impl Rectification {
    pub fn rectify_all<T: Transformable>(&self, xs: &[T]) -> Vec<T> {
        self.combined.apply_all(xs)
    }
}

/// Stateless two-stage rectification pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Rectifier {
    pub cfg: GeomCfg,
}

impl Rectifier {
    #[inline]
    pub fn new(cfg: GeomCfg) -> Self {
        Self { cfg }
    }

    /// Stage 1 from `parallel`; stage 2 from `orthogonal` (mapped into the
    /// affine frame first), or from `circle` when no orthogonal pairs are given.
    pub fn rectify(&self, input: &Correspondences) -> Result<Rectification> {
        let cfg = self.cfg;
        let stage1 = affine_rectification(&input.parallel, cfg)?;
        tracing::debug!(
            vanishing_line = %stage1.vanishing_line,
            pairs = input.parallel.len(),
            "affine stage"
        );
        let metric = if !input.orthogonal.is_empty() {
            let mapped = stage1.correction.apply_all(&input.orthogonal);
            Some(metric_rectification(&mapped, cfg)?)
        } else if let Some(circle) = &input.circle {
            Some(metric_from_circle(&stage1.correction.apply(circle), cfg)?)
        } else {
            None
        };
        let (combined, level) = match &metric {
            Some(m) => (m.compose(&stage1.correction), Subgroup::Similarity),
            None => (stage1.correction, Subgroup::Affine),
        };
        tracing::debug!(level = %level, "rectified");
        Ok(Rectification {
            vanishing_line: stage1.vanishing_line,
            affine: stage1.correction,
            metric,
            combined,
            level,
        })
    }
}

pub(crate) fn insufficient(needed: usize, got: usize) -> GeometryError {
    GeometryError::InsufficientConstraints { needed, got }
}

#[cfg(test)]
mod tests;
