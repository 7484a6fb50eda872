//! Numeric tolerances shared by every tolerance-dependent operation.
//!
//! Policy
//! - Zero and equality tests are relative: a quantity is "zero" when it is at
//!   most `eps` times the magnitudes of the operands it was computed from.
//! - The defaults suit coordinates of moderate magnitude. Pixel-scale inputs
//!   with measurement noise usually want a larger `eps`.

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    /// Relative tolerance for zero/equal tests.
    pub eps: f64,
    /// Largest accepted condition number of an estimation solve.
    pub cond_max: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps: 1024.0 * f64::EPSILON,
            cond_max: 1e8,
        }
    }
}

impl GeomCfg {
    #[inline]
    pub fn with_eps(self, eps: f64) -> Self {
        Self { eps, ..self }
    }
    #[inline]
    pub fn with_cond_max(self, cond_max: f64) -> Self {
        Self { cond_max, ..self }
    }
    /// `value` is zero relative to `scale`.
    #[inline]
    pub(crate) fn is_negligible(&self, value: f64, scale: f64) -> bool {
        value.abs() <= self.eps * scale
    }
}
