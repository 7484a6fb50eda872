//! Error kinds reported by geometric operations.
//!
//! Every failure is recoverable and reported to the caller; no operation falls
//! back to a default (identity) result.

use crate::subgroup::Subgroup;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Zero vector, proportional inputs to join/meet, or an ideal point where a
    /// finite one is required.
    #[error("degenerate entity: {0}")]
    DegenerateEntity(&'static str),
    /// Singular conic where a proper conic is required.
    #[error("degenerate conic: {0}")]
    DegenerateConic(&'static str),
    /// The matrix is not invertible, so it is not a homography.
    #[error("singular transform (det = {det:e})")]
    SingularTransform { det: f64 },
    #[error("insufficient constraints: need {needed} independent, got {got}")]
    InsufficientConstraints { needed: usize, got: usize },
    #[error("ill-conditioned system: condition number {condition:e} exceeds {limit:e}")]
    IllConditioned { condition: f64, limit: f64 },
    #[error("{subgroup} takes {expected} parameters, got {got}")]
    ParameterCount {
        subgroup: Subgroup,
        expected: usize,
        got: usize,
    },
    #[error("correspondence lists differ in length ({left} vs {right})")]
    Mismatch { left: usize, right: usize },
}

pub type Result<T> = std::result::Result<T, GeometryError>;
