//! Planar projective geometry in homogeneous coordinates, and rectification.
//!
//! Layers (leaf-first)
//! - `primitives`, `conic`: points, lines, conics and dual conics, all equal
//!   up to nonzero scale.
//! - `incidence`: incidence, join/meet (one generic cross-product operator),
//!   tangents and dual conics.
//! - `subgroup`: Euclidean ⊂ similarity ⊂ affine ⊂ projective classification,
//!   construction from minimal parameters, and decompositions.
//! - `homography`: invertible transforms acting on every entity type.
//! - `estimate`: DLT estimation from point/line correspondences.
//! - `rectify`: affine then metric rectification from line-pair constraints.
//! - `sample`: seeded random transforms and synthetic scenes.
//!
//! Every tolerance-dependent operation takes a `GeomCfg` by value; there is no
//! global state and every value type is `Send + Sync`.

mod cfg;
mod error;
mod linalg;

pub mod conic;
pub mod estimate;
pub mod homography;
pub mod incidence;
pub mod primitives;
pub mod rectify;
pub mod sample;
pub mod subgroup;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::GeomCfg;
pub use conic::{Conic, DualConic};
pub use error::{GeometryError, Result};
pub use homography::{Homography, Transformable};
pub use incidence::{dual, incident, join, meet, tangent_at, Homogeneous};
pub use primitives::{Line, Location, Point};
pub use rectify::{Constraint, Correspondences, LinePair, Rectification, Rectifier};
pub use subgroup::{build, classify, Subgroup};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::conic::{Conic, DualConic};
    pub use crate::estimate::{from_line_correspondences, from_point_correspondences};
    pub use crate::homography::{Homography, Transformable};
    pub use crate::incidence::{
        angle_between, collinear, concurrent, cross_join, dual, incident, join, meet, tangent_at,
    };
    pub use crate::primitives::{Line, Location, Point};
    pub use crate::rectify::{
        affine_rectification, metric_rectification, Constraint, Correspondences, LinePair,
        Rectification, Rectifier,
    };
    pub use crate::subgroup::{build, classify, Subgroup};
    pub use crate::{GeomCfg, GeometryError};
}
