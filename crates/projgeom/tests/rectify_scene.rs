//! End-to-end: distort a world grid, rectify it back, check what survives.

use nalgebra::vector;
use projgeom::prelude::*;
use projgeom::sample::{random_transform, synthetic_scene, ReplayToken, SampleCfg, SceneCfg};

fn cfg() -> GeomCfg {
    GeomCfg::default().with_eps(1e-9)
}

#[test]
fn length_ratios_survive_metric_rectification() {
    let truth = random_transform(
        Subgroup::Projective,
        &SampleCfg {
            perspective: 0.1,
            ..SampleCfg::default()
        },
        ReplayToken { seed: 2024, index: 0 },
    );
    let scene = synthetic_scene(
        &truth,
        &SceneCfg {
            parallel_pairs: 3,
            orthogonal_pairs: 3,
            ..SceneCfg::default()
        },
        ReplayToken { seed: 2024, index: 1 },
    );
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    assert_eq!(r.level, Subgroup::Similarity);

    // a world rectangle 4 x 1: image it, rectify it, compare side ratios
    let world = [
        Point::from_euclidean(0.0, 0.0).unwrap(),
        Point::from_euclidean(4.0, 0.0).unwrap(),
        Point::from_euclidean(4.0, 1.0).unwrap(),
        Point::from_euclidean(0.0, 1.0).unwrap(),
    ];
    let image = truth.apply_all(&world);
    let rect: Vec<_> = r
        .rectify_all(&image)
        .iter()
        .map(|p| p.to_euclidean(cfg()).unwrap())
        .collect();
    let long = (rect[1] - rect[0]).norm();
    let short = (rect[2] - rect[1]).norm();
    assert!((long / short - 4.0).abs() < 1e-8);
    let diag = (rect[2] - rect[0]).norm();
    assert!((diag / short - 17f64.sqrt()).abs() < 1e-8);
}

#[test]
fn circle_stays_a_circle_after_rectification() {
    let truth = random_transform(
        Subgroup::Projective,
        &SampleCfg::default(),
        ReplayToken { seed: 77, index: 0 },
    );
    let scene = synthetic_scene(&truth, &SceneCfg::default(), ReplayToken { seed: 77, index: 1 });
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    let circle = Conic::circle(vector![1.0, -1.0], 2.0).unwrap();
    let back = r.combined.apply(&truth.apply(&circle));
    let m = back.matrix();
    // a circle has equal diagonal quadratic terms and no xy term
    let scale = m.norm();
    assert!((m[(0, 0)] - m[(1, 1)]).abs() < 1e-8 * scale);
    assert!(m[(0, 1)].abs() < 1e-8 * scale);
}

#[test]
fn parallel_only_input_keeps_affine_invariants() {
    let truth = random_transform(
        Subgroup::Projective,
        &SampleCfg::default(),
        ReplayToken { seed: 5, index: 0 },
    );
    let mut scene = synthetic_scene(&truth, &SceneCfg::default(), ReplayToken { seed: 5, index: 1 });
    scene.orthogonal.clear();
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    assert_eq!(r.level, Subgroup::Affine);
    // midpoints are affine invariants
    let a = Point::from_euclidean(-1.0, 2.0).unwrap();
    let b = Point::from_euclidean(3.0, 0.5).unwrap();
    let mid = Point::from_euclidean(1.0, 1.25).unwrap();
    let [ra, rb, rm] = [a, b, mid].map(|p| {
        r.combined
            .apply(&truth.apply(&p))
            .to_euclidean(cfg())
            .unwrap()
    });
    assert!(((ra + rb) * 0.5 - rm).norm() < 1e-8 * (ra.norm() + rb.norm() + 1.0));
}

#[test]
fn identity_image_needs_no_correction() {
    let scene = synthetic_scene(
        &Homography::identity(),
        &SceneCfg::default(),
        ReplayToken { seed: 1, index: 0 },
    );
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    assert!(r.vanishing_line.is_at_infinity(cfg()));
    assert!(r.combined.classify(cfg()) <= Subgroup::Similarity);
}
