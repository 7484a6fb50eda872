use super::*;
use crate::incidence::{angle_between, meet};
use crate::primitives::Point;
use crate::sample::{random_transform, synthetic_scene, ReplayToken, SampleCfg, SceneCfg};
use nalgebra::vector;

fn cfg() -> GeomCfg {
    GeomCfg::default().with_eps(1e-9)
}

fn line(a: f64, b: f64, c: f64) -> Line {
    Line::new(a, b, c).unwrap()
}

fn truth(seed: u64) -> Homography {
    random_transform(
        Subgroup::Projective,
        &SampleCfg::default(),
        ReplayToken { seed, index: 0 },
    )
}

#[test]
fn ideal_vanishing_points_give_identity_correction() {
    let a = Point::ideal(1.0, 0.0).unwrap();
    let b = Point::ideal(0.0, 1.0).unwrap();
    let r = affine_from_vanishing_points(&[a, b], cfg()).unwrap();
    assert!(r.vanishing_line.equiv(&Line::at_infinity(), cfg()));
    for p in [a, b] {
        assert_eq!(r.correction.apply(&p).coords().z, 0.0);
    }
    let image = r.correction.apply(&r.vanishing_line);
    assert!(image.equiv(&Line::at_infinity(), cfg()));
}

#[test]
fn recovered_line_is_sent_to_infinity() {
    // vanishing points (2, 0) and (0, 4): line 2x + y - 4 = 0
    let a = Point::from_euclidean(2.0, 0.0).unwrap();
    let b = Point::from_euclidean(0.0, 4.0).unwrap();
    let r = affine_from_vanishing_points(&[a, b], cfg()).unwrap();
    assert!(r.vanishing_line.equiv(&line(2.0, 1.0, -4.0), cfg()));
    let m = r.correction.matrix();
    assert!((m[(2, 2)] - 1.0).abs() < 1e-15);
    assert!(r
        .correction
        .apply(&r.vanishing_line)
        .equiv(&Line::at_infinity(), cfg()));
    for p in [a, b] {
        assert!(r.correction.apply(&p).is_ideal(cfg()));
    }
}

#[test]
fn one_pair_is_not_enough() {
    let pair = LinePair::new(line(1.0, 0.0, -1.0), line(1.1, 0.0, -3.0));
    assert!(matches!(
        affine_rectification(&[pair], cfg()),
        Err(GeometryError::InsufficientConstraints { needed: 2, got: 1 })
    ));
}

#[test]
fn coincident_vanishing_points_are_insufficient() {
    // both pairs converge to (0, 10)
    let pairs = [
        LinePair::new(line(10.0, 1.0, -10.0), line(-10.0, 1.0, -10.0)),
        LinePair::new(line(5.0, 1.0, -10.0), line(-5.0, 1.0, -10.0)),
    ];
    assert!(matches!(
        affine_rectification(&pairs, cfg()),
        Err(GeometryError::InsufficientConstraints { .. })
    ));
    let v = Point::from_euclidean(0.0, 10.0).unwrap();
    assert!(matches!(
        affine_from_vanishing_points(&[v, v, v], cfg()),
        Err(GeometryError::InsufficientConstraints { needed: 2, got: 1 })
    ));
}

#[test]
fn identical_lines_have_no_vanishing_point() {
    let l = line(1.0, 2.0, 3.0);
    let pairs = [
        LinePair::new(l, l),
        LinePair::new(line(1.0, 0.0, 0.0), line(1.0, 0.1, 1.0)),
    ];
    assert!(matches!(
        affine_rectification(&pairs, cfg()),
        Err(GeometryError::DegenerateEntity(_))
    ));
}

#[test]
fn vanishing_line_through_origin_is_translated_first() {
    let l = line(1.0, 1.0, 0.0);
    let h = vanishing_line_correction(&l, cfg()).unwrap();
    assert!(h.apply(&l).equiv(&Line::at_infinity(), cfg()));
    // points off the vanishing line stay finite
    let p = h.apply(&Point::from_euclidean(3.0, -1.0).unwrap());
    assert!(!p.is_ideal(cfg()));
    assert_ne!(h.classify(cfg()), Subgroup::Affine);
}

#[test]
fn parallel_pairs_with_vanishing_line_through_origin() {
    // vanishing points (1, -1) and (-2, 2) lie on x + y = 0
    let a = Point::from_euclidean(1.0, -1.0).unwrap();
    let b = Point::from_euclidean(-2.0, 2.0).unwrap();
    let pair = |v: &Point, p: (f64, f64), q: (f64, f64)| {
        let p = Point::from_euclidean(p.0, p.1).unwrap();
        let q = Point::from_euclidean(q.0, q.1).unwrap();
        LinePair::new(
            crate::incidence::join(v, &p, cfg()).unwrap(),
            crate::incidence::join(v, &q, cfg()).unwrap(),
        )
    };
    let pairs = [
        pair(&a, (0.0, 3.0), (0.0, 5.0)),
        pair(&b, (4.0, 0.0), (6.0, 1.0)),
    ];
    let r = affine_rectification(&pairs, cfg()).unwrap();
    assert!(r.vanishing_line.equiv(&line(1.0, 1.0, 0.0), cfg()));
    for p in r.correction.apply_all(&pairs) {
        let x = meet(&p.first, &p.second, cfg()).unwrap();
        assert!(x.is_ideal(cfg()));
    }
}

#[test]
fn metric_needs_two_independent_pairs() {
    let p = LinePair::new(line(1.0, 0.0, 0.0), line(0.0, 1.0, 2.0));
    assert!(matches!(
        metric_rectification(&[p], cfg()),
        Err(GeometryError::InsufficientConstraints { needed: 2, got: 1 })
    ));
    // the same orthogonal directions twice add no information
    let q = LinePair::new(line(0.0, 3.0, 1.0), line(2.0, 0.0, -5.0));
    assert!(matches!(
        metric_rectification(&[p, q], cfg()),
        Err(GeometryError::InsufficientConstraints { needed: 2, got: 1 })
    ));
}

#[test]
fn nearly_dependent_pairs_are_ill_conditioned() {
    let d: f64 = 1e-10;
    let p = LinePair::new(line(1.0, 0.0, 0.0), line(0.0, 1.0, 0.0));
    let q = LinePair::new(line(d.cos(), d.sin(), 1.0), line(-d.sin(), d.cos(), 1.0));
    assert!(matches!(
        metric_rectification(&[p, q], GeomCfg::default()),
        Err(GeometryError::IllConditioned { .. })
    ));
}

#[test]
fn metric_stage_undoes_an_affinity() {
    let a = crate::subgroup::build(
        Subgroup::Affine,
        &[2.0, 0.7, -0.3, 0.8, 1.0, -2.0],
        cfg(),
    )
    .unwrap();
    // world orthogonal pairs at 0 and 0.5 rad
    let mut pairs = Vec::new();
    for th in [0.0f64, 0.5] {
        let w = LinePair::new(
            line(th.cos(), th.sin(), 1.0),
            line(-th.sin(), th.cos(), -2.0),
        );
        pairs.push(a.apply(&w));
    }
    let hs = metric_rectification(&pairs, cfg()).unwrap();
    assert!(hs.classify(cfg()) <= Subgroup::Affine);
    assert!(hs.compose(&a).classify(cfg()) <= Subgroup::Similarity);
}

#[test]
fn circle_image_fixes_metric() {
    let a = crate::subgroup::build(
        Subgroup::Affine,
        &[1.5, -0.4, 0.2, 0.6, 3.0, 1.0],
        cfg(),
    )
    .unwrap();
    let circle = Conic::circle(vector![1.0, 2.0], 4.0).unwrap();
    let hs = metric_from_circle(&a.apply(&circle), cfg()).unwrap();
    assert!(hs.compose(&a).classify(cfg()) <= Subgroup::Similarity);

    let dual = a.apply(&crate::conic::DualConic::absolute());
    let hd = metric_from_dual_conic(&dual, cfg()).unwrap();
    assert!(hd.compose(&a).classify(cfg()) <= Subgroup::Similarity);
}

#[test]
fn indefinite_conic_is_rejected() {
    let hyperbola = Conic::from_coeffs(1.0, 0.0, -1.0, 0.0, 0.0, -1.0).unwrap();
    assert!(matches!(
        metric_from_circle(&hyperbola, cfg()),
        Err(GeometryError::DegenerateConic(_))
    ));
}

#[test]
fn pipeline_recovers_similarity() {
    for seed in 0..25 {
        let h = truth(seed);
        let scene = synthetic_scene(&h, &SceneCfg::default(), ReplayToken { seed, index: 1 });
        let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
        assert_eq!(r.level, Subgroup::Similarity);
        assert!(r.affine.compose(&h).classify(cfg()) <= Subgroup::Affine);
        assert!(
            r.combined.compose(&h).classify(cfg()) <= Subgroup::Similarity,
            "seed {seed}"
        );
        // rectified orthogonal lines are orthogonal
        for pair in r.rectify_all(&scene.orthogonal) {
            let angle = angle_between(&pair.first, &pair.second, cfg()).unwrap();
            assert!((angle - std::f64::consts::FRAC_PI_2).abs() < 1e-8);
        }
        // rectified parallel lines meet at infinity
        for pair in r.rectify_all(&scene.parallel) {
            assert!(meet(&pair.first, &pair.second, cfg())
                .unwrap()
                .is_ideal(GeomCfg::default().with_eps(1e-8)));
        }
    }
}

#[test]
fn pipeline_without_metric_input_stops_at_affine() {
    let h = truth(3);
    let mut scene = synthetic_scene(&h, &SceneCfg::default(), ReplayToken { seed: 3, index: 1 });
    scene.orthogonal.clear();
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    assert_eq!(r.level, Subgroup::Affine);
    assert!(r.metric.is_none());
    assert!(r.combined.equiv(&r.affine, cfg()));
}

#[test]
fn pipeline_uses_circle_when_no_orthogonal_pairs() {
    let h = truth(9);
    let mut scene = synthetic_scene(&h, &SceneCfg::default(), ReplayToken { seed: 9, index: 1 });
    scene.orthogonal.clear();
    scene.circle = Some(h.apply(&Conic::circle(vector![0.5, 0.5], 2.0).unwrap()));
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    assert_eq!(r.level, Subgroup::Similarity);
    assert!(r.combined.compose(&h).classify(cfg()) <= Subgroup::Similarity);
}

#[test]
fn noisy_overdetermined_scene_is_close_to_metric() {
    let h = truth(17);
    let scene_cfg = SceneCfg {
        parallel_pairs: 6,
        orthogonal_pairs: 6,
        noise: 1e-9,
        ..SceneCfg::default()
    };
    let scene = synthetic_scene(&h, &scene_cfg, ReplayToken { seed: 17, index: 1 });
    let r = Rectifier::new(cfg()).rectify(&scene).unwrap();
    let loose = GeomCfg::default().with_eps(1e-4);
    assert!(r.combined.compose(&h).classify(loose) <= Subgroup::Similarity);
}

#[test]
fn tagged_input_is_split_by_kind() {
    let p = LinePair::new(line(1.0, 0.0, 0.0), line(0.0, 1.0, 0.0));
    let c = Correspondences::from_tagged([
        (Constraint::Parallel, p),
        (Constraint::Orthogonal, p),
        (Constraint::Parallel, p),
    ]);
    assert_eq!(c.parallel.len(), 2);
    assert_eq!(c.orthogonal.len(), 1);
    assert!(c.circle.is_none());
}

#[test]
fn rectifier_never_falls_back_to_identity() {
    let r = Rectifier::default().rectify(&Correspondences::default());
    assert!(matches!(
        r,
        Err(GeometryError::InsufficientConstraints { needed: 2, got: 0 })
    ));
}
