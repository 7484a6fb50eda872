//! Build one transform per subgroup, classify it, and decompose it.

use projgeom::subgroup::{build, AffineDecomposition, ChainDecomposition};
use projgeom::{GeomCfg, Subgroup};

fn main() {
    let cfg = GeomCfg::default();
    let params: [(Subgroup, &[f64]); 4] = [
        (Subgroup::Euclidean, &[0.5, 1.0, 2.0]),
        (Subgroup::Similarity, &[2.0, 0.5, 1.0, 2.0]),
        (Subgroup::Affine, &[1.0, 0.4, -0.2, 1.5, 1.0, 2.0]),
        (Subgroup::Projective, &[1.0, 0.4, -0.2, 1.5, 1.0, 2.0, 0.01, -0.02]),
    ];
    for (g, p) in params {
        let h = build(g, p, cfg).expect("parameters are non-singular");
        let m = h.matrix();
        let a = m.fixed_view::<2, 2>(0, 0).into_owned();
        let d = AffineDecomposition::of(&a).expect("2x2 SVD");
        let chain = ChainDecomposition::of(&h, cfg).expect("h33 = 1");
        println!(
            "{g:<10} dof={} classified={} theta={:.3} phi={:.3} lambda=({:.3}, {:.3}) chain_ok={}",
            g.dof(),
            h.classify(cfg),
            d.theta,
            d.phi,
            d.lambda1,
            d.lambda2,
            chain.recompose().equiv(&h, cfg.with_eps(1e-9)),
        );
    }
}
