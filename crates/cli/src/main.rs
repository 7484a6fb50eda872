use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use projgeom::sample::{random_transform, synthetic_scene, ReplayToken, SampleCfg, SceneCfg};
use projgeom::{GeomCfg, Rectifier, Subgroup};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::fmt::SubscriberBuilder;

mod io;
mod provenance;

use io::{
    matrix_to_rows, parse_matrix, read_correspondences, residual_class, CorrespondenceFile,
    RectifyReport,
};
use provenance::{current_git_rev, write_sidecar, Payload};

#[derive(Parser)]
#[command(name = "projgeom")]
#[command(about = "Projective rectification and transform classification")]
struct Cmd {
    /// Relative tolerance for rank and proportionality tests
    #[arg(long, global = true)]
    eps: Option<f64>,

    /// Largest accepted condition number for least-squares solves
    #[arg(long, global = true)]
    cond_max: Option<f64>,

    /// Emit debug-level events from the geometry library
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Optional run tag; propagated to outputs and logs
    #[arg(long, global = true)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Rectify a plane from tagged line pairs (.json or .csv)
    Rectify {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print the tightest subgroup of a row-major 3x3 matrix
    Classify {
        /// Nine comma-separated entries
        #[arg(long, allow_hyphen_values = true)]
        matrix: String,
    },
    /// Write a synthetic scene seen through a random transform
    Synth {
        #[arg(long, default_value = "projective")]
        subgroup: Subgroup,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 2)]
        parallel: usize,
        #[arg(long, default_value_t = 2)]
        orthogonal: usize,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print a small provenance JSON block
    Report,
}

fn main() -> Result<()> {
    let cmd = Cmd::parse();
    let level = if cmd.verbose { Level::DEBUG } else { Level::INFO };
    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = GeomCfg::default();
    if let Some(eps) = cmd.eps {
        cfg = cfg.with_eps(eps);
    }
    if let Some(cond_max) = cmd.cond_max {
        cfg = cfg.with_cond_max(cond_max);
    }

    match cmd.action {
        Action::Rectify { input, out } => rectify(&input, &out, cfg, cmd.tag),
        Action::Classify { matrix } => classify(&matrix, cfg),
        Action::Synth {
            subgroup,
            seed,
            parallel,
            orthogonal,
            noise,
            out,
        } => {
            let scene = SceneCfg {
                parallel_pairs: parallel,
                orthogonal_pairs: orthogonal,
                noise,
                ..SceneCfg::default()
            };
            synth(subgroup, seed, scene, &out, cmd.tag)
        }
        Action::Report => report(cmd.tag, cfg),
    }
}

fn rectify(input: &Path, out: &Path, cfg: GeomCfg, tag: Option<String>) -> Result<()> {
    tracing::info!(input = %input.display(), out = %out.display(), tag = ?tag, "rectify");
    let file = read_correspondences(input)?;
    let correspondences = file.to_correspondences()?;
    tracing::info!(
        parallel = correspondences.parallel.len(),
        orthogonal = correspondences.orthogonal.len(),
        circle = correspondences.circle.is_some(),
        "loaded"
    );

    let rectification = Rectifier::new(cfg)
        .rectify(&correspondences)
        .context("rectification failed")?;
    let mut report = RectifyReport::new(&rectification);
    if let Some(truth) = file.truth_matrix() {
        let residual = residual_class(&rectification, &truth, cfg)?;
        report.residual = Some(residual.to_string());
    }
    tracing::info!(level = %rectification.level, "rectified");

    write_json(out, &report)?;
    let params = json!({
        "eps": cfg.eps,
        "cond_max": cfg.cond_max,
        "tag": tag,
    });
    write_sidecar(
        out,
        Payload::new(params).with_input(input.to_string_lossy()),
    )?;
    Ok(())
}

fn classify(raw: &str, cfg: GeomCfg) -> Result<()> {
    let m = parse_matrix(raw)?;
    let subgroup = projgeom::classify(&m, cfg)?;
    tracing::info!(%subgroup, dof = subgroup.dof(), "classify");
    println!("{subgroup}");
    Ok(())
}

fn synth(
    subgroup: Subgroup,
    seed: u64,
    scene: SceneCfg,
    out: &Path,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(%subgroup, seed, out = %out.display(), tag = ?tag, "synth");
    let truth = random_transform(subgroup, &SampleCfg::default(), ReplayToken { seed, index: 0 });
    let correspondences = synthetic_scene(&truth, &scene, ReplayToken { seed, index: 1 });
    let file = CorrespondenceFile::from_correspondences(&correspondences, Some(&truth.matrix()));
    write_json(out, &file)?;
    let params = json!({
        "subgroup": subgroup.name(),
        "seed": seed,
        "parallel": scene.parallel_pairs,
        "orthogonal": scene.orthogonal_pairs,
        "noise": scene.noise,
        "truth": matrix_to_rows(&truth.matrix()),
        "tag": tag,
    });
    write_sidecar(out, Payload::new(params))?;
    Ok(())
}

fn report(tag: Option<String>, cfg: GeomCfg) -> Result<()> {
    let obj = json!({
        "code_rev": current_git_rev(),
        "projgeom": projgeom::VERSION,
        "tag": tag,
        "params": {
            "eps": cfg.eps,
            "cond_max": cfg.cond_max,
        },
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}

fn write_json<T: serde::Serialize>(out: &Path, value: &T) -> Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(out, serde_json::to_vec_pretty(value)?)
        .with_context(|| format!("writing {}", out.display()))
}
