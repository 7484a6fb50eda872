//! On-disk formats for correspondences and rectification reports.
//!
//! JSON carries everything (pairs, an optional imaged circle, an optional
//! ground-truth matrix). CSV carries tagged line pairs only, one per row:
//! `kind,a1,b1,c1,a2,b2,c2` with `kind` either `parallel` or `orthogonal`.

use anyhow::{anyhow, bail, Context, Result};
use nalgebra::Matrix3;
use polars::prelude::*;
use projgeom::{
    Conic, Constraint, Correspondences, GeomCfg, Line, LinePair, Rectification, Subgroup,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

type Pair = [[f64; 3]; 2];
type Rows = [[f64; 3]; 3];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CorrespondenceFile {
    #[serde(default)]
    pub parallel: Vec<Pair>,
    #[serde(default)]
    pub orthogonal: Vec<Pair>,
    /// Conic coefficients `a x² + b xy + c y² + d x + e y + f`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<[f64; 6]>,
    /// Transform that produced the image, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth: Option<Rows>,
}

impl CorrespondenceFile {
    pub fn from_correspondences(c: &Correspondences, truth: Option<&Matrix3<f64>>) -> Self {
        Self {
            parallel: c.parallel.iter().map(pair_to_raw).collect(),
            orthogonal: c.orthogonal.iter().map(pair_to_raw).collect(),
            circle: c.circle.as_ref().map(conic_to_raw),
            truth: truth.map(matrix_to_rows),
        }
    }

    pub fn to_correspondences(&self) -> Result<Correspondences> {
        let pairs = |raw: &[Pair], kind: &str| -> Result<Vec<LinePair>> {
            raw.iter()
                .enumerate()
                .map(|(i, p)| pair_from_raw(p).with_context(|| format!("{kind} pair {i}")))
                .collect()
        };
        let circle = match self.circle {
            Some([a, b, c, d, e, f]) => {
                Some(Conic::from_coeffs(a, b, c, d, e, f).context("circle")?)
            }
            None => None,
        };
        Ok(Correspondences {
            parallel: pairs(&self.parallel, "parallel")?,
            orthogonal: pairs(&self.orthogonal, "orthogonal")?,
            circle,
        })
    }

    pub fn truth_matrix(&self) -> Option<Matrix3<f64>> {
        self.truth.map(|rows| rows_to_matrix(&rows))
    }
}

/// Serialized outcome of a rectification run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RectifyReport {
    pub level: String,
    pub vanishing_line: [f64; 3],
    pub affine: Rows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<Rows>,
    pub combined: Rows,
    /// Class of `combined ∘ truth`; at most `level` for a correct recovery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residual: Option<String>,
}

impl RectifyReport {
    pub fn new(r: &Rectification) -> Self {
        let l = r.vanishing_line.normalized().coords();
        Self {
            level: r.level.to_string(),
            vanishing_line: [l.x, l.y, l.z],
            affine: matrix_to_rows(&r.affine.matrix()),
            metric: r.metric.as_ref().map(|m| matrix_to_rows(&m.matrix())),
            combined: matrix_to_rows(&r.combined.matrix()),
            residual: None,
        }
    }
}

/// Class of `combined ∘ truth`, recorded in the report. A correct recovery
/// stays within the recovered level.
pub fn residual_class(r: &Rectification, truth: &Matrix3<f64>, cfg: GeomCfg) -> Result<Subgroup> {
    let residual = projgeom::classify(&(r.combined.matrix() * truth), cfg)
        .context("classifying combined ∘ truth")?;
    if !r.level.contains(residual) {
        tracing::warn!(%residual, level = %r.level, "residual coarser than recovered level");
    }
    Ok(residual)
}

/// Row-major `h11,h12,...,h33`.
pub fn parse_matrix(raw: &str) -> Result<Matrix3<f64>> {
    let values = raw
        .split(',')
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .with_context(|| format!("bad matrix entry {s:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != 9 {
        bail!("expected 9 matrix entries, got {}", values.len());
    }
    Ok(Matrix3::from_row_slice(&values))
}

pub fn read_correspondences(path: &Path) -> Result<CorrespondenceFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => read_csv(path),
        Some("json") => {
            let bytes =
                std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))
        }
        other => bail!("unsupported input format {other:?} (expected .json or .csv)"),
    }
}

fn read_csv(path: &Path) -> Result<CorrespondenceFile> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()?
        .collect()?;
    tracing::info!(rows = df.height(), cols = df.width(), "input_csv_shape");

    let kind = df.column("kind")?.str()?.clone();
    let names = ["a1", "b1", "c1", "a2", "b2", "c2"];
    let mut cols = Vec::with_capacity(names.len());
    for name in names {
        let series = df
            .column(name)
            .with_context(|| format!("missing column {name}"))?
            .cast(&DataType::Float64)?;
        cols.push(series.f64()?.clone());
    }

    let mut file = CorrespondenceFile::default();
    for row in 0..df.height() {
        let mut v = [0.0; 6];
        for (slot, col) in v.iter_mut().zip(&cols) {
            *slot = col
                .get(row)
                .ok_or_else(|| anyhow!("row {row}: null coefficient"))?;
        }
        let pair = [[v[0], v[1], v[2]], [v[3], v[4], v[5]]];
        match kind.get(row).map(parse_kind).transpose()? {
            Some(Constraint::Parallel) => file.parallel.push(pair),
            Some(Constraint::Orthogonal) => file.orthogonal.push(pair),
            None => bail!("row {row}: missing kind"),
        }
    }
    Ok(file)
}

fn parse_kind(s: &str) -> Result<Constraint> {
    match s.trim().to_ascii_lowercase().as_str() {
        "parallel" | "p" => Ok(Constraint::Parallel),
        "orthogonal" | "o" => Ok(Constraint::Orthogonal),
        other => bail!("unknown constraint kind {other:?}"),
    }
}

fn pair_from_raw(p: &Pair) -> Result<LinePair> {
    let [a, b] = p;
    Ok(LinePair::new(
        Line::new(a[0], a[1], a[2])?,
        Line::new(b[0], b[1], b[2])?,
    ))
}

fn pair_to_raw(p: &LinePair) -> Pair {
    let a = p.first.coords();
    let b = p.second.coords();
    [[a.x, a.y, a.z], [b.x, b.y, b.z]]
}

fn conic_to_raw(c: &Conic) -> [f64; 6] {
    let m = c.matrix();
    [
        m[(0, 0)],
        2.0 * m[(0, 1)],
        m[(1, 1)],
        2.0 * m[(0, 2)],
        2.0 * m[(1, 2)],
        m[(2, 2)],
    ]
}

pub fn matrix_to_rows(m: &Matrix3<f64>) -> Rows {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            *v = m[(i, j)];
        }
    }
    out
}

pub fn rows_to_matrix(rows: &Rows) -> Matrix3<f64> {
    Matrix3::from_fn(|i, j| rows[i][j])
}
