//! Dimension consistency between the operator outputs of a batch element.
//!
//! Each input dir is probed for DICOM first; dirs without DICOM are probed
//! again for NIfTI. The resulting dimensions are compared in input order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::EvalError;
use crate::input;

mod probe;

pub use probe::{DimensionProbe, Dimensions, probe_dicom, probe_nifti};

#[cfg(feature = "mt")]
use rayon::prelude::*;

pub const DEFAULT_ISSUE_DIR: &str = "dimension_issue";
pub const DEFAULT_PARALLEL_CHECKS: usize = 3;

#[derive(Debug, Clone)]
pub struct DimsConfig {
    pub run_dir: PathBuf,
    pub batch_name: String,
    pub input_dirs: Vec<String>,
    pub parallel_checks: usize,
    pub check_labels: bool,
    pub move_data: bool,
    pub abort_on_error: bool,
    pub issue_dir: String,
}

impl DimsConfig {
    pub fn new(run_dir: PathBuf, batch_name: &str, input_dirs: Vec<String>) -> Self {
        Self {
            run_dir,
            batch_name: batch_name.to_string(),
            input_dirs,
            parallel_checks: DEFAULT_PARALLEL_CHECKS,
            check_labels: true,
            move_data: true,
            abort_on_error: false,
            issue_dir: DEFAULT_ISSUE_DIR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub left: String,
    pub right: String,
    pub left_dims: Dimensions,
    pub right_dims: Dimensions,
}

#[derive(Debug, Clone)]
pub struct ElementReport {
    pub element: PathBuf,
    /// One entry per configured input dir, in configuration order.
    pub dimensions: Vec<Option<Dimensions>>,
    pub mismatches: Vec<Mismatch>,
    pub unresolved: Vec<String>,
}

impl ElementReport {
    pub fn has_error(&self) -> bool {
        !self.mismatches.is_empty() || !self.unresolved.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct DimsSummary {
    pub checked: usize,
    pub failed: Vec<PathBuf>,
    pub moved: Vec<PathBuf>,
}

/// Runs dimension probes over the input dirs of a batch element.
///
/// With `mt` the probes share one bounded rayon pool of `parallel_checks`
/// workers; without it they run in order.
pub struct Prober {
    #[cfg(feature = "mt")]
    pool: rayon::ThreadPool,
    check_labels: bool,
}

impl Prober {
    pub fn new(parallel_checks: usize, check_labels: bool) -> Result<Self> {
        #[cfg(feature = "mt")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallel_checks.max(1))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
        #[cfg(not(feature = "mt"))]
        let _ = parallel_checks;
        Ok(Self {
            #[cfg(feature = "mt")]
            pool,
            check_labels,
        })
    }

    #[cfg(feature = "mt")]
    fn probe_all<F>(&self, dirs: &[PathBuf], probe: F) -> Result<Vec<DimensionProbe>>
    where
        F: Fn(&Path) -> Result<DimensionProbe> + Send + Sync,
    {
        self.pool.install(|| dirs.par_iter().map(|d| probe(d.as_path())).collect())
    }

    #[cfg(not(feature = "mt"))]
    fn probe_all<F>(&self, dirs: &[PathBuf], probe: F) -> Result<Vec<DimensionProbe>>
    where
        F: Fn(&Path) -> Result<DimensionProbe> + Send + Sync,
    {
        dirs.iter().map(|d| probe(d.as_path())).collect()
    }
}

/// Probes every input dir of one batch element and compares the dimensions.
pub fn check_batch_element(
    element: &Path,
    input_dirs: &[String],
    prober: &Prober,
) -> Result<ElementReport> {
    let dirs: Vec<PathBuf> = input_dirs.iter().map(|d| element.join(d)).collect();
    let mut dimensions: Vec<Option<Dimensions>> = prober
        .probe_all(&dirs, probe_dicom)?
        .iter()
        .map(|p| p.dimensions())
        .collect();

    let missing: Vec<usize> = (0..dirs.len()).filter(|&i| dimensions[i].is_none()).collect();
    if !missing.is_empty() {
        let nifti_dirs: Vec<PathBuf> = missing.iter().map(|&i| dirs[i].clone()).collect();
        let check_labels = prober.check_labels;
        let nifti = prober.probe_all(&nifti_dirs, |d| probe_nifti(d, check_labels))?;
        for (&i, probe) in missing.iter().zip(nifti.iter()) {
            dimensions[i] = probe.dimensions();
        }
    }

    let mut mismatches = Vec::new();
    let mut unresolved = Vec::new();
    let mut last: Option<(usize, Dimensions)> = None;
    for (i, dims) in dimensions.iter().enumerate() {
        let Some(dims) = *dims else {
            warn!(input = %dirs[i].display(), "could not extract dimensions");
            unresolved.push(input_dirs[i].clone());
            continue;
        };
        if let Some((j, prev)) = last {
            if prev != dims {
                warn!(
                    left = %input_dirs[j],
                    right = %input_dirs[i],
                    left_dims = ?prev,
                    right_dims = ?dims,
                    "dimensions differ"
                );
                mismatches.push(Mismatch {
                    left: input_dirs[j].clone(),
                    right: input_dirs[i].clone(),
                    left_dims: prev,
                    right_dims: dims,
                });
            } else {
                info!(left = %input_dirs[j], right = %input_dirs[i], dims = ?dims, "dimensions match");
            }
        }
        last = Some((i, dims));
    }

    Ok(ElementReport {
        element: element.to_path_buf(),
        dimensions,
        mismatches,
        unresolved,
    })
}

/// Checks every batch element of the run and quarantines or aborts on failure.
pub fn run(cfg: &DimsConfig) -> Result<DimsSummary> {
    let batch_root = cfg.run_dir.join(&cfg.batch_name);
    let elements = input::list_batch_elements(&batch_root)?;
    info!(
        batch_root = %batch_root.display(),
        batches = elements.len(),
        inputs = ?cfg.input_dirs,
        "dimension check started"
    );

    let prober = Prober::new(cfg.parallel_checks, cfg.check_labels)?;
    let mut summary = DimsSummary::default();
    for element in elements {
        let report = check_batch_element(&element, &cfg.input_dirs, &prober)?;
        summary.checked += 1;
        if !report.has_error() {
            continue;
        }
        summary.failed.push(element.clone());

        if cfg.move_data {
            let target = quarantine(&element, &cfg.run_dir.join(&cfg.issue_dir))?;
            summary.moved.push(target);
        } else if cfg.abort_on_error {
            return Err(EvalError::DimensionMismatch(element).into());
        }
    }
    Ok(summary)
}

/// Moves `element` into `issue_root`. A name already taken by an earlier
/// run gets a `_<n>` suffix.
fn quarantine(element: &Path, issue_root: &Path) -> Result<PathBuf> {
    let name = element
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("invalid batch element {}", element.display()))?;
    fs::create_dir_all(issue_root)
        .with_context(|| format!("failed to create {}", issue_root.display()))?;
    let target = free_target(issue_root, name);
    fs::rename(element, &target).with_context(|| {
        format!(
            "failed to move {} -> {}",
            element.display(),
            target.display()
        )
    })?;
    info!(from = %element.display(), to = %target.display(), "batch element moved");
    Ok(target)
}

fn free_target(issue_root: &Path, name: &str) -> PathBuf {
    let mut target = issue_root.join(name);
    let mut n = 1;
    while target.exists() {
        target = issue_root.join(format!("{}_{}", name, n));
        n += 1;
    }
    target
}
