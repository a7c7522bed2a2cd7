use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ndarray::ArrayD;
use nifti::{IntoNdArray, NiftiObject, ReaderOptions};
use tracing::warn;

use crate::error::EvalError;

/// Integer label volume read from a NIfTI file.
#[derive(Debug, Clone)]
pub struct LabelVolume {
    pub path: PathBuf,
    pub data: ArrayD<i64>,
    /// Distinct nonzero labels, ascending.
    pub labels: Vec<i64>,
}

impl LabelVolume {
    /// Fails with `EvalError::MissingBackground` when no voxel is 0.
    pub fn from_array(path: PathBuf, data: ArrayD<i64>) -> Result<Self, EvalError> {
        let mut distinct = BTreeSet::new();
        for &v in data.iter() {
            distinct.insert(v);
        }
        if !distinct.remove(&0) {
            return Err(EvalError::MissingBackground(path));
        }
        Ok(Self {
            path,
            data,
            labels: distinct.into_iter().collect(),
        })
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

/// Loads a `.nii` / `.nii.gz` segmentation; voxel values are truncated to integers.
pub fn load_label_volume(path: &Path) -> Result<LabelVolume> {
    let data = read_voxels(path)?;
    let volume = LabelVolume::from_array(path.to_path_buf(), data.mapv(|v| v as i64))?;
    Ok(volume)
}

fn read_voxels(path: &Path) -> Result<ArrayD<f64>> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI {}", path.display()))?;
    let data = obj
        .into_volume()
        .into_ndarray::<f64>()
        .with_context(|| format!("failed to decode NIfTI volume {}", path.display()))?;
    Ok(data)
}

/// Spatial extent `[x, y, z]` from the NIfTI header.
///
/// With `check_labels`, a volume without any nonzero voxel yields `None`.
pub fn nifti_dimensions(path: &Path, check_labels: bool) -> Result<Option<[u32; 3]>> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("failed to read NIfTI {}", path.display()))?;
    let dim = obj.header().dim;
    let dims = [dim[1] as u32, dim[2] as u32, dim[3] as u32];

    if check_labels {
        let data = obj
            .into_volume()
            .into_ndarray::<f64>()
            .with_context(|| format!("failed to decode NIfTI volume {}", path.display()))?;
        if data.iter().all(|v| *v == 0.0) {
            warn!(path = %path.display(), "no label found in segmentation");
            return Ok(None);
        }
    }
    Ok(Some(dims))
}
