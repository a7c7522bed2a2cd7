use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::{DefaultDicomObject, open_file};
use tracing::warn;
use walkdir::WalkDir;

use crate::io::volume;

pub type Dimensions = [u32; 3];

/// Outcome of looking for a volume in one operator output dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimensionProbe {
    NotFound(PathBuf),
    Found(PathBuf, Dimensions),
}

impl DimensionProbe {
    pub fn dimensions(&self) -> Option<Dimensions> {
        match self {
            DimensionProbe::NotFound(_) => None,
            DimensionProbe::Found(_, dims) => Some(*dims),
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            DimensionProbe::NotFound(dir) | DimensionProbe::Found(dir, _) => dir,
        }
    }
}

/// Files below `dir` (recursive) whose name satisfies `accept`, sorted.
fn files_matching(dir: &Path, accept: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_str().map(&accept).unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Rows, columns and frame count of the first `*.dcm` below `dir`.
///
/// SEG objects split `NumberOfFrames` across their segments. Without
/// `NumberOfFrames` the slice count is the number of files next to the
/// first slice.
pub fn probe_dicom(dir: &Path) -> Result<DimensionProbe> {
    let files = files_matching(dir, |name| name.ends_with(".dcm"));
    let Some(first) = files.first() else {
        return Ok(DimensionProbe::NotFound(dir.to_path_buf()));
    };

    let obj = open_file(first)
        .map_err(|e| anyhow!("failed to read DICOM {}: {}", first.display(), e))?;
    let rows = read_u32(&obj, tags::ROWS, "Rows", first)?;
    let columns = read_u32(&obj, tags::COLUMNS, "Columns", first)?;
    let modality = match obj.get(tags::MODALITY) {
        Some(elem) => elem
            .to_str()
            .map_err(|e| anyhow!("Modality in {}: {}", first.display(), e))?
            .trim()
            .to_string(),
        None => String::new(),
    };
    let number_of_frames = match obj.get(tags::NUMBER_OF_FRAMES) {
        Some(_) => Some(read_u32(&obj, tags::NUMBER_OF_FRAMES, "NumberOfFrames", first)?),
        None => None,
    };

    let frames = match number_of_frames {
        Some(frames) if modality == "SEG" => {
            let segments = obj
                .get(tags::SEGMENT_SEQUENCE)
                .and_then(|e| e.items())
                .map(|items| items.len() as u32)
                .unwrap_or(0);
            if segments == 0 {
                warn!(file = %first.display(), "SEG without SegmentSequence");
                return Ok(DimensionProbe::NotFound(dir.to_path_buf()));
            }
            frames / segments
        }
        None => {
            let slice_dir = first.parent().unwrap_or(dir);
            count_files(slice_dir)?
        }
        Some(frames) => {
            warn!(
                file = %first.display(),
                modality = %modality,
                frames,
                "could not extract DICOM dimensions"
            );
            return Ok(DimensionProbe::NotFound(dir.to_path_buf()));
        }
    };

    Ok(DimensionProbe::Found(dir.to_path_buf(), [rows, columns, frames]))
}

/// Header dimensions of the first `*.nii*` below `dir`.
pub fn probe_nifti(dir: &Path, check_labels: bool) -> Result<DimensionProbe> {
    let files = files_matching(dir, |name| name.contains(".nii"));
    let Some(first) = files.first() else {
        return Ok(DimensionProbe::NotFound(dir.to_path_buf()));
    };
    match volume::nifti_dimensions(first, check_labels)? {
        Some(dims) => Ok(DimensionProbe::Found(dir.to_path_buf(), dims)),
        None => Ok(DimensionProbe::NotFound(dir.to_path_buf())),
    }
}

fn read_u32(
    obj: &DefaultDicomObject,
    tag: Tag,
    name: &str,
    file: &Path,
) -> Result<u32> {
    let elem = obj
        .get(tag)
        .ok_or_else(|| anyhow!("{} missing in {}", name, file.display()))?;
    elem.to_int::<u32>()
        .map_err(|e| anyhow!("{} in {}: {}", name, file.display(), e))
}

fn count_files(dir: &Path) -> Result<u32> {
    let mut n = 0u32;
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        if entry?.file_type()?.is_file() {
            n += 1;
        }
    }
    Ok(n)
}
