use std::fs;
use std::path::Path;

use ndarray::Array3;
use nifti::writer::WriterOptions;
use seg_eval::error::EvalError;
use seg_eval::io::volume;
use tempfile::TempDir;

fn write_seg(path: &Path, data: &Array3<u8>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    WriterOptions::new(path).write_nifti(data).unwrap();
}

#[test]
fn loads_labels_excluding_background() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("case1.nii.gz");
    let mut data = Array3::<u8>::zeros((4, 4, 2));
    data[[0, 0, 0]] = 3;
    data[[1, 2, 1]] = 1;
    data[[3, 3, 1]] = 3;
    write_seg(&path, &data);

    let vol = volume::load_label_volume(&path).unwrap();
    assert_eq!(vol.labels, vec![1, 3]);
    assert_eq!(vol.shape(), &[4, 4, 2]);
    assert_eq!(vol.data.iter().filter(|v| **v == 3).count(), 2);
}

#[test]
fn uncompressed_nifti_loads() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("case1.nii");
    let mut data = Array3::<u8>::zeros((2, 2, 2));
    data[[1, 1, 1]] = 5;
    write_seg(&path, &data);

    let vol = volume::load_label_volume(&path).unwrap();
    assert_eq!(vol.labels, vec![5]);
}

#[test]
fn missing_background_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("full.nii.gz");
    let data = Array3::<u8>::from_elem((2, 2, 2), 1);
    write_seg(&path, &data);

    let err = volume::load_label_volume(&path).unwrap_err();
    match err.downcast_ref::<EvalError>() {
        Some(EvalError::MissingBackground(p)) => assert_eq!(p, &path),
        other => panic!("expected MissingBackground, got {:?}", other),
    }
}

#[test]
fn background_only_volume_has_no_labels() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.nii.gz");
    write_seg(&path, &Array3::<u8>::zeros((3, 3, 3)));

    let vol = volume::load_label_volume(&path).unwrap();
    assert!(vol.labels.is_empty());
    assert_eq!(volume::nifti_dimensions(&path, true).unwrap(), None);
    assert!(volume::nifti_dimensions(&path, false).unwrap().is_some());
}

#[test]
fn unreadable_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.nii.gz");
    fs::write(&path, b"not a nifti").unwrap();
    assert!(volume::load_label_volume(&path).is_err());
}
