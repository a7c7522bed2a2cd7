use std::fs;
use std::path::Path;

use seg_eval::io::metadata::{self, ModelInfo};
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

const SEG_INFO: &str = r#"{
    "task_id": "Task042_Liver",
    "seg_info": [
        {"label_int": 1, "label_name": "liver"},
        {"label_int": "2", "label_name": "tumor"}
    ]
}"#;

const DATASET: &str = r#"{
    "name": "LiverModel",
    "labels": {"0": "background", "1": "liver", "x": "broken"}
}"#;

#[test]
fn reads_seg_info_sidecar() {
    let tmp = TempDir::new().unwrap();
    let pred = tmp.path().join("pred");
    write(&pred.join("meta").join("seg_info.json"), SEG_INFO);

    let info = metadata::pred_infos(&pred).unwrap().unwrap();
    assert_eq!(info.model_id.as_deref(), Some("Task042_Liver"));
    let labels = info.labels.unwrap();
    assert_eq!(labels.get(&1).map(String::as_str), Some("liver"));
    assert_eq!(labels.get(&2).map(String::as_str), Some("tumor"));
}

#[test]
fn ambiguous_seg_info_is_ignored() {
    let tmp = TempDir::new().unwrap();
    let pred = tmp.path().join("pred");
    write(&pred.join("a").join("seg_info.json"), SEG_INFO);
    write(&pred.join("b").join("seg_info.json"), SEG_INFO);
    assert!(metadata::pred_infos(&pred).unwrap().is_none());
}

#[test]
fn reads_dataset_json_from_model_exports() {
    let tmp = TempDir::new().unwrap();
    let element = tmp.path().join("model1");
    write(
        &element
            .join("model-exports")
            .join("nnUNet")
            .join("3d_lowres")
            .join("dataset.json"),
        DATASET,
    );

    let info = metadata::model_infos(&element).unwrap().unwrap();
    assert_eq!(info.model_id.as_deref(), Some("LiverModel"));
    let labels = info.labels.unwrap();
    assert_eq!(labels.len(), 2);
    assert_eq!(labels.get(&0).map(String::as_str), Some("background"));
    assert_eq!(labels.get(&1).map(String::as_str), Some("liver"));
}

#[test]
fn sidecar_wins_over_model_export() {
    let tmp = TempDir::new().unwrap();
    let element = tmp.path().join("model1");
    let pred = element.join("pred");
    write(&pred.join("seg_info.json"), SEG_INFO);
    write(&element.join("model-exports").join("dataset.json"), DATASET);

    let info = metadata::resolve_model_info(&element, &pred).unwrap();
    assert_eq!(info.model_id.as_deref(), Some("Task042_Liver"));
}

#[test]
fn falls_back_to_model_export() {
    let tmp = TempDir::new().unwrap();
    let element = tmp.path().join("model1");
    let pred = element.join("pred");
    fs::create_dir_all(&pred).unwrap();
    write(&element.join("model-exports").join("dataset.json"), DATASET);

    let info = metadata::resolve_model_info(&element, &pred).unwrap();
    assert_eq!(info.model_id.as_deref(), Some("LiverModel"));
}

#[test]
fn unknown_when_nothing_found() {
    let tmp = TempDir::new().unwrap();
    let element = tmp.path().join("model1");
    let info = metadata::resolve_model_info(&element, &element.join("pred")).unwrap();
    assert_eq!(info, ModelInfo::default());
    assert_eq!(metadata::qualified_model_id(None, 3), "unknown_3");
    assert_eq!(metadata::qualified_model_id(Some("modelA"), 1), "modelA_1");
}

#[test]
fn malformed_unique_metadata_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let pred = tmp.path().join("pred");
    write(&pred.join("seg_info.json"), "{not json");
    assert!(metadata::pred_infos(&pred).is_err());
}
