use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use nifti::writer::WriterOptions;
use seg_eval::ctx::Ctx;
use seg_eval::error::EvalError;
use seg_eval::io::summary::format_summary;
use seg_eval::pipeline::Pipeline;
use seg_eval::scores::ENSEMBLE_MODEL_ID;
use tempfile::TempDir;

fn write_seg(path: &Path, voxels: &[([usize; 3], u8)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut data = Array3::<u8>::zeros((4, 4, 2));
    for (idx, v) in voxels {
        data[*idx] = *v;
    }
    WriterOptions::new(path).write_nifti(&data).unwrap();
}

fn ctx_for(wf: &Path) -> Ctx {
    let mut ctx = Ctx::new(wf.to_path_buf(), "run1", "batch", "pred", "gt", "dice-eval");
    ctx.write_plot = false;
    ctx
}

/// Two unlabeled models, two cases each, plus an ensemble dir covering both.
fn write_run(wf: &Path) -> PathBuf {
    let run = wf.join("run1");
    for case in ["c1", "c2"] {
        let file = format!("{case}.nii.gz");
        write_seg(
            &run.join("nnunet-cohort").join(case).join("gt").join(&file),
            &[([0, 0, 0], 1), ([2, 2, 1], 2)],
        );
        for model in ["m1", "m2"] {
            write_seg(
                &run.join("batch").join(model).join("pred").join(&file),
                &[([0, 0, 0], 1), ([2, 2, 1], 2)],
            );
        }
        write_seg(
            &run.join("ens").join(&file),
            &[([0, 0, 0], 1), ([3, 3, 1], 2)],
        );
    }
    run
}

#[test]
fn ensemble_scored_once_per_case_and_label() {
    let wf = TempDir::new().unwrap();
    write_run(wf.path());

    let mut ctx = ctx_for(wf.path());
    ctx.ensemble_dir = Some(PathBuf::from("ens"));
    Pipeline::dice().run(&mut ctx).unwrap();

    assert_eq!(ctx.models.len(), 2);
    assert_eq!(ctx.models[0].model_id, "unknown_1");
    assert_eq!(ctx.models[1].model_id, "unknown_2");
    assert_eq!(ctx.evaluation.processed_files, 4);

    let ensemble: Vec<_> = ctx
        .evaluation
        .records()
        .iter()
        .filter(|r| r.model_id == ENSEMBLE_MODEL_ID)
        .collect();
    // two cases x labels "1" and "2"
    assert_eq!(ensemble.len(), 4);
    assert_eq!(ctx.evaluation.len(), 12);

    let tables = ctx.tables.as_ref().unwrap();
    assert_eq!(tables.case_cells(), 12);
    assert_eq!(tables.model_cells(), 12);
    let ens = &tables.model_based[ENSEMBLE_MODEL_ID];
    assert_eq!(ens["1"]["case_1"].0, 1.0);
    assert_eq!(ens["2"]["case_2"].0, 0.0);

    assert!(ctx.output.case_json_path.is_file());
    assert!(ctx.output.model_json_path.is_file());
    assert!(!ctx.output.plot_png_path.exists());
    assert!(!ctx.output.plot_pdf_path.exists());
}

#[test]
fn ensemble_labels_named_by_a_later_model_are_scored() {
    let wf = TempDir::new().unwrap();
    let run = wf.path().join("run1");
    let voxels = [([0, 0, 0], 1), ([2, 2, 1], 2)];
    write_seg(
        &run.join("nnunet-cohort").join("c1").join("gt").join("c1.nii.gz"),
        &voxels,
    );
    write_seg(&run.join("ens").join("c1.nii.gz"), &voxels);
    let seg_infos = [
        ("m1", r#"{"task_id": "A", "seg_info": [{"label_int": 1, "label_name": "liver"}]}"#),
        (
            "m2",
            r#"{"task_id": "B", "seg_info": [
                {"label_int": 1, "label_name": "liver"},
                {"label_int": 2, "label_name": "tumor"}
            ]}"#,
        ),
    ];
    for (model, seg_info) in seg_infos {
        let pred = run.join("batch").join(model).join("pred");
        write_seg(&pred.join("c1.nii.gz"), &[([0, 0, 0], 1)]);
        fs::write(pred.join("seg_info.json"), seg_info).unwrap();
    }

    let mut ctx = ctx_for(wf.path());
    ctx.ensemble_dir = Some(PathBuf::from("ens"));
    Pipeline::dice().run(&mut ctx).unwrap();

    let mut ensemble: Vec<&str> = ctx
        .evaluation
        .records()
        .iter()
        .filter(|r| r.model_id == ENSEMBLE_MODEL_ID)
        .map(|r| r.label.as_str())
        .collect();
    ensemble.sort();
    assert_eq!(ensemble, vec!["liver", "tumor"]);
    assert_eq!(ctx.evaluation.len(), 4);

    let tables = ctx.tables.as_ref().unwrap();
    assert_eq!(tables.case_based["case_1"]["tumor"][ENSEMBLE_MODEL_ID].0, 1.0);
    assert_eq!(tables.model_based[ENSEMBLE_MODEL_ID]["liver"]["case_1"].0, 1.0);
}

#[test]
fn plot_written_as_png_and_pdf() {
    let wf = TempDir::new().unwrap();
    write_run(wf.path());

    let mut ctx = ctx_for(wf.path());
    ctx.write_plot = true;
    Pipeline::dice().run(&mut ctx).unwrap();

    let png = fs::read(&ctx.output.plot_png_path).unwrap();
    assert!(png.starts_with(b"\x89PNG"));
    let pdf = fs::read(&ctx.output.plot_pdf_path).unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert!(ctx.output.plot_png_path.ends_with("dice-eval/dice_results.png"));
    assert!(ctx.output.plot_pdf_path.ends_with("dice-eval/dice_results.pdf"));
}

#[test]
fn missing_ensemble_prediction_is_fatal() {
    let wf = TempDir::new().unwrap();
    let run = write_run(wf.path());
    fs::remove_file(run.join("ens").join("c2.nii.gz")).unwrap();

    let mut ctx = ctx_for(wf.path());
    ctx.ensemble_dir = Some(PathBuf::from("ens"));
    let err = Pipeline::dice().run(&mut ctx).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<EvalError>(),
        Some(EvalError::MissingEnsemblePrediction(_))
    ));
    assert!(!ctx.output.case_json_path.exists());
}

#[test]
fn label_missing_from_ground_truth_scores_zero() {
    let wf = TempDir::new().unwrap();
    let run = wf.path().join("run1");
    write_seg(&run.join("nnunet-cohort").join("c1").join("gt").join("c1.nii"), &[]);
    write_seg(
        &run.join("batch").join("m1").join("pred").join("c1.nii"),
        &[([1, 1, 1], 3)],
    );

    let mut ctx = ctx_for(wf.path());
    ctx.anonymize = false;
    Pipeline::dice().run(&mut ctx).unwrap();

    let records = ctx.evaluation.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].file_id, "c1");
    assert_eq!(records[0].label, "3");
    assert_eq!(records[0].score.0, 0.0);
}

#[test]
fn summary_lists_models_with_ensemble_last() {
    let wf = TempDir::new().unwrap();
    write_run(wf.path());

    let mut ctx = ctx_for(wf.path());
    ctx.ensemble_dir = Some(PathBuf::from("ens"));
    Pipeline::dice().run(&mut ctx).unwrap();

    let summary = format_summary(&ctx).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert!(lines[0].starts_with("seg-eval v"));
    assert_eq!(
        lines[1],
        "Run: run1, models=2, processed files=4, scores=12"
    );
    assert!(lines[2].starts_with("unknown_1: n=4 mean=1.0000"));
    assert!(lines[3].starts_with("unknown_2: n=4"));
    assert!(lines[4].starts_with("ensemble: n=4 mean=0.5000 median=0.5000"));
}
