use std::collections::HashMap;
use std::path::PathBuf;

use crate::input::CaseAnonymizer;
use crate::math::dice::DEFAULT_EMPTY_SCORE;
use crate::schema::v1::LabelMap;
use crate::scores::{Evaluation, ScoreTables};

pub const DEFAULT_COHORT_DIR: &str = "nnunet-cohort";
pub const DEFAULT_OPERATOR_OUT_DIR: &str = "dice-eval";

pub const CASE_JSON_FILE: &str = "results_case_based.json";
pub const MODEL_JSON_FILE: &str = "results_model_based.json";
pub const PLOT_PNG_FILE: &str = "dice_results.png";
pub const PLOT_PDF_FILE: &str = "dice_results.pdf";

/// One batch element, i.e. one model's predictions for the run.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub counter: usize,
    pub dir: PathBuf,
    pub pred_dir: PathBuf,
    pub model_id: String,
    pub labels: Option<LabelMap>,
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub case_json_path: PathBuf,
    pub model_json_path: PathBuf,
    pub plot_png_path: PathBuf,
    pub plot_pdf_path: PathBuf,
}

#[derive(Debug)]
pub struct Ctx {
    pub workflow_dir: PathBuf,
    pub run_id: String,
    pub run_dir: PathBuf,
    pub batch_name: String,
    pub operator_in_dir: String,
    pub gt_dir: String,
    pub cohort_dir: String,
    /// Relative to the run dir until stage0 resolves it.
    pub ensemble_dir: Option<PathBuf>,
    pub anonymize: bool,
    pub empty_score: f64,
    pub write_plot: bool,
    pub models: Vec<ModelRun>,
    pub anonymizer: CaseAnonymizer,
    pub evaluation: Evaluation,
    /// Labels present in each case's ensemble prediction, once loaded.
    pub ensemble_labels: HashMap<String, Vec<i64>>,
    pub tables: Option<ScoreTables>,
    pub warnings: Vec<String>,
    pub output: OutputPaths,
}

impl Ctx {
    pub fn new(
        workflow_dir: PathBuf,
        run_id: &str,
        batch_name: &str,
        operator_in_dir: &str,
        gt_dir: &str,
        operator_out_dir: &str,
    ) -> Self {
        let run_dir = workflow_dir.join(run_id);
        let out_dir = run_dir.join(operator_out_dir);
        Self {
            workflow_dir,
            run_id: run_id.to_string(),
            batch_name: batch_name.to_string(),
            operator_in_dir: operator_in_dir.to_string(),
            gt_dir: gt_dir.to_string(),
            cohort_dir: DEFAULT_COHORT_DIR.to_string(),
            ensemble_dir: None,
            anonymize: true,
            empty_score: DEFAULT_EMPTY_SCORE,
            write_plot: true,
            models: Vec::new(),
            anonymizer: CaseAnonymizer::new(),
            evaluation: Evaluation::new(),
            ensemble_labels: HashMap::new(),
            tables: None,
            warnings: Vec::new(),
            output: OutputPaths {
                case_json_path: out_dir.join(CASE_JSON_FILE),
                model_json_path: out_dir.join(MODEL_JSON_FILE),
                plot_png_path: out_dir.join(PLOT_PNG_FILE),
                plot_pdf_path: out_dir.join(PLOT_PDF_FILE),
                out_dir,
            },
            run_dir,
        }
    }

    pub fn batch_root(&self) -> PathBuf {
        self.run_dir.join(&self.batch_name)
    }
}
