use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "seg-eval",
    version,
    about = "Segmentation evaluation for imaging pipeline runs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Score predictions against ground truth with the Dice coefficient
    Dice(DiceArgs),
    /// Compare volume dimensions across operator outputs of each batch element
    CheckDims(CheckDimsArgs),
}

#[derive(Debug, Args)]
pub struct RunLocation {
    #[arg(long, env = "WORKFLOW_DIR", help = "Workflow root directory")]
    pub workflow_dir: PathBuf,

    #[arg(
        long,
        env = "RUN_ID",
        help = "Run identifier (sub-directory of the workflow root)"
    )]
    pub run_id: String,

    #[arg(long, env = "BATCH_NAME", default_value = "batch")]
    pub batch_name: String,
}

#[derive(Debug, Args)]
pub struct DiceArgs {
    #[command(flatten)]
    pub location: RunLocation,

    #[arg(long, help = "Prediction dir inside each batch element")]
    pub operator_in_dir: String,

    #[arg(long, help = "Ground-truth dir inside each cohort case")]
    pub gt_dir: String,

    #[arg(long, default_value = "nnunet-cohort")]
    pub cohort_dir: String,

    #[arg(long, help = "Ensemble prediction dir, relative to the run dir")]
    pub ensemble_dir: Option<PathBuf>,

    #[arg(
        long,
        default_value = "dice-eval",
        help = "Result dir, relative to the run dir"
    )]
    pub operator_out_dir: String,

    #[arg(long, default_value_t = false, help = "Keep raw case ids in the results")]
    pub no_anonymize: bool,

    #[arg(
        long,
        default_value_t = 1.0,
        help = "Score for a label absent from both volumes"
    )]
    pub empty_score: f64,

    #[arg(long, default_value_t = false)]
    pub no_plot: bool,
}

#[derive(Debug, Args)]
pub struct CheckDimsArgs {
    #[command(flatten)]
    pub location: RunLocation,

    #[arg(
        long = "input-dir",
        required = true,
        help = "Operator output dir inside each batch element (repeatable, compared in order)"
    )]
    pub input_dirs: Vec<String>,

    #[arg(long, default_value_t = 3, help = "Number of concurrent probes")]
    pub parallel_checks: usize,

    #[arg(
        long,
        default_value_t = false,
        help = "Exit nonzero on the first inconsistent element (with --no-move)"
    )]
    pub abort_on_error: bool,

    #[arg(long, default_value_t = false, help = "Leave inconsistent elements in place")]
    pub no_move: bool,

    #[arg(
        long,
        default_value = "dimension_issue",
        help = "Quarantine dir, relative to the run dir"
    )]
    pub issue_dir: String,

    #[arg(long, default_value_t = false, help = "Accept NIfTI volumes without any label")]
    pub skip_label_check: bool,
}
