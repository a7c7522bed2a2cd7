use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use seg_eval::cli::{CheckDimsArgs, Cli, Commands, DiceArgs};
use seg_eval::ctx::Ctx;
use seg_eval::dims::{self, DimsConfig};
use seg_eval::io;
use seg_eval::pipeline::Pipeline;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Dice(args) => run_dice(args)?,
        Commands::CheckDims(args) => run_check_dims(args)?,
    }

    Ok(())
}

fn run_dice(args: DiceArgs) -> Result<()> {
    let mut ctx = Ctx::new(
        args.location.workflow_dir,
        &args.location.run_id,
        &args.location.batch_name,
        &args.operator_in_dir,
        &args.gt_dir,
        &args.operator_out_dir,
    );
    ctx.cohort_dir = args.cohort_dir;
    ctx.ensemble_dir = args.ensemble_dir;
    ctx.anonymize = !args.no_anonymize;
    ctx.empty_score = args.empty_score;
    ctx.write_plot = !args.no_plot;

    Pipeline::dice().run(&mut ctx)?;

    print_summary(&ctx)
}

fn print_summary(ctx: &Ctx) -> Result<()> {
    let summary = io::summary::format_summary(ctx)?;
    print!("{}", summary);
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn run_check_dims(args: CheckDimsArgs) -> Result<()> {
    let run_dir = args.location.workflow_dir.join(&args.location.run_id);
    let mut cfg = DimsConfig::new(run_dir, &args.location.batch_name, args.input_dirs);
    cfg.parallel_checks = args.parallel_checks;
    cfg.abort_on_error = args.abort_on_error;
    cfg.move_data = !args.no_move;
    cfg.issue_dir = args.issue_dir;
    cfg.check_labels = !args.skip_label_check;

    let summary = dims::run(&cfg)?;
    println!("checked: {}", summary.checked);
    println!("inconsistent: {}", summary.failed.len());
    for moved in &summary.moved {
        println!("- moved {}", moved.display());
    }
    Ok(())
}
