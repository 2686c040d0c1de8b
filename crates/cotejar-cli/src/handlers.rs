//! Subcommand handlers

use crate::commands::{AnalyzeArgs, CompareArgs, JoinArgs};
use crate::config::Verbosity;
use crate::error::{CliError, CliResult};
use cotejar::{
    best_of, rmse_ratio, AggregateReport, AnalysisRunner, CropReport, FolderJob, Image,
    MetricCalculator, MetricKind,
};
use tracing::warn;

/// Resolve metric names to kinds; an empty list means all five
fn parse_metrics(names: &[String]) -> CliResult<Vec<MetricKind>> {
    if names.is_empty() {
        return Ok(MetricKind::ALL.to_vec());
    }
    names
        .iter()
        .map(|name| {
            MetricKind::from_name(&name.to_uppercase())
                .ok_or_else(|| CliError::invalid_argument(format!("unknown metric '{name}'")))
        })
        .collect()
}

/// `cotejador analyze`: run the per-crop pipeline over data folder roots
pub fn run_analyze(args: &AnalyzeArgs, verbosity: Verbosity) -> CliResult<()> {
    if args.jobs > 0 {
        // ignored when a global pool already exists (e.g. under test)
        let _ = rayon::ThreadPoolBuilder::new()
            .num_threads(args.jobs)
            .build_global();
    }
    let calculator = MetricCalculator::with_metrics(parse_metrics(&args.metrics)?);
    let mut runner = AnalysisRunner::new().with_calculator(calculator);
    if args.sequential {
        runner = runner.sequential();
    }
    #[cfg(feature = "render")]
    if args.no_render {
        runner = runner.without_rendering();
    }

    let jobs: Vec<FolderJob> = args
        .folders
        .iter()
        .map(|root| {
            let mut job = FolderJob::from_root(root);
            job.output_dir = root.join(&args.output);
            job
        })
        .collect();
    let summaries = runner.run_folders(&jobs);

    let mut failed_folders = 0_usize;
    for summary in &summaries {
        if summary.crops_processed == 0 && !summary.errors.is_empty() {
            failed_folders += 1;
        }
        if !verbosity.is_quiet() {
            println!(
                "{}: {} crop(s) processed, {} skipped",
                summary.folder, summary.crops_processed, summary.crops_skipped
            );
            for failure in &summary.errors {
                println!("  crop {}: {}", failure.crop, failure.message);
            }
        }
        if verbosity.is_verbose() {
            for crop in 1..=summary.crops_processed + summary.crops_skipped {
                let path = jobs
                    .iter()
                    .find(|j| j.name == summary.folder)
                    .map(|j| j.output_dir.join(format!("crop_{crop}_metrics.json")));
                if let Some(path) = path.filter(|p| p.is_file()) {
                    if let Ok(report) = CropReport::load(&path) {
                        println!("{}", report.summary());
                    }
                }
            }
        }
    }
    if failed_folders == summaries.len() && !summaries.is_empty() {
        return Err(CliError::invalid_argument(
            "no folder produced any crop report",
        ));
    }
    Ok(())
}

/// `cotejador join`: aggregate persisted crop reports into the CSV
pub fn run_join(args: &JoinArgs, verbosity: Verbosity) -> CliResult<()> {
    let report = AggregateReport::from_folders(&args.folders);
    if report.is_empty() {
        warn!("no crop reports found in any folder");
    }
    report.write_csv(&args.output)?;
    if !verbosity.is_quiet() {
        println!(
            "{} row(s) written to {}",
            report.rows().len(),
            args.output.display()
        );
    }
    Ok(())
}

/// `cotejador compare`: metrics of one target against one or more references
pub fn run_compare(args: &CompareArgs, verbosity: Verbosity) -> CliResult<()> {
    let metrics = parse_metrics(&args.metrics)?;
    let calculator = MetricCalculator::with_metrics(metrics.clone());

    let target = Image::load(&args.target)?;
    let references = args
        .references
        .iter()
        .map(Image::load)
        .collect::<Result<Vec<_>, _>>()?;

    for (reference, path) in references.iter().zip(&args.references) {
        if !verbosity.is_quiet() && references.len() > 1 {
            println!("\nvs {}:", path.display());
        }
        for metric in &metrics {
            let value = calculator.compare(*metric, &target, reference)?;
            println!("{} ({}): {value:.4}", metric.name(), metric.indicator());
        }
    }

    if references.len() > 1 {
        println!();
        for metric in &metrics {
            let value = best_of(&calculator, *metric, &target, &references)?;
            println!("Best {}: {value:.4}", metric.name());
        }
        let ratio = rmse_ratio(&calculator, &target, &references)?;
        println!("R metric: {ratio:.4}");
    }
    Ok(())
}
