use crate::cli::PrepareArgs;
use crate::config::builder::build_prepare_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use dockprep::engine::findings::write_csv_to_path;
use dockprep::engine::progress::ProgressReporter;
use dockprep::engine::repair::RepairContext;
use dockprep::workflows;
use tracing::info;

pub fn run(args: PrepareArgs, progress: &CliProgressHandler) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let app_config = build_prepare_config(&args)?;
    let config = &app_config.core_config;

    let mut context = RepairContext::from_config(&config.engines);
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    println!(
        "Preparing receptor {} ({} repair step(s))...",
        config.input_path.display(),
        config.plan.len()
    );
    info!("Invoking the core prepare workflow...");
    let summary = workflows::prepare::run(config, &mut context, &reporter)?;

    super::print_findings(&summary.findings);
    if let Some(report_path) = &app_config.report_path {
        write_csv_to_path(report_path, &summary.findings)?;
        println!("Findings written to: {}", report_path.display());
    }

    println!(
        "✓ Prepared receptor ({} atoms, {} residues) written to: {}",
        summary.atom_count,
        summary.residue_count,
        summary.output_path.display()
    );
    Ok(())
}
