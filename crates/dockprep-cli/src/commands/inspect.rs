use crate::cli::InspectArgs;
use crate::config::builder::build_inspect_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use dockprep::engine::findings::write_csv_to_path;
use dockprep::engine::progress::ProgressReporter;
use dockprep::workflows;
use tracing::info;

pub fn run(args: InspectArgs, progress: &CliProgressHandler) -> Result<()> {
    let config = build_inspect_config(&args)?;
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    info!("Invoking the core inspect workflow...");
    let report = workflows::inspect::run(
        &config.input_path,
        config.selection,
        &config.substitutions,
        &reporter,
    )?;

    println!(
        "{}: model {}, {} atoms in {} residues, {} disorder group(s), {} parse warning(s).",
        config.input_path.display(),
        config.selection.model_id,
        report.atom_count,
        report.residue_count,
        report.disorder_groups,
        report.parse_warnings
    );
    super::print_findings(&report.findings);

    if let Some(report_path) = &config.report_path {
        write_csv_to_path(report_path, &report.findings)?;
        println!("Findings written to: {}", report_path.display());
    }
    Ok(())
}
