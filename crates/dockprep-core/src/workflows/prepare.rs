use super::session::Receptor;
use crate::core::io::format::StructureFormat;
use crate::engine::config::PrepareConfig;
use crate::engine::error::PrepError;
use crate::engine::findings::RepairFinding;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::repair::{RepairContext, RepairOperation};
use crate::engine::sanitizer::Sanitizer;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct PrepareSummary {
    pub output_path: PathBuf,
    pub atom_count: usize,
    pub residue_count: usize,
    pub parse_warnings: usize,
    pub disorder_groups: usize,
    pub operations_applied: Vec<RepairOperation>,
    pub findings: Vec<RepairFinding>,
}

/// Sanitizes the configured input, applies the repair plan in order and writes the result.
///
/// Nothing is written unless every stage succeeds.
#[instrument(skip_all, name = "prepare_workflow")]
pub fn run(
    config: &PrepareConfig,
    context: &mut RepairContext,
    reporter: &ProgressReporter,
) -> Result<PrepareSummary, PrepError> {
    // Fail on an unwritable output format before any work is done.
    StructureFormat::from_path(&config.output_path)?;

    let mut receptor = Receptor::open(&config.input_path)?;

    // === Phase 1: Sanitize ===
    let sanitizer = Sanitizer::new(config.selection);
    let report = reporter.phase("Sanitizing", || receptor.sanitize(&sanitizer))?;
    info!(
        "Sanitized '{}': model {}, {} disorder group(s) resolved, {} parse warning(s).",
        receptor.name(),
        config.selection.model_id,
        report.disorder_groups,
        report.parse_warnings
    );

    // === Phase 2: Repair ===
    let operations = config.plan.operations();
    let findings = reporter.phase("Repairing", || -> Result<_, PrepError> {
        let mut findings = Vec::new();
        reporter.report(Progress::TaskStart {
            total_steps: operations.len() as u64,
        });
        for operation in operations {
            reporter.report(Progress::Message(operation.to_string()));
            info!("Applying repair step: {}", operation);
            let step = receptor.repair(operation, context)?;
            info!("{} finding(s) for '{}'.", step.len(), operation);
            findings.extend(step);
            reporter.report(Progress::TaskIncrement);
        }
        reporter.report(Progress::TaskFinish);
        Ok(findings)
    })?;

    // === Phase 3: Write ===
    let structure = receptor.snapshot()?;
    reporter.phase("Writing", || receptor.write(&config.output_path))?;

    let summary = PrepareSummary {
        output_path: config.output_path.clone(),
        atom_count: structure.atom_count(),
        residue_count: structure.residue_count(),
        parse_warnings: report.parse_warnings,
        disorder_groups: report.disorder_groups,
        operations_applied: operations.to_vec(),
        findings,
    };
    info!(
        "Workflow complete: {} atoms in {} residues written to '{}'.",
        summary.atom_count,
        summary.residue_count,
        summary.output_path.display()
    );
    Ok(summary)
}
