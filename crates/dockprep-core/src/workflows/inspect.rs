use super::session::Receptor;
use crate::core::residues::SubstitutionTable;
use crate::engine::config::SelectionPolicy;
use crate::engine::error::PrepError;
use crate::engine::external::detect;
use crate::engine::findings::{
    FindingKind, RepairFinding, missing_atom_findings, missing_residue_findings,
    nonstandard_findings,
};
use crate::engine::progress::ProgressReporter;
use crate::engine::sanitizer::Sanitizer;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct InspectionReport {
    pub atom_count: usize,
    pub residue_count: usize,
    pub parse_warnings: usize,
    pub disorder_groups: usize,
    pub findings: Vec<RepairFinding>,
}

impl InspectionReport {
    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}

/// Sanitizes `input` and reports what each repair step would find, without repairing anything.
#[instrument(skip_all, name = "inspect_workflow")]
pub fn run(
    input: &Path,
    selection: SelectionPolicy,
    substitutions: &SubstitutionTable,
    reporter: &ProgressReporter,
) -> Result<InspectionReport, PrepError> {
    let mut receptor = Receptor::open(input)?;
    let report = reporter.phase("Sanitizing", || {
        receptor.sanitize(&Sanitizer::new(selection))
    })?;
    let structure = receptor.snapshot()?;

    let findings = reporter.phase("Inspecting", || {
        let mut findings = nonstandard_findings(&detect::nonstandard_residues(
            &structure,
            substitutions,
        ));
        let (atoms, terminals) = detect::missing_atoms(&structure);
        findings.extend(missing_atom_findings(
            &structure,
            FindingKind::MissingHeavyAtom,
            &atoms,
        ));
        findings.extend(missing_atom_findings(
            &structure,
            FindingKind::MissingTerminalAtom,
            &terminals,
        ));
        findings.extend(missing_residue_findings(&detect::missing_residues(
            &structure,
        )));
        findings
    });

    info!(
        "Inspected '{}': {} finding(s).",
        receptor.name(),
        findings.len()
    );
    Ok(InspectionReport {
        atom_count: structure.atom_count(),
        residue_count: structure.residue_count(),
        parse_warnings: report.parse_warnings,
        disorder_groups: report.disorder_groups,
        findings,
    })
}
