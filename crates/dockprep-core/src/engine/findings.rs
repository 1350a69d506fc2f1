use super::external::detect::{AtomNames, NonStandardResidue, ResidueGap};
use crate::core::models::structure::{ResidueKey, StructureRecord};
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    NonStandardResidue,
    MissingHeavyAtom,
    MissingTerminalAtom,
    MissingResidue,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NonStandardResidue => "non-standard-residue",
            Self::MissingHeavyAtom => "missing-heavy-atom",
            Self::MissingTerminalAtom => "missing-terminal-atom",
            Self::MissingResidue => "missing-residue",
        };
        f.write_str(text)
    }
}

/// One problem detected by inspecting a structure before a repair step mutates it.
///
/// Findings are reported, never acted upon beyond deciding whether a step has anything to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFinding {
    pub kind: FindingKind,
    pub chain: char,
    /// Residue number with insertion code; for missing residues, the position in the sequence.
    pub residue: String,
    pub residue_name: String,
    /// Atom name, substitution target or gap description, depending on `kind`.
    pub detail: String,
}

impl RepairFinding {
    pub fn new(
        kind: FindingKind,
        key: ResidueKey,
        residue_name: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            chain: key.chain,
            residue: key.number.to_string(),
            residue_name: residue_name.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RepairFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} {} ({})",
            self.kind, self.chain, self.residue, self.residue_name, self.detail
        )
    }
}

pub fn nonstandard_findings(found: &[NonStandardResidue]) -> Vec<RepairFinding> {
    found
        .iter()
        .map(|r| {
            RepairFinding::new(
                FindingKind::NonStandardResidue,
                r.residue,
                &r.name,
                &r.replacement,
            )
        })
        .collect()
}

/// One finding per missing atom; `kind` is either missing-heavy-atom or missing-terminal-atom.
pub fn missing_atom_findings(
    structure: &StructureRecord,
    kind: FindingKind,
    missing: &AtomNames,
) -> Vec<RepairFinding> {
    let mut findings = Vec::new();
    for (key, names) in missing {
        let residue_name = structure
            .find_residue_by_key(key)
            .and_then(|id| structure.residue(id))
            .map(|r| r.name.clone())
            .unwrap_or_default();
        findings.extend(
            names
                .iter()
                .map(|atom| RepairFinding::new(kind, *key, &residue_name, atom)),
        );
    }
    findings
}

/// One finding per missing residue, numbered by SEQRES position.
pub fn missing_residue_findings(gaps: &[ResidueGap]) -> Vec<RepairFinding> {
    let mut findings = Vec::new();
    for gap in gaps {
        let (first, _) = gap.seqres_range();
        findings.extend(gap.names.iter().enumerate().map(|(offset, name)| RepairFinding {
            kind: FindingKind::MissingResidue,
            chain: gap.chain,
            residue: (first + offset).to_string(),
            residue_name: name.clone(),
            detail: format!("SEQRES position, {}", gap.placement()),
        }));
    }
    findings
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("CSV writing error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

/// Writes findings as CSV with a header row.
pub fn write_csv<W: Write>(writer: W, findings: &[RepairFinding]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for finding in findings {
        csv_writer.serialize(finding)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_to_path(path: &Path, findings: &[RepairFinding]) -> Result<(), ReportError> {
    let display = path.to_string_lossy().to_string();
    let file = std::fs::File::create(path).map_err(|e| ReportError::Io {
        path: display.clone(),
        source: e,
    })?;
    write_csv(file, findings).map_err(|e| ReportError::Csv {
        path: display,
        source: e,
    })
}
