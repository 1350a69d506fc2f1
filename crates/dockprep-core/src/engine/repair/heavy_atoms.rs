use super::{RepairContext, RepairOutcome};
use crate::core::models::structure::StructureRecord;
use crate::engine::error::PrepError;
use crate::engine::findings::{FindingKind, missing_atom_findings};
use tracing::info;

pub(super) fn apply(
    structure: StructureRecord,
    context: &mut RepairContext,
) -> Result<RepairOutcome, PrepError> {
    let adapter = &mut context.adapter;
    adapter.load(structure);

    let (atoms, terminals) = adapter.find_missing_atoms()?;
    if atoms.is_empty() && terminals.is_empty() {
        info!("No missing heavy atoms found.");
        return Ok(RepairOutcome::unchanged(adapter.unload()?));
    }

    let mut findings = Vec::new();
    if let Some(structure) = adapter.structure() {
        for (kind, missing) in [
            (FindingKind::MissingHeavyAtom, &atoms),
            (FindingKind::MissingTerminalAtom, &terminals),
        ] {
            for (key, names) in missing {
                info!("Missing atoms in {}: {}", key, names.join(", "));
            }
            findings.extend(missing_atom_findings(structure, kind, missing));
        }
    }

    adapter.add_missing_atoms()?;
    Ok(RepairOutcome {
        structure: adapter.unload()?,
        findings,
    })
}
