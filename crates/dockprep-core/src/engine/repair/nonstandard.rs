use super::{RepairContext, RepairOutcome};
use crate::core::models::structure::StructureRecord;
use crate::engine::error::PrepError;
use crate::engine::findings::nonstandard_findings;
use tracing::info;

/// Swaps known non-standard residues for their standard parents and rebuilds their side chains.
///
/// Residues are reclassified as polymer, renamed, and pruned to N, CA, C and O. The completion
/// engine (or, without one, the repair engine's atom completion) then rebuilds the side chains
/// under the new identity.
pub(super) fn apply(
    structure: StructureRecord,
    context: &mut RepairContext,
) -> Result<RepairOutcome, PrepError> {
    let adapter = &mut context.adapter;
    adapter.load(structure);

    let found = adapter.find_nonstandard_residues()?;
    if found.is_empty() {
        info!("No non-standard residues found.");
        return Ok(RepairOutcome::unchanged(adapter.unload()?));
    }
    for residue in &found {
        info!(
            "Replacing non-standard residue {} {} with {}",
            residue.name, residue.residue, residue.replacement
        );
    }
    let findings = nonstandard_findings(&found);

    adapter.replace_nonstandard_residues()?;

    let structure = match &context.completion {
        Some(engine) => {
            let pruned = adapter.unload()?;
            info!("Rebuilding replaced residues with {}", engine.name());
            engine.complete(&pruned)?
        }
        None => {
            info!("Rebuilding replaced residues with {}", adapter.engine_name());
            adapter.add_missing_atoms()?;
            adapter.unload()?
        }
    };

    Ok(RepairOutcome {
        structure,
        findings,
    })
}
