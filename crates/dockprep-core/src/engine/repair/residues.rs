use super::{RepairContext, RepairOutcome};
use crate::core::models::structure::StructureRecord;
use crate::engine::error::PrepError;
use crate::engine::findings::missing_residue_findings;
use tracing::info;

pub(super) fn apply(
    structure: StructureRecord,
    context: &mut RepairContext,
) -> Result<RepairOutcome, PrepError> {
    let adapter = &mut context.adapter;
    adapter.load(structure);

    let gaps = adapter.find_missing_residues()?;
    if gaps.is_empty() {
        info!("No missing residues found (no gaps, or no SEQRES records).");
        return Ok(RepairOutcome::unchanged(adapter.unload()?));
    }

    for gap in &gaps {
        let (first, last) = gap.seqres_range();
        info!(
            "Chain {}: missing SEQRES residues {}-{} ({}) {}",
            gap.chain,
            first,
            last,
            gap.names.join(" "),
            gap.placement()
        );
    }
    let findings = missing_residue_findings(&gaps);

    adapter.add_missing_residues()?;
    Ok(RepairOutcome {
        structure: adapter.unload()?,
        findings,
    })
}
