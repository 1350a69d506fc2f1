use super::{RepairContext, RepairOutcome};
use crate::core::models::structure::StructureRecord;
use crate::engine::error::PrepError;
use tracing::info;

/// Protonates at `ph`. Existing hydrogens are removed first so the result depends only on
/// this run.
pub(super) fn apply(
    mut structure: StructureRecord,
    ph: f64,
    context: &mut RepairContext,
) -> Result<RepairOutcome, PrepError> {
    let stripped = structure.strip_hydrogens();
    if stripped > 0 {
        info!("Removed {} existing hydrogens before protonation", stripped);
    }

    info!("Adding hydrogens at pH {}", ph);
    let adapter = &mut context.adapter;
    adapter.load(structure);
    adapter.add_missing_hydrogens(ph)?;
    Ok(RepairOutcome::unchanged(adapter.unload()?))
}
