//! Boundary to the out-of-process structure repair and completion engines.
//!
//! Core logic never talks to an engine directly. [`RepairEngine`] implementations keep the
//! same stateful bookkeeping the repair tools expect ([`EngineState`]), and
//! [`adapter::RepairAdapter`] seeds that bookkeeping before every mutation.

pub mod adapter;
pub mod detect;
pub mod error;
pub mod handoff;
pub mod modeller;
pub mod pdbfixer;
pub mod process;
#[cfg(test)]
pub(crate) mod testing;

use self::detect::{AtomNames, NonStandardResidue, ResidueGap};
use self::error::EngineError;
use crate::core::models::structure::StructureRecord;
use crate::core::residues::SubstitutionTable;

/// Detection bookkeeping of a repair engine. `None` means the entry was never initialised.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub nonstandard_residues: Option<Vec<NonStandardResidue>>,
    pub missing_residues: Option<Vec<ResidueGap>>,
    pub missing_atoms: Option<AtomNames>,
    pub missing_terminals: Option<AtomNames>,
}

impl EngineState {
    /// Checks the entries atom completion reads.
    pub fn require_completion_state(&self, operation: &'static str) -> Result<(), EngineError> {
        let missing = if self.missing_residues.is_none() {
            Some("missing residues")
        } else if self.missing_atoms.is_none() {
            Some("missing atoms")
        } else if self.missing_terminals.is_none() {
            Some("missing terminals")
        } else {
            None
        };
        match missing {
            Some(field) => Err(EngineError::Precondition { operation, field }),
            None => Ok(()),
        }
    }
}

/// A stateful atom/residue repair engine holding one structure at a time.
///
/// Detection methods fill the engine's bookkeeping from the loaded structure; the default
/// implementations run in-process against the residue vocabulary. Mutations consume the
/// bookkeeping exactly as it stands, so callers must seed it first.
pub trait RepairEngine {
    fn name(&self) -> &str;

    fn substitutions(&self) -> &SubstitutionTable;

    /// Replaces the held structure and resets all bookkeeping to uninitialised.
    fn load(&mut self, structure: StructureRecord);

    fn unload(&mut self) -> Option<StructureRecord>;

    fn structure(&self) -> Option<&StructureRecord>;

    fn structure_mut(&mut self) -> Option<&mut StructureRecord>;

    fn state(&self) -> &EngineState;

    fn state_mut(&mut self) -> &mut EngineState;

    fn find_nonstandard_residues(&mut self) -> Result<(), EngineError> {
        let structure = self.structure().ok_or(EngineError::NoStructure)?;
        let found = detect::nonstandard_residues(structure, self.substitutions());
        self.state_mut().nonstandard_residues = Some(found);
        Ok(())
    }

    fn find_missing_residues(&mut self) -> Result<(), EngineError> {
        let structure = self.structure().ok_or(EngineError::NoStructure)?;
        let gaps = detect::missing_residues(structure);
        self.state_mut().missing_residues = Some(gaps);
        Ok(())
    }

    fn find_missing_atoms(&mut self) -> Result<(), EngineError> {
        let structure = self.structure().ok_or(EngineError::NoStructure)?;
        let (atoms, terminals) = detect::missing_atoms(structure);
        let state = self.state_mut();
        state.missing_atoms = Some(atoms);
        state.missing_terminals = Some(terminals);
        Ok(())
    }

    /// Renames every recorded non-standard residue to its standard parent and prunes it to the
    /// backbone, leaving the side chain for atom completion.
    fn replace_nonstandard_residues(&mut self) -> Result<(), EngineError> {
        let replacements = self
            .state()
            .nonstandard_residues
            .clone()
            .ok_or(EngineError::Precondition {
                operation: "replace_nonstandard_residues",
                field: "non-standard residues",
            })?;
        let structure = self.structure_mut().ok_or(EngineError::NoStructure)?;
        detect::apply_replacements(structure, &replacements);
        *self.state_mut() = EngineState::default();
        Ok(())
    }

    /// Adds the recorded missing residues, atoms and terminals.
    fn add_missing_atoms(&mut self) -> Result<(), EngineError>;

    /// (Re)places hydrogens on the whole structure at the given pH.
    fn add_missing_hydrogens(&mut self, ph: f64) -> Result<(), EngineError>;
}

/// A comparative-modeling engine that rebuilds a complete model from a partial one.
pub trait CompletionEngine {
    fn name(&self) -> &str;

    fn complete(&self, structure: &StructureRecord) -> Result<StructureRecord, EngineError>;
}
