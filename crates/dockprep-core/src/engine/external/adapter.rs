use super::detect::{AtomNames, NonStandardResidue, ResidueGap};
use super::error::EngineError;
use super::{EngineState, RepairEngine};
use crate::core::models::structure::StructureRecord;
use std::collections::BTreeMap;

/// The only caller of a [`RepairEngine`].
///
/// Every mutation is preceded by the bookkeeping the engine needs: atom completion requires
/// all entries present, and the entries a step must not act on are seeded empty.
pub struct RepairAdapter {
    engine: Box<dyn RepairEngine>,
}

impl RepairAdapter {
    pub fn new(engine: Box<dyn RepairEngine>) -> Self {
        Self { engine }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn load(&mut self, structure: StructureRecord) {
        self.engine.load(structure);
    }

    pub fn unload(&mut self) -> Result<StructureRecord, EngineError> {
        self.engine.unload().ok_or(EngineError::NoStructure)
    }

    pub fn structure(&self) -> Option<&StructureRecord> {
        self.engine.structure()
    }

    pub fn find_nonstandard_residues(&mut self) -> Result<Vec<NonStandardResidue>, EngineError> {
        self.engine.find_nonstandard_residues()?;
        Ok(self
            .engine
            .state()
            .nonstandard_residues
            .clone()
            .unwrap_or_default())
    }

    /// Returns `(missing_atoms, missing_terminals)`.
    pub fn find_missing_atoms(&mut self) -> Result<(AtomNames, AtomNames), EngineError> {
        self.engine.find_missing_atoms()?;
        let state = self.engine.state();
        Ok((
            state.missing_atoms.clone().unwrap_or_default(),
            state.missing_terminals.clone().unwrap_or_default(),
        ))
    }

    pub fn find_missing_residues(&mut self) -> Result<Vec<ResidueGap>, EngineError> {
        self.engine.find_missing_residues()?;
        Ok(self
            .engine
            .state()
            .missing_residues
            .clone()
            .unwrap_or_default())
    }

    /// Renames and prunes the non-standard residues found by the last detection.
    pub fn replace_nonstandard_residues(&mut self) -> Result<(), EngineError> {
        if self.engine.state().nonstandard_residues.is_none() {
            self.engine.find_nonstandard_residues()?;
        }
        self.engine.replace_nonstandard_residues()
    }

    /// Completes missing heavy atoms and terminals only; residue gaps are left alone.
    pub fn add_missing_atoms(&mut self) -> Result<(), EngineError> {
        let state = self.engine.state();
        if state.missing_atoms.is_none() || state.missing_terminals.is_none() {
            self.engine.find_missing_atoms()?;
        }
        self.engine.state_mut().missing_residues = Some(Vec::new());
        self.complete()
    }

    /// Builds the missing residues only; atoms missing from observed residues are left alone.
    pub fn add_missing_residues(&mut self) -> Result<(), EngineError> {
        if self.engine.state().missing_residues.is_none() {
            self.engine.find_missing_residues()?;
        }
        let state = self.engine.state_mut();
        state.missing_atoms = Some(BTreeMap::new());
        state.missing_terminals = Some(BTreeMap::new());
        self.complete()
    }

    pub fn add_missing_hydrogens(&mut self, ph: f64) -> Result<(), EngineError> {
        self.engine.add_missing_hydrogens(ph)?;
        *self.engine.state_mut() = EngineState::default();
        Ok(())
    }

    fn complete(&mut self) -> Result<(), EngineError> {
        self.engine
            .state()
            .require_completion_state("add_missing_atoms")?;
        self.engine.add_missing_atoms()?;
        *self.engine.state_mut() = EngineState::default();
        Ok(())
    }
}
