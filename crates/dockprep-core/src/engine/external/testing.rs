//! Deterministic in-process engines for tests.

use super::error::EngineError;
use super::{CompletionEngine, EngineState, RepairEngine, detect};
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::StructureFile;
use crate::core::models::atom::{Atom, infer_element};
use crate::core::models::residue::{HeteroFlag, ResidueNumber};
use crate::core::models::structure::{ResidueKey, StructureRecord};
use crate::core::residues::{SubstitutionTable, heavy_atoms};
use nalgebra::Point3;
use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

pub(crate) fn parse(text: &str) -> StructureRecord {
    PdbFile::read_from(&mut Cursor::new(text), "T")
        .unwrap()
        .structure
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EngineCall {
    Load,
    AddMissingAtoms(EngineState),
    AddMissingHydrogens(f64),
}

/// Repair engine that completes atoms and hydrogens without leaving the process.
///
/// Clones share the call log, so a test can keep one clone and box the other.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedEngine {
    calls: Rc<RefCell<Vec<EngineCall>>>,
    substitutions: SubstitutionTable,
    structure: Option<StructureRecord>,
    state: EngineState,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.calls.borrow().clone()
    }
}

impl RepairEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    fn load(&mut self, structure: StructureRecord) {
        self.calls.borrow_mut().push(EngineCall::Load);
        self.structure = Some(structure);
        self.state = EngineState::default();
    }

    fn unload(&mut self) -> Option<StructureRecord> {
        self.state = EngineState::default();
        self.structure.take()
    }

    fn structure(&self) -> Option<&StructureRecord> {
        self.structure.as_ref()
    }

    fn structure_mut(&mut self) -> Option<&mut StructureRecord> {
        self.structure.as_mut()
    }

    fn state(&self) -> &EngineState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EngineState {
        &mut self.state
    }

    fn add_missing_atoms(&mut self) -> Result<(), EngineError> {
        self.state.require_completion_state("add_missing_atoms")?;
        self.calls
            .borrow_mut()
            .push(EngineCall::AddMissingAtoms(self.state.clone()));
        let structure = self.structure.as_mut().ok_or(EngineError::NoStructure)?;
        complete_in_place(structure, &self.state);
        Ok(())
    }

    fn add_missing_hydrogens(&mut self, ph: f64) -> Result<(), EngineError> {
        self.calls
            .borrow_mut()
            .push(EngineCall::AddMissingHydrogens(ph));
        let structure = self.structure.as_mut().ok_or(EngineError::NoStructure)?;
        let mut serial = next_serial(structure);
        for residue_id in structure.residue_ids() {
            let mut names = vec!["H"];
            if ph < 6.0 {
                names.push("HX");
            }
            for name in names {
                let mut atom = Atom::new(serial, name, "H", Point3::origin());
                atom.b_factor = ph;
                structure.add_atom_to_residue(residue_id, atom);
                serial += 1;
            }
        }
        Ok(())
    }
}

/// Completion engine that records what it was given and fills in missing heavy atoms.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedCompletion {
    received: Rc<RefCell<Vec<StructureRecord>>>,
}

impl ScriptedCompletion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn received(&self) -> Vec<StructureRecord> {
        self.received.borrow().clone()
    }
}

impl CompletionEngine for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted-completion"
    }

    fn complete(&self, structure: &StructureRecord) -> Result<StructureRecord, EngineError> {
        self.received.borrow_mut().push(structure.clone());
        let mut completed = structure.clone();
        let (atoms, terminals) = detect::missing_atoms(&completed);
        let state = EngineState {
            missing_residues: Some(Vec::new()),
            missing_atoms: Some(atoms),
            missing_terminals: Some(terminals),
            ..Default::default()
        };
        complete_in_place(&mut completed, &state);
        Ok(completed)
    }
}

fn next_serial(structure: &StructureRecord) -> usize {
    structure
        .atom_ids()
        .into_iter()
        .filter_map(|id| structure.atom(id).map(|a| a.serial))
        .max()
        .unwrap_or(0)
        + 1
}

fn add_named_atoms(
    structure: &mut StructureRecord,
    key: &ResidueKey,
    names: &[String],
    serial: &mut usize,
) {
    let Some(residue_id) = structure.find_residue_by_key(key) else {
        return;
    };
    let anchor = structure
        .atoms_of(residue_id)
        .next()
        .map(|(_, atom)| atom.position)
        .unwrap_or_else(Point3::origin);
    for name in names {
        let atom = Atom::new(*serial, name, &infer_element(name), anchor);
        structure.add_atom_to_residue(residue_id, atom);
        *serial += 1;
    }
}

fn complete_in_place(structure: &mut StructureRecord, state: &EngineState) {
    let mut serial = next_serial(structure);

    for gap in state.missing_residues.iter().flatten() {
        let Some(model) = structure.find_model(0) else {
            continue;
        };
        let Some(chain_id) = structure.find_chain(model, gap.chain) else {
            continue;
        };
        let residues = structure
            .chain(chain_id)
            .map(|c| c.residues().to_vec())
            .unwrap_or_default();
        let mut index = gap
            .before
            .and_then(|key| structure.find_residue_by_key(&key))
            .and_then(|id| residues.iter().position(|&r| r == id))
            .unwrap_or(residues.len());
        for (offset, name) in gap.names.iter().enumerate() {
            let number = ResidueNumber::from((gap.seqres_start + offset + 1) as isize);
            let Some(residue_id) =
                structure.insert_residue(chain_id, index, number, name, HeteroFlag::Polymer)
            else {
                continue;
            };
            index += 1;
            for atom_name in heavy_atoms(name).unwrap_or_default() {
                let atom = Atom::new(serial, atom_name, &infer_element(atom_name), Point3::origin());
                structure.add_atom_to_residue(residue_id, atom);
                serial += 1;
            }
        }
    }

    for (key, names) in state.missing_atoms.iter().flatten() {
        add_named_atoms(structure, key, names, &mut serial);
    }
    for (key, names) in state.missing_terminals.iter().flatten() {
        add_named_atoms(structure, key, names, &mut serial);
    }
}
