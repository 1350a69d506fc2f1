use super::atom::Atom;
use super::chain::Chain;
use super::ids::{AtomId, ChainId, ModelId, ResidueId};
use super::model::Model;
use super::residue::{HeteroFlag, Residue, ResidueNumber};
use slotmap::SlotMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Format-independent header information carried alongside the coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    /// Entry identifier (PDB ID or file stem).
    pub id: String,
    /// Full intended residue sequence per chain, as listed in SEQRES records.
    pub seqres: BTreeMap<char, Vec<String>>,
}

/// Addresses a residue independently of arena keys, so it survives a write/re-parse cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidueKey {
    pub chain: char,
    pub number: ResidueNumber,
}

impl ResidueKey {
    pub fn new(chain: char, number: impl Into<ResidueNumber>) -> Self {
        Self {
            chain,
            number: number.into(),
        }
    }
}

impl fmt::Display for ResidueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.chain, self.number)
    }
}

/// In-memory representation of a parsed macromolecular structure.
///
/// The record is a four-level tree (models → chains → residues → atoms) stored in slot-map
/// arenas. Children are kept in file order; lookup maps enforce that chains are unique per
/// model by identifier and residues are unique per chain by (sequence number, insertion code).
#[derive(Debug, Clone, Default)]
pub struct StructureRecord {
    /// Header data (entry id, SEQRES).
    pub header: Header,
    models: SlotMap<ModelId, Model>,
    model_order: Vec<ModelId>,
    chains: SlotMap<ChainId, Chain>,
    residues: SlotMap<ResidueId, Residue>,
    atoms: SlotMap<AtomId, Atom>,
    chain_key_map: HashMap<(ModelId, char), ChainId>,
    residue_key_map: HashMap<(ChainId, ResidueNumber), ResidueId>,
}

impl StructureRecord {
    /// Creates a new, empty structure with the given entry identifier.
    pub fn new(id: &str) -> Self {
        Self {
            header: Header {
                id: id.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id)
    }

    pub fn chain(&self, id: ChainId) -> Option<&Chain> {
        self.chains.get(id)
    }

    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id)
    }

    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.get(id)
    }

    /// Returns the models in file order.
    pub fn models_iter(&self) -> impl Iterator<Item = (ModelId, &Model)> {
        self.model_order
            .iter()
            .filter_map(|&id| self.models.get(id).map(|model| (id, model)))
    }

    /// Returns the positional ids of all models in file order.
    pub fn model_indices(&self) -> Vec<usize> {
        self.models_iter().map(|(_, model)| model.id).collect()
    }

    /// Finds a model by its zero-based positional id.
    pub fn find_model(&self, index: usize) -> Option<ModelId> {
        self.models_iter()
            .find(|(_, model)| model.id == index)
            .map(|(id, _)| id)
    }

    pub fn model_count(&self) -> usize {
        self.model_order.len()
    }

    /// Returns the chains of a model in file order.
    pub fn chains_of(&self, model_id: ModelId) -> impl Iterator<Item = (ChainId, &Chain)> {
        self.models
            .get(model_id)
            .map(|model| model.chains.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.chains.get(id).map(|chain| (id, chain)))
    }

    /// Returns the residues of a chain in file order.
    pub fn residues_of(&self, chain_id: ChainId) -> impl Iterator<Item = (ResidueId, &Residue)> {
        self.chains
            .get(chain_id)
            .map(|chain| chain.residues.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.residues.get(id).map(|residue| (id, residue)))
    }

    /// Returns the atoms of a residue in file order.
    pub fn atoms_of(&self, residue_id: ResidueId) -> impl Iterator<Item = (AtomId, &Atom)> {
        self.residues
            .get(residue_id)
            .map(|residue| residue.atoms.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&id| self.atoms.get(id).map(|atom| (id, atom)))
    }

    /// Walks every residue of the structure in file order.
    pub fn residue_ids(&self) -> Vec<ResidueId> {
        self.models_iter()
            .flat_map(|(model_id, _)| self.chains_of(model_id))
            .flat_map(|(chain_id, _)| self.residues_of(chain_id))
            .map(|(residue_id, _)| residue_id)
            .collect()
    }

    /// Walks every atom of the structure in file order.
    pub fn atom_ids(&self) -> Vec<AtomId> {
        self.residue_ids()
            .into_iter()
            .flat_map(|residue_id| self.atoms_of(residue_id).map(|(id, _)| id))
            .collect()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn find_chain(&self, model_id: ModelId, id: char) -> Option<ChainId> {
        self.chain_key_map.get(&(model_id, id)).copied()
    }

    pub fn find_residue(&self, chain_id: ChainId, number: ResidueNumber) -> Option<ResidueId> {
        self.residue_key_map.get(&(chain_id, number)).copied()
    }

    /// Resolves a [`ResidueKey`] against the first model of the structure.
    pub fn find_residue_by_key(&self, key: &ResidueKey) -> Option<ResidueId> {
        let (model_id, _) = self.models_iter().next()?;
        let chain_id = self.find_chain(model_id, key.chain)?;
        self.find_residue(chain_id, key.number)
    }

    /// Builds the model-independent key of a residue.
    pub fn residue_key(&self, residue_id: ResidueId) -> Option<ResidueKey> {
        let residue = self.residues.get(residue_id)?;
        let chain = self.chains.get(residue.chain_id)?;
        Some(ResidueKey::new(chain.id, residue.number))
    }

    /// Appends a new model and returns its ID; the positional id is the current model count.
    pub fn add_model(&mut self, serial: Option<isize>) -> ModelId {
        let model = Model::new(self.model_order.len(), serial);
        let id = self.models.insert(model);
        self.model_order.push(id);
        id
    }

    /// Adds a new chain to a model or returns the existing one with the same identifier.
    ///
    /// # Return
    ///
    /// Returns `Some(ChainId)` if successful, otherwise `None` (the model doesn't exist).
    pub fn add_chain(&mut self, model_id: ModelId, id: char) -> Option<ChainId> {
        let model = self.models.get_mut(model_id)?;
        let chain_id = *self
            .chain_key_map
            .entry((model_id, id))
            .or_insert_with(|| self.chains.insert(Chain::new(id, model_id)));
        if !model.chains.contains(&chain_id) {
            model.chains.push(chain_id);
        }
        Some(chain_id)
    }

    /// Appends a residue to a chain or returns the existing residue with the same number.
    ///
    /// # Return
    ///
    /// Returns `Some(ResidueId)` if successful, otherwise `None` (the chain doesn't exist).
    pub fn add_residue(
        &mut self,
        chain_id: ChainId,
        number: ResidueNumber,
        name: &str,
        hetero_flag: HeteroFlag,
    ) -> Option<ResidueId> {
        let len = self.chains.get(chain_id)?.residues.len();
        if let Some(existing) = self.find_residue(chain_id, number) {
            return Some(existing);
        }
        self.insert_residue(chain_id, len, number, name, hetero_flag)
    }

    /// Inserts a new residue at `index` within the chain's residue order.
    ///
    /// # Return
    ///
    /// Returns `None` if the chain doesn't exist or a residue with that number is already present.
    pub fn insert_residue(
        &mut self,
        chain_id: ChainId,
        index: usize,
        number: ResidueNumber,
        name: &str,
        hetero_flag: HeteroFlag,
    ) -> Option<ResidueId> {
        if self.residue_key_map.contains_key(&(chain_id, number)) {
            return None;
        }
        let chain = self.chains.get_mut(chain_id)?;
        let residue_id = self
            .residues
            .insert(Residue::new(number, name, hetero_flag, chain_id));
        let index = index.min(chain.residues.len());
        chain.residues.insert(index, residue_id);
        self.residue_key_map.insert((chain_id, number), residue_id);
        Some(residue_id)
    }

    /// Adds an atom to a residue.
    ///
    /// # Return
    ///
    /// Returns `Some(AtomId)` if successful, otherwise `None` (the residue doesn't exist).
    pub fn add_atom_to_residue(&mut self, residue_id: ResidueId, mut atom: Atom) -> Option<AtomId> {
        let residue = self.residues.get_mut(residue_id)?;
        atom.residue_id = residue_id;
        let atom_id = self.atoms.insert(atom);
        residue.add_atom(atom_id);
        Some(atom_id)
    }

    /// Removes an atom from the system and from its parent residue.
    pub fn remove_atom(&mut self, atom_id: AtomId) -> Option<Atom> {
        let atom = self.atoms.remove(atom_id)?;
        if let Some(residue) = self.residues.get_mut(atom.residue_id) {
            residue.remove_atom(atom_id);
        }
        Some(atom)
    }

    /// Removes a residue with all of its atoms, updating the parent chain and lookup maps.
    pub fn remove_residue(&mut self, residue_id: ResidueId) -> Option<Residue> {
        let residue = self.residues.remove(residue_id)?;
        for &atom_id in &residue.atoms {
            self.atoms.remove(atom_id);
        }
        if let Some(chain) = self.chains.get_mut(residue.chain_id) {
            chain.residues.retain(|&id| id != residue_id);
        }
        self.residue_key_map
            .remove(&(residue.chain_id, residue.number));
        Some(residue)
    }

    /// Removes every hydrogen (and deuterium) atom and returns how many were removed.
    pub fn strip_hydrogens(&mut self) -> usize {
        let hydrogens: Vec<AtomId> = self
            .atoms
            .iter()
            .filter(|(_, atom)| atom.is_hydrogen())
            .map(|(id, _)| id)
            .collect();
        for &atom_id in &hydrogens {
            self.remove_atom(atom_id);
        }
        hydrogens.len()
    }

    /// Reclassifies a residue as part of the polymer, so writers emit its atoms as `ATOM` records.
    pub fn retag_as_polymer(&mut self, residue_id: ResidueId) -> bool {
        match self.residues.get_mut(residue_id) {
            Some(residue) => {
                residue.hetero_flag = HeteroFlag::Polymer;
                true
            }
            None => false,
        }
    }

    /// Renames a residue and removes every atom whose name is not in `keep`.
    ///
    /// # Return
    ///
    /// Returns the number of atoms removed, or `None` if the residue doesn't exist.
    pub fn rename_and_prune(
        &mut self,
        residue_id: ResidueId,
        new_name: &str,
        keep: &[&str],
    ) -> Option<usize> {
        let residue = self.residues.get_mut(residue_id)?;
        residue.name = new_name.to_string();
        let doomed: Vec<AtomId> = residue
            .atoms
            .iter()
            .copied()
            .filter(|&id| {
                self.atoms
                    .get(id)
                    .is_none_or(|atom| !keep.contains(&atom.name.as_str()))
            })
            .collect();
        for &atom_id in &doomed {
            self.remove_atom(atom_id);
        }
        Some(doomed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn two_residue_structure() -> (StructureRecord, ResidueId, ResidueId) {
        let mut structure = StructureRecord::new("TEST");
        let model = structure.add_model(None);
        let chain = structure.add_chain(model, 'A').unwrap();
        let ala = structure
            .add_residue(chain, ResidueNumber::from(1), "ALA", HeteroFlag::Polymer)
            .unwrap();
        let hoh = structure
            .add_residue(chain, ResidueNumber::from(101), "HOH", HeteroFlag::Water)
            .unwrap();
        structure
            .add_atom_to_residue(ala, Atom::new(1, "CA", "C", Point3::origin()))
            .unwrap();
        structure
            .add_atom_to_residue(ala, Atom::new(2, "HA", "H", Point3::new(1.0, 0.0, 0.0)))
            .unwrap();
        structure
            .add_atom_to_residue(hoh, Atom::new(3, "O", "O", Point3::new(5.0, 0.0, 0.0)))
            .unwrap();
        (structure, ala, hoh)
    }

    #[test]
    fn add_model_assigns_sequential_positional_ids() {
        let mut structure = StructureRecord::new("X");
        structure.add_model(Some(1));
        structure.add_model(Some(2));
        structure.add_model(Some(3));
        assert_eq!(structure.model_indices(), vec![0, 1, 2]);
        assert!(structure.find_model(2).is_some());
        assert!(structure.find_model(3).is_none());
    }

    #[test]
    fn add_chain_and_residue_are_idempotent() {
        let (mut structure, ala, _) = two_residue_structure();
        let model = structure.find_model(0).unwrap();
        let chain = structure.add_chain(model, 'A').unwrap();
        let again = structure
            .add_residue(chain, ResidueNumber::from(1), "ALA", HeteroFlag::Polymer)
            .unwrap();
        assert_eq!(again, ala);
        assert_eq!(structure.chains_of(model).count(), 1);
        assert_eq!(structure.residue_count(), 2);
    }

    #[test]
    fn insert_residue_respects_position_and_rejects_duplicates() {
        let (mut structure, ala, hoh) = two_residue_structure();
        let chain = structure.residue(ala).unwrap().chain_id;
        let gly = structure
            .insert_residue(chain, 1, ResidueNumber::from(2), "GLY", HeteroFlag::Polymer)
            .unwrap();
        let order: Vec<_> = structure.residues_of(chain).map(|(id, _)| id).collect();
        assert_eq!(order, vec![ala, gly, hoh]);
        assert!(
            structure
                .insert_residue(chain, 0, ResidueNumber::from(2), "GLY", HeteroFlag::Polymer)
                .is_none()
        );
    }

    #[test]
    fn atom_ids_walk_the_tree_in_file_order() {
        let (structure, _, _) = two_residue_structure();
        let serials: Vec<_> = structure
            .atom_ids()
            .into_iter()
            .map(|id| structure.atom(id).unwrap().serial)
            .collect();
        assert_eq!(serials, vec![1, 2, 3]);
    }

    #[test]
    fn remove_residue_drops_atoms_and_lookup_entries() {
        let (mut structure, _, hoh) = two_residue_structure();
        let chain = structure.residue(hoh).unwrap().chain_id;
        structure.remove_residue(hoh).unwrap();
        assert_eq!(structure.atom_count(), 2);
        assert!(structure.find_residue(chain, ResidueNumber::from(101)).is_none());
        assert_eq!(structure.residues_of(chain).count(), 1);
    }

    #[test]
    fn strip_hydrogens_removes_only_hydrogens() {
        let (mut structure, ala, _) = two_residue_structure();
        assert_eq!(structure.strip_hydrogens(), 1);
        let names: Vec<_> = structure
            .atoms_of(ala)
            .map(|(_, atom)| atom.name.clone())
            .collect();
        assert_eq!(names, vec!["CA"]);
    }

    #[test]
    fn rename_and_prune_keeps_only_listed_atoms() {
        let (mut structure, ala, hoh) = two_residue_structure();
        assert_eq!(structure.rename_and_prune(ala, "GLY", &["N", "CA"]), Some(1));
        let residue = structure.residue(ala).unwrap();
        assert_eq!(residue.name, "GLY");
        assert_eq!(residue.atoms().len(), 1);
        assert_eq!(structure.atom_count(), 2);

        assert!(structure.retag_as_polymer(hoh));
        assert_eq!(structure.residue(hoh).unwrap().hetero_flag, HeteroFlag::Polymer);
    }

    #[test]
    fn residue_keys_resolve_back_to_residues() {
        let (structure, ala, _) = two_residue_structure();
        let key = structure.residue_key(ala).unwrap();
        assert_eq!(key, ResidueKey::new('A', 1));
        assert_eq!(key.to_string(), "A:1");
        assert_eq!(structure.find_residue_by_key(&key), Some(ala));
    }
}
