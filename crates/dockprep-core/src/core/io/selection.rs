use super::error::SelectionError;
use super::traits::Selector;
use crate::core::models::ids::{AtomId, ChainId, ModelId, ResidueId};
use crate::core::models::structure::StructureRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedResidue {
    pub id: ResidueId,
    pub atoms: Vec<AtomId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedChain {
    pub id: ChainId,
    pub residues: Vec<SelectedResidue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedModel {
    pub id: ModelId,
    pub chains: Vec<SelectedChain>,
}

/// The subset of a structure a selector accepts, in file order.
///
/// Residues left without atoms and chains left without residues are dropped, so writers never
/// emit empty containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub models: Vec<SelectedModel>,
}

impl Selection {
    /// Walks `structure` top-down through `selector`.
    ///
    /// # Errors
    ///
    /// Propagates the first [`SelectionError`] raised by the selector.
    pub fn collect(
        structure: &StructureRecord,
        selector: &dyn Selector,
    ) -> Result<Self, SelectionError> {
        let mut models = Vec::new();
        for (model_id, model) in structure.models_iter() {
            if !selector.accept_model(model)? {
                continue;
            }
            let mut chains = Vec::new();
            for (chain_id, chain) in structure.chains_of(model_id) {
                if !selector.accept_chain(chain)? {
                    continue;
                }
                let mut residues = Vec::new();
                for (residue_id, residue) in structure.residues_of(chain_id) {
                    if !selector.accept_residue(residue)? {
                        continue;
                    }
                    let mut atoms = Vec::new();
                    for (atom_id, atom) in structure.atoms_of(residue_id) {
                        if selector.accept_atom(atom_id, atom, residue)? {
                            atoms.push(atom_id);
                        }
                    }
                    if !atoms.is_empty() {
                        residues.push(SelectedResidue {
                            id: residue_id,
                            atoms,
                        });
                    }
                }
                if !residues.is_empty() {
                    chains.push(SelectedChain {
                        id: chain_id,
                        residues,
                    });
                }
            }
            models.push(SelectedModel {
                id: model_id,
                chains,
            });
        }
        Ok(Self { models })
    }

    pub fn atom_ids(&self) -> impl Iterator<Item = AtomId> + '_ {
        self.models
            .iter()
            .flat_map(|m| &m.chains)
            .flat_map(|c| &c.residues)
            .flat_map(|r| r.atoms.iter().copied())
    }

    /// Chain identifiers present in the selection, in first-seen order.
    pub fn chain_ids(&self, structure: &StructureRecord) -> Vec<char> {
        let mut ids = Vec::new();
        for chain in self.models.iter().flat_map(|m| &m.chains) {
            if let Some(chain) = structure.chain(chain.id) {
                if !ids.contains(&chain.id) {
                    ids.push(chain.id);
                }
            }
        }
        ids
    }
}
