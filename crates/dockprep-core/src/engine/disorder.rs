use crate::core::models::ids::{AtomId, ResidueId};
use crate::core::models::structure::StructureRecord;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Picks one conformation per disorder group.
///
/// A disorder group is the set of atoms sharing residue and atom name but carrying different
/// alternate-location codes. The member with the alphabetically first code is kept (a blank
/// code sorts before any letter); occupancy is not compared.
///
/// The reject set is computed once, from the structure as it was when the resolver was built.
#[derive(Debug, Clone, Default)]
pub struct DisorderResolver {
    rejected: HashSet<AtomId>,
    rejected_serials: Vec<usize>,
    group_count: usize,
}

impl DisorderResolver {
    pub fn new(structure: &StructureRecord) -> Self {
        let mut groups: BTreeMap<(ResidueId, &str), Vec<(Option<char>, AtomId)>> = BTreeMap::new();
        for residue_id in structure.residue_ids() {
            for (atom_id, atom) in structure.atoms_of(residue_id) {
                groups
                    .entry((residue_id, atom.name.as_str()))
                    .or_default()
                    .push((atom.alt_loc, atom_id));
            }
        }

        let mut resolver = Self::default();
        for members in groups.into_values().filter(|m| m.len() > 1) {
            resolver.group_count += 1;
            let Some(&(kept_code, _)) = members.iter().min_by_key(|(code, _)| *code) else {
                continue;
            };
            let mut kept = false;
            for &(code, atom_id) in &members {
                if code == kept_code && !kept {
                    kept = true;
                    continue;
                }
                resolver.rejected.insert(atom_id);
                if let Some(atom) = structure.atom(atom_id) {
                    resolver.rejected_serials.push(atom.serial);
                }
            }
        }
        resolver.rejected_serials.sort_unstable();

        debug!(
            groups = resolver.group_count,
            rejected = resolver.rejected.len(),
            "Resolved alternate locations"
        );
        resolver
    }

    pub fn is_rejected(&self, atom_id: AtomId) -> bool {
        self.rejected.contains(&atom_id)
    }

    /// Serial numbers of the rejected atoms, ascending.
    pub fn rejected_serials(&self) -> &[usize] {
        &self.rejected_serials
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }
}
