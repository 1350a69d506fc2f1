use crate::core::models::ids::{ChainId, ResidueId};
use crate::core::models::residue::HeteroFlag;
use crate::core::models::structure::{ResidueKey, StructureRecord};
use crate::core::residues::{
    BACKBONE_HEAVY_ATOMS, SubstitutionTable, TERMINAL_OXYGEN, heavy_atoms, is_amino_acid,
    is_water_name,
};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Atom names per residue.
pub type AtomNames = BTreeMap<ResidueKey, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonStandardResidue {
    pub residue: ResidueKey,
    pub name: String,
    pub replacement: String,
}

/// A run of consecutive SEQRES entries with no counterpart in the coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueGap {
    pub chain: char,
    /// Zero-based SEQRES index of the first missing residue.
    pub seqres_start: usize,
    pub names: Vec<String>,
    /// Observed residue the gap precedes; `None` when the gap trails the chain.
    pub before: Option<ResidueKey>,
}

impl ResidueGap {
    /// One-based, inclusive SEQRES range covered by the gap.
    pub fn seqres_range(&self) -> (usize, usize) {
        (self.seqres_start + 1, self.seqres_start + self.names.len())
    }

    /// Where the gap sits relative to the observed residues, e.g. `before A:15`.
    pub fn placement(&self) -> String {
        match self.before {
            Some(key) => format!("before {key}"),
            None => "at chain end".to_string(),
        }
    }
}

fn first_model_chains(structure: &StructureRecord) -> Vec<ChainId> {
    structure
        .find_model(0)
        .map(|model| structure.chains_of(model).map(|(id, _)| id).collect())
        .unwrap_or_default()
}

/// Residues whose name is outside the standard vocabulary but has a known standard parent.
pub fn nonstandard_residues(
    structure: &StructureRecord,
    table: &SubstitutionTable,
) -> Vec<NonStandardResidue> {
    let mut found = Vec::new();
    for chain_id in first_model_chains(structure) {
        for (residue_id, residue) in structure.residues_of(chain_id) {
            let Some(key) = structure.residue_key(residue_id) else {
                continue;
            };
            match table.standard_for(&residue.name) {
                Some(replacement) => found.push(NonStandardResidue {
                    residue: key,
                    name: residue.name.clone(),
                    replacement: replacement.to_string(),
                }),
                None if residue.is_hetero() => {
                    debug!("No standard counterpart for hetero group {} {}", residue.name, key);
                }
                None => {}
            }
        }
    }
    found
}

/// Renames each residue to its replacement, reclassifies it as polymer and keeps only the
/// backbone heavy atoms.
pub fn apply_replacements(structure: &mut StructureRecord, replacements: &[NonStandardResidue]) {
    for replacement in replacements {
        let Some(residue_id) = structure.find_residue_by_key(&replacement.residue) else {
            continue;
        };
        structure.retag_as_polymer(residue_id);
        if let Some(pruned) =
            structure.rename_and_prune(residue_id, &replacement.replacement, &BACKBONE_HEAVY_ATOMS)
        {
            debug!(
                "{} renamed to {}, {} side-chain atoms pruned",
                replacement.residue, replacement.replacement, pruned
            );
        }
    }
}

fn amino_acid_residues(structure: &StructureRecord, chain_id: ChainId) -> Vec<ResidueId> {
    structure
        .residues_of(chain_id)
        .filter(|(_, r)| r.hetero_flag == HeteroFlag::Polymer && is_amino_acid(&r.name))
        .map(|(id, _)| id)
        .collect()
}

/// Missing heavy atoms of standard amino acids, and missing C-terminal oxygens.
///
/// Returns `(missing_atoms, missing_terminals)`; residues with nothing missing are omitted.
pub fn missing_atoms(structure: &StructureRecord) -> (AtomNames, AtomNames) {
    let mut atoms = AtomNames::new();
    let mut terminals = AtomNames::new();

    for chain_id in first_model_chains(structure) {
        let residues = amino_acid_residues(structure, chain_id);
        for &residue_id in &residues {
            let (Some(residue), Some(key)) =
                (structure.residue(residue_id), structure.residue_key(residue_id))
            else {
                continue;
            };
            let present: HashSet<&str> = structure
                .atoms_of(residue_id)
                .map(|(_, atom)| atom.name.as_str())
                .collect();
            let missing: Vec<String> = heavy_atoms(&residue.name)
                .unwrap_or_default()
                .iter()
                .filter(|name| !present.contains(*name))
                .map(|name| name.to_string())
                .collect();
            if !missing.is_empty() {
                atoms.insert(key, missing);
            }
        }

        if let Some(&last) = residues.last() {
            let has_oxt = structure
                .atoms_of(last)
                .any(|(_, atom)| atom.name == TERMINAL_OXYGEN);
            if let (false, Some(key)) = (has_oxt, structure.residue_key(last)) {
                terminals.insert(key, vec![TERMINAL_OXYGEN.to_string()]);
            }
        }
    }
    (atoms, terminals)
}

/// Gaps between each chain's SEQRES sequence and its observed residues.
///
/// Observed residues are aligned to SEQRES by longest common subsequence of residue names;
/// SEQRES entries left unmatched form the gaps. Chains without SEQRES yield nothing.
pub fn missing_residues(structure: &StructureRecord) -> Vec<ResidueGap> {
    let mut gaps = Vec::new();
    for chain_id in first_model_chains(structure) {
        let Some(chain) = structure.chain(chain_id) else {
            continue;
        };
        let Some(sequence) = structure.header.seqres.get(&chain.id) else {
            continue;
        };
        let sequence_names: HashSet<&str> = sequence.iter().map(String::as_str).collect();
        let observed: Vec<(ResidueId, &str)> = structure
            .residues_of(chain_id)
            .filter(|(_, r)| !is_water_name(&r.name) && sequence_names.contains(r.name.as_str()))
            .map(|(id, r)| (id, r.name.as_str()))
            .collect();
        let names: Vec<&str> = observed.iter().map(|(_, name)| *name).collect();
        let matched = align(sequence, &names);

        let mut index = 0;
        while index < sequence.len() {
            if matched[index].is_some() {
                index += 1;
                continue;
            }
            let start = index;
            while index < sequence.len() && matched[index].is_none() {
                index += 1;
            }
            let before = matched[index..]
                .iter()
                .flatten()
                .next()
                .and_then(|&j| structure.residue_key(observed[j].0));
            gaps.push(ResidueGap {
                chain: chain.id,
                seqres_start: start,
                names: sequence[start..index].to_vec(),
                before,
            });
        }
    }
    gaps
}

/// Longest-common-subsequence alignment. Entry `i` is the observed index matched to
/// `sequence[i]`, if any.
fn align(sequence: &[String], observed: &[&str]) -> Vec<Option<usize>> {
    let (n, m) = (sequence.len(), observed.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if sequence[i] == observed[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut matched = vec![None; n];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if sequence[i] == observed[j] && table[i][j] == table[i + 1][j + 1] + 1 {
            matched[i] = Some(j);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    matched
}
