use super::ids::{AtomId, ChainId};
use std::cmp::Ordering;
use std::fmt;

/// Identifies a residue within its chain: sequence number plus optional insertion code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResidueNumber {
    pub seq: isize,
    pub insertion_code: Option<char>,
}

impl ResidueNumber {
    pub fn new(seq: isize, insertion_code: Option<char>) -> Self {
        Self {
            seq,
            insertion_code,
        }
    }
}

impl From<isize> for ResidueNumber {
    fn from(seq: isize) -> Self {
        Self::new(seq, None)
    }
}

impl Ord for ResidueNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq
            .cmp(&other.seq)
            .then_with(|| self.insertion_code.cmp(&other.insertion_code))
    }
}

impl PartialOrd for ResidueNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ResidueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.insertion_code {
            Some(code) => write!(f, "{}{}", self.seq, code),
            None => write!(f, "{}", self.seq),
        }
    }
}

/// Heteroatom classification of a residue.
///
/// Mirrors the record type an atom was read from: polymer residues come from `ATOM`
/// records, everything read from `HETATM` records is either water or a hetero group
/// (ligand, ion, modified residue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HeteroFlag {
    #[default]
    Polymer,
    Water,
    Hetero,
}

impl HeteroFlag {
    pub fn is_hetatm(self) -> bool {
        !matches!(self, HeteroFlag::Polymer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub number: ResidueNumber,     // Sequence number and insertion code from source file
    pub name: String,              // Three-letter residue name (e.g., "ALA", "MSE", "HOH")
    pub hetero_flag: HeteroFlag,   // Polymer / water / hetero classification
    pub chain_id: ChainId,         // ID of the parent chain
    pub(crate) atoms: Vec<AtomId>, // Atoms in file order, all alternate locations included
}

impl Residue {
    pub(crate) fn new(
        number: ResidueNumber,
        name: &str,
        hetero_flag: HeteroFlag,
        chain_id: ChainId,
    ) -> Self {
        Self {
            number,
            name: name.to_string(),
            hetero_flag,
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub(crate) fn add_atom(&mut self, atom_id: AtomId) {
        self.atoms.push(atom_id);
    }

    pub(crate) fn remove_atom(&mut self, atom_id: AtomId) {
        self.atoms.retain(|&id| id != atom_id);
    }

    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    pub fn is_water(&self) -> bool {
        self.hetero_flag == HeteroFlag::Water
    }

    pub fn is_hetero(&self) -> bool {
        self.hetero_flag == HeteroFlag::Hetero
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn dummy_atom_id(n: u64) -> AtomId {
        AtomId::from(KeyData::from_ffi(n))
    }

    #[test]
    fn residue_numbers_order_by_sequence_then_insertion_code() {
        let plain = ResidueNumber::new(52, None);
        let inserted_a = ResidueNumber::new(52, Some('A'));
        let inserted_b = ResidueNumber::new(52, Some('B'));
        let next = ResidueNumber::new(53, None);

        let mut numbers = vec![next, inserted_b, plain, inserted_a];
        numbers.sort();
        assert_eq!(numbers, vec![plain, inserted_a, inserted_b, next]);
    }

    #[test]
    fn residue_number_display_appends_insertion_code() {
        assert_eq!(ResidueNumber::new(10, None).to_string(), "10");
        assert_eq!(ResidueNumber::new(-3, Some('A')).to_string(), "-3A");
    }

    #[test]
    fn hetero_flag_reports_hetatm_records() {
        assert!(!HeteroFlag::Polymer.is_hetatm());
        assert!(HeteroFlag::Water.is_hetatm());
        assert!(HeteroFlag::Hetero.is_hetatm());
    }

    #[test]
    fn add_and_remove_atom_update_membership() {
        let mut residue = Residue::new(
            ResidueNumber::from(5),
            "SER",
            HeteroFlag::Polymer,
            ChainId::default(),
        );
        residue.add_atom(dummy_atom_id(1));
        residue.add_atom(dummy_atom_id(2));
        residue.remove_atom(dummy_atom_id(1));
        assert_eq!(residue.atoms(), &[dummy_atom_id(2)]);
        assert!(!residue.is_water());
        assert!(!residue.is_hetero());
    }
}
