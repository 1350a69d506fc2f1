use phf::{Map, Set, phf_map, phf_set};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Backbone heavy atoms kept when a non-standard residue is renamed to its parent amino acid.
pub const BACKBONE_HEAVY_ATOMS: [&str; 4] = ["N", "CA", "C", "O"];

/// C-terminal oxygen expected on the last amino acid of a chain.
pub const TERMINAL_OXYGEN: &str = "OXT";

static AMINO_ACIDS: Set<&'static str> = phf_set! {
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
};

static NUCLEOTIDES: Set<&'static str> = phf_set! {
    "A", "C", "G", "U", "I", "DA", "DC", "DG", "DT", "DI",
};

static WATER_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "DOD", "TIP3", "SOL",
};

static HEAVY_ATOMS: Map<&'static str, &'static [&'static str]> = phf_map! {
    "ALA" => &["N", "CA", "C", "O", "CB"],
    "ARG" => &["N", "CA", "C", "O", "CB", "CG", "CD", "NE", "CZ", "NH1", "NH2"],
    "ASN" => &["N", "CA", "C", "O", "CB", "CG", "OD1", "ND2"],
    "ASP" => &["N", "CA", "C", "O", "CB", "CG", "OD1", "OD2"],
    "CYS" => &["N", "CA", "C", "O", "CB", "SG"],
    "GLN" => &["N", "CA", "C", "O", "CB", "CG", "CD", "OE1", "NE2"],
    "GLU" => &["N", "CA", "C", "O", "CB", "CG", "CD", "OE1", "OE2"],
    "GLY" => &["N", "CA", "C", "O"],
    "HIS" => &["N", "CA", "C", "O", "CB", "CG", "ND1", "CD2", "CE1", "NE2"],
    "ILE" => &["N", "CA", "C", "O", "CB", "CG1", "CG2", "CD1"],
    "LEU" => &["N", "CA", "C", "O", "CB", "CG", "CD1", "CD2"],
    "LYS" => &["N", "CA", "C", "O", "CB", "CG", "CD", "CE", "NZ"],
    "MET" => &["N", "CA", "C", "O", "CB", "CG", "SD", "CE"],
    "PHE" => &["N", "CA", "C", "O", "CB", "CG", "CD1", "CD2", "CE1", "CE2", "CZ"],
    "PRO" => &["N", "CA", "C", "O", "CB", "CG", "CD"],
    "SER" => &["N", "CA", "C", "O", "CB", "OG"],
    "THR" => &["N", "CA", "C", "O", "CB", "OG1", "CG2"],
    "TRP" => &["N", "CA", "C", "O", "CB", "CG", "CD1", "CD2", "NE1", "CE2", "CE3", "CZ2", "CZ3", "CH2"],
    "TYR" => &["N", "CA", "C", "O", "CB", "CG", "CD1", "CD2", "CE1", "CE2", "CZ", "OH"],
    "VAL" => &["N", "CA", "C", "O", "CB", "CG1", "CG2"],
};

// Modified, D- and protonation-variant residues with the amino acid they derive from.
static PARENT_RESIDUES: Map<&'static str, &'static str> = phf_map! {
    "AIB" => "ALA", "ALM" => "ALA", "AYA" => "ALA", "BNN" => "ALA", "CHG" => "ALA",
    "CSD" => "ALA", "DAL" => "ALA", "DHA" => "ALA", "DNP" => "ALA", "FLA" => "ALA",
    "HAC" => "ALA", "MAA" => "ALA", "PRR" => "ALA", "TIH" => "ALA", "TPQ" => "ALA",
    "ACL" => "ARG", "AGM" => "ARG", "ARM" => "ARG", "DAR" => "ARG", "HAR" => "ARG",
    "HMR" => "ARG", "AR0" => "ARG", "ARN" => "ARG",
    "MEN" => "ASN", "DSG" => "ASN",
    "2AS" => "ASP", "ASA" => "ASP", "ASB" => "ASP", "ASK" => "ASP", "ASL" => "ASP",
    "ASQ" => "ASP", "BHD" => "ASP", "DAS" => "ASP", "DSP" => "ASP", "IAS" => "ASP",
    "ASH" => "ASP",
    "BCS" => "CYS", "BUC" => "CYS", "C5C" => "CYS", "C6C" => "CYS", "CAS" => "CYS",
    "CCS" => "CYS", "CEA" => "CYS", "CME" => "CYS", "CSO" => "CYS", "CSP" => "CYS",
    "CSS" => "CYS", "CSW" => "CYS", "CSX" => "CYS", "CY1" => "CYS", "CY3" => "CYS",
    "CYG" => "CYS", "CYQ" => "CYS", "DCY" => "CYS", "EFC" => "CYS", "OCS" => "CYS",
    "PEC" => "CYS", "PR3" => "CYS", "PYX" => "CYS", "SCH" => "CYS", "SCS" => "CYS",
    "SCY" => "CYS", "SHC" => "CYS", "SMC" => "CYS", "SOC" => "CYS", "CYX" => "CYS",
    "CYM" => "CYS",
    "5HP" => "GLU", "CGU" => "GLU", "DGL" => "GLU", "GGL" => "GLU", "GMA" => "GLU",
    "PCA" => "GLU", "GLP" => "GLU", "GLH" => "GLU",
    "DGN" => "GLN",
    "GL3" => "GLY", "GLZ" => "GLY", "GSC" => "GLY", "MPQ" => "GLY", "MSA" => "GLY",
    "NMC" => "GLY", "SAR" => "GLY",
    "3AH" => "HIS", "DHI" => "HIS", "HIC" => "HIS", "MHS" => "HIS", "NEM" => "HIS",
    "NEP" => "HIS", "HID" => "HIS", "HIE" => "HIS", "HIP" => "HIS",
    "DIL" => "ILE", "IIL" => "ILE",
    "BUG" => "LEU", "CLE" => "LEU", "DLE" => "LEU", "MK8" => "LEU", "MLE" => "LEU",
    "NLE" => "LEU", "NLN" => "LEU", "NLP" => "LEU",
    "5OW" => "LYS", "ALY" => "LYS", "DLY" => "LYS", "KCX" => "LYS", "LLP" => "LYS",
    "LLY" => "LYS", "LYM" => "LYS", "LYZ" => "LYS", "SHR" => "LYS", "TRG" => "LYS",
    "LYN" => "LYS",
    "CXM" => "MET", "FME" => "MET", "MSE" => "MET", "OMT" => "MET",
    "DAH" => "PHE", "DPN" => "PHE", "HPQ" => "PHE", "PHI" => "PHE", "PHL" => "PHE",
    "DPR" => "PRO", "HYP" => "PRO",
    "DSN" => "SER", "MIS" => "SER", "OAS" => "SER", "SAC" => "SER", "SEL" => "SER",
    "SEP" => "SER", "SET" => "SER", "SVA" => "SER",
    "ALO" => "THR", "BMT" => "THR", "DTH" => "THR", "TPO" => "THR",
    "DTR" => "TRP", "HTR" => "TRP", "LTR" => "TRP", "TPL" => "TRP", "TRO" => "TRP",
    "DTY" => "TYR", "IYR" => "TYR", "PAQ" => "TYR", "PTR" => "TYR", "STY" => "TYR",
    "TYB" => "TYR", "TYI" => "TYR", "TYQ" => "TYR", "TYS" => "TYR", "TYY" => "TYR",
    "TYM" => "TYR",
    "DIV" => "VAL", "DVA" => "VAL", "MVA" => "VAL",
};

pub fn is_amino_acid(residue_name: &str) -> bool {
    AMINO_ACIDS.contains(residue_name.trim())
}

pub fn is_nucleotide(residue_name: &str) -> bool {
    NUCLEOTIDES.contains(residue_name.trim())
}

/// A residue is standard when it belongs to the canonical amino-acid or nucleotide vocabulary.
pub fn is_standard_residue(residue_name: &str) -> bool {
    is_amino_acid(residue_name) || is_nucleotide(residue_name)
}

pub fn is_water_name(residue_name: &str) -> bool {
    WATER_NAMES.contains(residue_name.trim())
}

/// Expected heavy atoms (without the terminal OXT) of a standard amino acid.
pub fn heavy_atoms(residue_name: &str) -> Option<&'static [&'static str]> {
    HEAVY_ATOMS.get(residue_name.trim()).copied()
}

/// Non-standard → standard residue substitutions.
///
/// The built-in table covers common modified and D-amino acids; entries loaded from a TOML file
/// (`MSE = "MET"`) take precedence over it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    overrides: HashMap<String, String>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, SubstitutionLoadError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SubstitutionLoadError::Io {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;
        let entries: HashMap<String, String> =
            toml::from_str(&content).map_err(|e| SubstitutionLoadError::Toml {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        let mut table = Self::new();
        for (from, to) in entries {
            table.insert(&from, &to)?;
        }
        Ok(table)
    }

    /// Registers an extra substitution. The target must be a standard amino acid.
    pub fn insert(&mut self, from: &str, to: &str) -> Result<(), SubstitutionLoadError> {
        let to = to.trim().to_ascii_uppercase();
        if !is_amino_acid(&to) {
            return Err(SubstitutionLoadError::InvalidTarget {
                residue: from.to_string(),
                target: to,
            });
        }
        self.overrides.insert(from.trim().to_ascii_uppercase(), to);
        Ok(())
    }

    /// Returns the standard counterpart of a non-standard residue, if one is known.
    pub fn standard_for(&self, residue_name: &str) -> Option<&str> {
        let name = residue_name.trim();
        if is_standard_residue(name) {
            return None;
        }
        self.overrides
            .get(name)
            .map(String::as_str)
            .or_else(|| PARENT_RESIDUES.get(name).copied())
    }
}

#[derive(Debug, Error)]
pub enum SubstitutionLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Substitution for '{residue}' targets '{target}', which is not a standard amino acid")]
    InvalidTarget { residue: String, target: String },
}
