use super::error::{FormatError, ParseError, WriteError};
use super::mmcif::MmcifFile;
use super::pdb::PdbFile;
use super::traits::{ParsedStructure, Selector, StructureFile};
use crate::core::models::structure::StructureRecord;
use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

/// Text formats the pipeline can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureFormat {
    Pdb,
    Mmcif,
}

impl StructureFormat {
    /// Determines the format from a path's extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::Unsupported`] for any extension other than
    /// `.pdb`, `.ent`, `.cif` or `.mmcif`.
    pub fn from_path(path: &Path) -> Result<Self, FormatError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdb" | "ent" => Ok(Self::Pdb),
            "cif" | "mmcif" => Ok(Self::Mmcif),
            _ => Err(FormatError::Unsupported {
                path: path.display().to_string(),
                extension,
            }),
        }
    }

    pub fn read(self, reader: &mut impl BufRead, id: &str) -> Result<ParsedStructure, ParseError> {
        match self {
            Self::Pdb => PdbFile::read_from(reader, id),
            Self::Mmcif => MmcifFile::read_from(reader, id),
        }
    }

    pub fn write(
        self,
        structure: &StructureRecord,
        selector: &dyn Selector,
        writer: &mut impl Write,
    ) -> Result<(), WriteError> {
        match self {
            Self::Pdb => PdbFile::write_to(structure, selector, writer),
            Self::Mmcif => MmcifFile::write_to(structure, selector, writer),
        }
    }

    /// Serializes into an in-memory buffer.
    pub fn write_to_string(
        self,
        structure: &StructureRecord,
        selector: &dyn Selector,
    ) -> Result<String, WriteError> {
        let mut buffer = Vec::new();
        self.write(structure, selector, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            WriteError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }
}

impl fmt::Display for StructureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdb => write!(f, "PDB"),
            Self::Mmcif => write!(f, "mmCIF"),
        }
    }
}
