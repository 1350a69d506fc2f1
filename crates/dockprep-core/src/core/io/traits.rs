use super::error::{ParseError, SelectionError, WriteError};
use super::warnings::StructuralWarning;
use crate::core::models::atom::Atom;
use crate::core::models::chain::Chain;
use crate::core::models::ids::AtomId;
use crate::core::models::model::Model;
use crate::core::models::residue::Residue;
use crate::core::models::structure::StructureRecord;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Decides which parts of a structure survive serialization.
///
/// Writers consult the selector top-down: a rejected model hides its chains, a rejected chain
/// hides its residues, and so on. Every method defaults to accepting. An error aborts the write.
pub trait Selector {
    fn accept_model(&self, _model: &Model) -> Result<bool, SelectionError> {
        Ok(true)
    }

    fn accept_chain(&self, _chain: &Chain) -> Result<bool, SelectionError> {
        Ok(true)
    }

    fn accept_residue(&self, _residue: &Residue) -> Result<bool, SelectionError> {
        Ok(true)
    }

    fn accept_atom(
        &self,
        _atom_id: AtomId,
        _atom: &Atom,
        _residue: &Residue,
    ) -> Result<bool, SelectionError> {
        Ok(true)
    }
}

/// Selector that keeps everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Selector for AcceptAll {}

/// A parsed structure plus the warnings the reader tolerated.
#[derive(Debug, Clone)]
pub struct ParsedStructure {
    pub structure: StructureRecord,
    pub warnings: Vec<StructuralWarning>,
}

/// Defines the interface for reading and writing a structure file format.
pub trait StructureFile {
    /// Reads a structure from a buffered reader.
    ///
    /// # Arguments
    ///
    /// * `reader` - The buffered reader to read from.
    /// * `id` - Identifier recorded in the structure header.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] on I/O failure or when no structure can be built at all;
    /// recoverable problems are returned as warnings instead.
    fn read_from(reader: &mut impl BufRead, id: &str) -> Result<ParsedStructure, ParseError>;

    /// Writes the parts of `structure` accepted by `selector`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if writing fails or the selector raises an error.
    fn write_to(
        structure: &StructureRecord,
        selector: &dyn Selector,
        writer: &mut impl Write,
    ) -> Result<(), WriteError>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<ParsedStructure, ParseError> {
        let path = path.as_ref();
        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, &id)
    }

    fn write_to_path<P: AsRef<Path>>(
        structure: &StructureRecord,
        selector: &dyn Selector,
        path: P,
    ) -> Result<(), WriteError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, selector, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
