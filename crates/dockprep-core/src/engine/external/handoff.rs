use super::error::EngineError;
use crate::core::io::error::WriteError;
use crate::core::io::pdb::PdbFile;
use crate::core::io::traits::{AcceptAll, StructureFile};
use crate::core::models::structure::StructureRecord;
use crate::engine::sanitizer::log_warnings;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Scratch directory for exchanging structures with an external tool.
///
/// The directory and everything in it are deleted when the hand-off is dropped, on every exit
/// path. [`Handoff::close`] deletes it explicitly so that a failed deletion is reported.
#[derive(Debug)]
pub struct Handoff {
    tool: String,
    dir: TempDir,
}

impl Handoff {
    pub fn new(tool: &str) -> Result<Self, EngineError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("dockprep-{tool}-"))
            .tempdir()?;
        debug!(tool, path = %dir.path().display(), "Created hand-off directory");
        Ok(Self {
            tool: tool.to_string(),
            dir,
        })
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Writes the whole structure as PDB and returns the file path.
    pub fn write_structure(
        &self,
        file_name: &str,
        structure: &StructureRecord,
    ) -> Result<PathBuf, EngineError> {
        let path = self.path(file_name);
        PdbFile::write_to_path(structure, &AcceptAll, &path).map_err(|e| match e {
            WriteError::Io(source) => EngineError::Handoff(source),
            other => EngineError::Output {
                tool: self.tool.clone(),
                message: other.to_string(),
            },
        })?;
        Ok(path)
    }

    pub fn write_text(&self, file_name: &str, contents: &str) -> Result<PathBuf, EngineError> {
        let path = self.path(file_name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Reads a PDB file the tool produced. Tolerated problems are logged under the tool's name.
    pub fn read_structure(&self, file_name: &str) -> Result<StructureRecord, EngineError> {
        let parsed = PdbFile::read_from_path(self.path(file_name)).map_err(|e| {
            EngineError::Output {
                tool: self.tool.clone(),
                message: e.to_string(),
            }
        })?;
        log_warnings(&self.tool, &parsed.warnings);
        Ok(parsed.structure)
    }

    pub fn close(self) -> Result<(), EngineError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(tool = %self.tool, path = %path.display(), "Removed hand-off directory");
        Ok(())
    }
}
