use crate::core::io::format::StructureFormat;
use crate::core::io::traits::{AcceptAll, ParsedStructure};
use crate::core::models::structure::StructureRecord;
use crate::engine::error::PrepError;
use crate::engine::findings::RepairFinding;
use crate::engine::repair::{RepairContext, RepairOperation};
use crate::engine::sanitizer::{Sanitizer, parse_logged};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The single live resource behind a receptor: an open source file or an in-memory buffer.
#[derive(Debug)]
pub enum StructureHandle {
    File {
        path: PathBuf,
        format: StructureFormat,
        reader: BufReader<File>,
    },
    Buffer {
        name: String,
        format: StructureFormat,
        contents: String,
    },
}

impl StructureHandle {
    /// Opens a structure file, detecting its format from the extension.
    ///
    /// # Errors
    ///
    /// * [`PrepError::InputNotFound`] if `path` is not an existing file.
    /// * [`PrepError::UnsupportedFormat`] if the extension names no known format.
    pub fn open(path: &Path) -> Result<Self, PrepError> {
        if !path.is_file() {
            return Err(PrepError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let format = StructureFormat::from_path(path)?;
        let file = File::open(path).map_err(|e| PrepError::io(path.display().to_string(), e))?;
        Ok(Self::File {
            path: path.to_path_buf(),
            format,
            reader: BufReader::new(file),
        })
    }

    /// Serializes `structure` in full into a new buffer.
    pub fn from_record(
        name: impl Into<String>,
        format: StructureFormat,
        structure: &StructureRecord,
    ) -> Result<Self, PrepError> {
        let name = name.into();
        let contents = format
            .write_to_string(structure, &AcceptAll)
            .map_err(|e| PrepError::from_write(name.clone(), e))?;
        Ok(Self::Buffer {
            name,
            format,
            contents,
        })
    }

    pub fn format(&self) -> StructureFormat {
        match self {
            Self::File { format, .. } | Self::Buffer { format, .. } => *format,
        }
    }

    pub fn name(&self) -> String {
        match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Buffer { name, .. } => name.clone(),
        }
    }

    /// Parses the handle's content, releasing the underlying resource.
    pub fn parse(self) -> Result<ParsedStructure, PrepError> {
        let name = self.name();
        match self {
            Self::File {
                format, mut reader, ..
            } => parse_logged(&mut reader, format, &name),
            Self::Buffer {
                format, contents, ..
            } => parse_logged(&mut Cursor::new(contents.as_bytes()), format, &name),
        }
    }

    /// Runs `sanitizer` over the handle and returns the cleaned buffer in the same format.
    pub fn sanitize(self, sanitizer: &Sanitizer) -> Result<(Self, SanitizeReport), PrepError> {
        let name = self.name();
        let sanitized = match self {
            Self::File {
                format, mut reader, ..
            } => sanitizer.sanitize(&mut reader, format, &name)?,
            Self::Buffer {
                format, contents, ..
            } => sanitizer.sanitize(&mut Cursor::new(contents.as_bytes()), format, &name)?,
        };
        let report = SanitizeReport {
            parse_warnings: sanitized.warning_count,
            disorder_groups: sanitized.disorder_groups,
        };
        let handle = Self::Buffer {
            name,
            format: sanitized.format,
            contents: sanitized.contents,
        };
        Ok((handle, report))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SanitizeReport {
    pub parse_warnings: usize,
    pub disorder_groups: usize,
}

/// A receptor being prepared.
///
/// The session holds exactly one [`StructureHandle`]. Every stage takes it out, consumes it,
/// and installs its replacement, so the previous file or buffer is always released before the
/// next one exists. A stage that fails leaves the session empty; later calls return
/// [`PrepError::Session`].
#[derive(Debug)]
pub struct Receptor {
    name: String,
    current: Option<StructureHandle>,
}

impl Receptor {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PrepError> {
        let path = path.as_ref();
        let handle = StructureHandle::open(path)?;
        info!(
            "Opened receptor '{}' ({})",
            path.display(),
            handle.format()
        );
        Ok(Self {
            name: handle.name(),
            current: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> Option<StructureFormat> {
        self.current.as_ref().map(StructureHandle::format)
    }

    fn take(&mut self) -> Result<StructureHandle, PrepError> {
        self.current.take().ok_or(PrepError::Session)
    }

    fn install(&mut self, handle: StructureHandle) {
        debug!(receptor = %self.name, format = %handle.format(), "Installing new structure handle");
        self.current = Some(handle);
    }

    pub fn sanitize(&mut self, sanitizer: &Sanitizer) -> Result<SanitizeReport, PrepError> {
        let handle = self.take()?;
        let (cleaned, report) = handle.sanitize(sanitizer)?;
        self.install(cleaned);
        Ok(report)
    }

    /// Applies one repair operation to the current structure and returns what it found.
    pub fn repair(
        &mut self,
        operation: &RepairOperation,
        context: &mut RepairContext,
    ) -> Result<Vec<RepairFinding>, PrepError> {
        let handle = self.take()?;
        let name = handle.name();
        let format = handle.format();
        let parsed = handle.parse()?;

        let outcome = operation.apply(parsed.structure, context)?;
        self.install(StructureHandle::from_record(name, format, &outcome.structure)?);
        Ok(outcome.findings)
    }

    /// Parses the current structure. The session keeps an equivalent buffer in its place.
    pub fn snapshot(&mut self) -> Result<StructureRecord, PrepError> {
        let handle = self.take()?;
        let name = handle.name();
        let format = handle.format();
        let structure = handle.parse()?.structure;
        self.install(StructureHandle::from_record(name, format, &structure)?);
        Ok(structure)
    }

    /// Writes the current structure to `path`, converting when the extension names another
    /// format, and closes the session.
    pub fn write(mut self, path: &Path) -> Result<(), PrepError> {
        let target = StructureFormat::from_path(path)?;
        let handle = self.take()?;
        let target_path = path.display().to_string();

        let contents = match handle {
            StructureHandle::Buffer {
                format, contents, ..
            } if format == target => contents,
            other => {
                if other.format() != target {
                    info!("Converting {} to {} for '{}'", other.format(), target, target_path);
                }
                let structure = other.parse()?.structure;
                target
                    .write_to_string(&structure, &AcceptAll)
                    .map_err(|e| PrepError::from_write(target_path.clone(), e))?
            }
        };

        std::fs::write(path, contents).map_err(|e| PrepError::io(target_path.clone(), e))?;
        info!("Wrote prepared receptor to '{}'", target_path);
        Ok(())
    }
}
