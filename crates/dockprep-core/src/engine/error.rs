use super::config::ConfigError;
use super::external::error::EngineError;
use crate::core::io::error::{FormatError, ParseError, SelectionError, WriteError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of the preparation pipeline.
///
/// Parse-time structural warnings never surface here; they are logged where they occur.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Input file not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Could not parse a structure from '{source_name}': {source}")]
    StructureParse {
        source_name: String,
        #[source]
        source: ParseError,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    UnsupportedFormat(#[from] FormatError),

    #[error("Repair engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("The receptor session holds no structure (a previous stage failed or the session was closed)")]
    Session,
}

/// Invalid settings, either in the assembled configuration or in the model selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Settings(#[from] ConfigError),
}

impl PrepError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn from_write(target: impl Into<String>, error: WriteError) -> Self {
        match error {
            WriteError::Selection(e) => e.into(),
            WriteError::Io(e) => Self::io(target, e),
        }
    }

    pub(crate) fn from_parse(source_name: impl Into<String>, error: ParseError) -> Self {
        match error {
            ParseError::Io(e) => Self::io(source_name, e),
            other => Self::StructureParse {
                source_name: source_name.into(),
                source: other,
            },
        }
    }
}

impl From<SelectionError> for PrepError {
    fn from(error: SelectionError) -> Self {
        Self::Configuration(error.into())
    }
}

impl From<ConfigError> for PrepError {
    fn from(error: ConfigError) -> Self {
        Self::Configuration(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_errors_become_configuration_errors() {
        let error: PrepError = SelectionError::ModelNotFound {
            requested: 5,
            available: vec![0, 1, 2],
        }
        .into();
        assert!(matches!(
            error,
            PrepError::Configuration(ConfigurationError::Selection(SelectionError::ModelNotFound {
                requested: 5,
                ..
            }))
        ));
        assert!(error.to_string().contains("Model 5"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn config_errors_keep_their_variant() {
        let error: PrepError = ConfigError::MissingParameter("output_path").into();
        assert!(matches!(
            error,
            PrepError::Configuration(ConfigurationError::Settings(ConfigError::MissingParameter(
                "output_path"
            )))
        ));
    }

    #[test]
    fn write_errors_split_by_cause() {
        let selection = WriteError::Selection(SelectionError::ModelNotFound {
            requested: 1,
            available: vec![0],
        });
        assert!(matches!(
            PrepError::from_write("buffer", selection),
            PrepError::Configuration(_)
        ));
        let io_error = WriteError::Io(io::Error::other("disk full"));
        assert!(matches!(
            PrepError::from_write("out.pdb", io_error),
            PrepError::Io { ref path, .. } if path == "out.pdb"
        ));
    }

    #[test]
    fn parse_failures_keep_the_source_name() {
        let error = PrepError::from_parse("1abc.pdb", ParseError::NoAtoms { id: "1abc".into() });
        assert!(error.to_string().contains("1abc.pdb"));
    }
}
