use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("No atom records could be parsed from '{id}'")]
    NoAtoms { id: String },
    #[error("Parse error on line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Raised by a [`Selector`](super::traits::Selector) while the writer walks the structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Model {requested} does not exist (available models: {available:?})")]
    ModelNotFound {
        requested: usize,
        available: Vec<usize>,
    },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Selection rejected the structure: {0}")]
    Selection(#[from] SelectionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("Unsupported structure format '{extension}' for '{path}' (expected .pdb, .ent, .cif or .mmcif)")]
    Unsupported { path: String, extension: String },
}
