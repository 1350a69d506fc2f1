use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("'{operation}' requires the {field} bookkeeping to be initialised")]
    Precondition {
        operation: &'static str,
        field: &'static str,
    },

    #[error("No structure is loaded into the repair engine")]
    NoStructure,

    #[error("External tool '{tool}' could not be started: {source}")]
    Unavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("External tool '{tool}' exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Hand-off file error: {0}")]
    Handoff(#[from] io::Error),

    #[error("Output of '{tool}' could not be read back: {message}")]
    Output { tool: String, message: String },
}
