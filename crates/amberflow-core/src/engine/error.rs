use crate::core::script::scanner::ScanError;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    File,
    Subdirectory,
    Directory,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputKind::File => write!(f, "Input file"),
            InputKind::Subdirectory => write!(f, "Subdirectory file"),
            InputKind::Directory => write!(f, "Directory"),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("{kind} '{reference}' referenced by the job does not exist")]
    MissingInputFile { reference: String, kind: InputKind },

    #[error("Input '{reference}' points outside the directory it is resolved against")]
    EscapingReference { reference: String },

    #[error(
        "Files '{first}' and '{second}' both map to the link label '{label}'",
        first = first.display(),
        second = second.display()
    )]
    LabelCollision {
        label: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Failed to stage '{path}': {source}", path = path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Sandbox operation failed at '{path}': {source}", path = path.display())]
    Sandbox {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to launch '{executable}': {source}", executable = executable.display())]
    Launch {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Found files {found:?}, expected to find {missing:?}")]
    MissingExpectedOutput {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("{tool} finished unsuccessfully ({status})")]
    ToolFailed { tool: String, status: String },

    #[error("Provenance record error: {0}")]
    Provenance(String),
}

impl EngineError {
    pub(crate) fn sandbox(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| EngineError::Sandbox { path, source }
    }
}
