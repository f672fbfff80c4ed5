use std::path::PathBuf;
use thiserror::Error;

/// Failures on the panel/host message channel.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("the other side of the bridge is gone")]
    Disconnected,
}

/// Why a copy request never reached the host.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRejected {
    #[error("No files or snippets selected")]
    EmptySelection,

    #[error("A copy is already in progress")]
    InProgress,
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("failed to access {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {}", .path.display(), .source)]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnippetSpecError {
    #[error("expected PATH:START-END, got '{0}'")]
    Format(String),

    #[error("invalid line number '{0}'")]
    LineNumber(String),

    #[error("end line {end} is before start line {start}")]
    Range { start: u32, end: u32 },

    #[error("{path} has only {lines} lines")]
    OutOfBounds { path: String, lines: usize },

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },
}
