use std::path::PathBuf;

/// Errors raised by a [`crate::RecordSource`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("container '{}' not found", path.display())]
    ContainerNotFound { path: PathBuf },

    #[error("container contains no symbol named '{name}'")]
    SymbolNotFound { name: String },

    #[error("alias '{alias}' does not resolve to a set: {reason}")]
    BadAlias { alias: String, reason: String },

    #[error("symbol handle for '{name}' is not open")]
    NotOpen { name: String },

    #[error("associated text index {index} out of range 1..={len}")]
    TextIndex { index: u32, len: usize },

    #[error("invalid container: {0}")]
    Invalid(String),

    #[error("invalid container json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
