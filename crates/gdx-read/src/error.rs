use gdx_model::SourceError;

pub type ReadResult<T> = Result<T, ReadError>;

/// Category of a failed extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The read specifier is malformed.
    Validation,
    /// The container or the requested symbol does not exist.
    NotFound,
    /// The specifier is well-formed but asks for something this symbol/option mix cannot do.
    UnsupportedCombination,
    /// The container could not be read, or its contents are inconsistent.
    Io,
}

/// Why an extraction failed. Every error is terminal for the extraction that raised it.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("invalid read specifier field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("unsupported read specifier ('{field}'): {message}")]
    Unsupported {
        field: &'static str,
        message: String,
    },

    #[error("inconsistent container data for '{symbol}': {message}")]
    Corrupt { symbol: String, message: String },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl ReadError {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ReadError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(field: &'static str, message: impl Into<String>) -> Self {
        ReadError::Unsupported {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn corrupt(symbol: &str, message: impl Into<String>) -> Self {
        ReadError::Corrupt {
            symbol: symbol.to_owned(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ReadError::Validation { .. } => ErrorKind::Validation,
            ReadError::Unsupported { .. } => ErrorKind::UnsupportedCombination,
            ReadError::Corrupt { .. } => ErrorKind::Io,
            ReadError::Source(err) => match err {
                SourceError::ContainerNotFound { .. }
                | SourceError::SymbolNotFound { .. }
                | SourceError::BadAlias { .. } => ErrorKind::NotFound,
                _ => ErrorKind::Io,
            },
        }
    }

    /// The request field this error is about, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            ReadError::Validation { field, .. } => Some(field),
            ReadError::Unsupported { field, .. } => Some(field),
            _ => None,
        }
    }
}
