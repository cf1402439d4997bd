//! Error taxonomy for asset loading.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while loading an asset. The first error aborts the load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Asset directory is not configured (set {var})")]
    MissingAssetDir { var: &'static str },

    #[error("There is no support for '{extension}' file formats: {}", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Too many unique vertices (>{})", u32::MAX)]
    TooManyVertices,
}

impl LoadError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    /// 1-based source line, when the error came from the parser.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Parse(err) => Some(err.line),
            _ => None,
        }
    }
}

/// Malformed input at a specific line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based.
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected {expected} numbers, but parsed {found}")]
    MissingField { expected: usize, found: usize },

    #[error("expected 3 numbers, but parsed more (too many fields)")]
    TooManyFields,

    #[error("record is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid number '{token}'")]
    InvalidNumber { token: String },

    #[error("invalid index '{token}'")]
    InvalidIndex { token: String },

    #[error("malformed face vertex '{token}'")]
    MalformedFaceVertex { token: String },

    #[error("face needs at least 3 vertices, got {found}")]
    FaceTooSmall { found: usize },

    #[error("{attribute} index {index} out of range ({len} declared)")]
    IndexOutOfRange {
        attribute: &'static str,
        index: i64,
        len: usize,
    },
}

pub type LoadResult<T> = Result<T, LoadError>;
