//! Unified error type for all store operations.

use crate::resolve::PathSource;
use std::path::{Path, PathBuf};

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read targeted a store file that does not exist.
    MissingFile {
        /// The path that was looked up.
        path: PathBuf,
        /// Which resolution tier produced `path`.
        source: PathSource,
    },
    /// File system problem (read, write, rename, lock).
    Io(String),
    /// Failed to serialize the mapping to bytes.
    Serialize(String),
    /// The store file exists but could not be decoded into a mapping.
    Deserialize(String),
    /// Bad input or configuration (empty key, etc.).
    Config(String),
}

impl Error {
    /// Prefix an I/O failure with the path it happened on.
    pub(crate) fn io_at(path: &Path, err: impl std::fmt::Display) -> Self {
        Error::Io(format!("{}: {err}", path.display()))
    }

    /// Prefix a decode failure with the offending file.
    pub(crate) fn corrupt_at(path: &Path, err: impl std::fmt::Display) -> Self {
        Error::Deserialize(format!("{}: {err}", path.display()))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::MissingFile { path, source } => {
                write!(
                    f,
                    "store file {} does not exist; the path {source}. {}",
                    path.display(),
                    source.remedy()
                )
            }
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Serialize(msg) => write!(f, "serialization error: {msg}"),
            Error::Deserialize(msg) => write!(f, "deserialization error: {msg}"),
            Error::Config(msg) => write!(f, "config error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Error::Io(err.to_string())
        } else if err.is_syntax() || err.is_eof() || err.is_data() {
            Error::Deserialize(err.to_string())
        } else {
            Error::Serialize(err.to_string())
        }
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
