use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("character {ch:?} at position {index} of {domain:?} exceeds the ordinal ceiling")]
    Unrepresentable {
        domain: String,
        index: usize,
        ch: char,
    },
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("domain file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_len must be greater than zero")]
    InvalidMaxLen,

    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl InputError {
    /// Classify an I/O failure on `path`, singling out a missing file.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
