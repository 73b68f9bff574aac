//! # Error — Tagged Failure Taxonomy
//!
//! `nullcore` never panics on malformed caller input or environmental
//! failure; every fallible operation returns a tagged [`Error`] variant.
//! Binaries translate these into the exit-code convention documented on
//! each `src/bin/*.rs`: `InvalidArgs` is the only variant that maps to
//! exit code 2, everything else maps to 1.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("wrong size: expected {expected} bytes, found {found}")]
    WrongSize { expected: usize, found: usize },

    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("thread error: {0}")]
    Thread(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Exit code for this error, per the `InvalidArgs` → 2, everything-else → 1 rule.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgs(_) => 2,
            _ => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
