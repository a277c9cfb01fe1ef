use std::path::PathBuf;

use thiserror::Error;

/// Reasons a two-line element set is rejected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TleError {
    #[error("line {line} has {len} characters, expected 69")]
    Length { line: u8, len: usize },
    #[error("line {line} checksum digit is {found:?}, computed {computed}")]
    Checksum { line: u8, found: char, computed: u32 },
    #[error("line {line} column {column}: expected {expected:?}, found {found:?}")]
    Structure {
        line: u8,
        column: usize,
        expected: char,
        found: char,
    },
    #[error("catalog numbers differ between line 1 and line 2")]
    CatalogMismatch,
    #[error("invalid {field}: {value:?}")]
    Field { field: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("QTH file {}: {message}", path.display())]
    Qth { path: PathBuf, message: String },
    #[error("no valid element sets in {}", .0.display())]
    Empty(PathBuf),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}
