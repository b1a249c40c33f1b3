//! Error types for kstructural operations.
//!
//! This module provides [`KStructuralError`], which wraps every failure that
//! can occur between reading an input file and writing its conversion.

use std::{io, path::PathBuf};

use thiserror::Error;

use kstructural_parser::{DriverError, ParseError};

/// The main error type for kstructural operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries every diagnostic of the failed pass, each
/// with the position (including the file) it refers to, so callers can load
/// the relevant source themselves for rich reporting.
#[derive(Debug, Error)]
pub enum KStructuralError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("Export error: {0}")]
    Export(#[from] crate::export::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl KStructuralError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<DriverError> for KStructuralError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Io { path, source } => Self::Io { path, source },
            DriverError::Parse(err) => Self::Parse(err),
        }
    }
}
