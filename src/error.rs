use std::path::PathBuf;
use thiserror::Error;

/// The main error type for yolomerge operations.
///
/// Only the variants here are fatal: per-image and per-line problems are
/// recorded in the [`crate::combine::CombineSummary`] instead of aborting
/// the run.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset manifest not found: {path} (a data.yaml declaring class names is required at the dataset root)")]
    ManifestMissing { path: PathBuf },

    #[error("Failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write combined manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse synonym table {path}: {source}")]
    SynonymTableParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    DirRead {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to serialize summary report: {0}")]
    ReportSerialize(#[from] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
