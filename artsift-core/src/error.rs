//! Error types for the artsift core library.
//!
//! Uses `thiserror` with a clear split between caller contract violations
//! (surfaced immediately) and per-item transport faults (absorbed by the
//! verifier, never visible to the caller).

use thiserror::Error;

/// Top-level error type for the artsift core library.
#[derive(Debug, Error)]
pub enum ArtsiftError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Contract violations in configuration or mode selection.
///
/// Fatal and raised immediately; nothing here is retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid source '{given}': must be either 'met' or 'europeana'")]
    InvalidSource { given: String },

    #[error("max_in_flight must be at least 1")]
    ZeroConcurrency,

    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Structural problems with a dataset handed to the pipeline.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("required column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("row {row} has {found} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
}

/// Transport-level faults inside the per-item verifier.
///
/// These never cross the pipeline boundary: the verifier absorbs them and
/// reports the affected item as absent.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
