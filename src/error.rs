//! Error types. Not-found and missing-slot conditions are answers, not errors;
//! these cover ingestion and the classifier boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Failure reading one catalog or recipe source file. Loaders log and skip.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Error)]
pub enum GlossaryError {
    #[error("glossary IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glossary parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Classifier collaborator failures. Callers degrade these to the unknown intent.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("API error: {0}")]
    Api(String),
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("classification timeout")]
    Timeout,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unparsable classifier output: {0}")]
    Format(String),
}
