//! Error types for row ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading rows from a tabular source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A record could not be tokenized.
    #[error("malformed record at line {}: {source}", line_label(.source_line))]
    Csv {
        source_line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    /// The dialect asks for something the tokenizer cannot do.
    #[error("unsupported dialect {property} '{value}': {reason}")]
    UnsupportedDialect {
        property: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Failed to open the source.
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two header cells share a name, so one column would shadow the other.
    #[error("duplicate column '{name}' in header")]
    DuplicateHeader { name: String },
}

fn line_label(line: &Option<u64>) -> String {
    line.map_or_else(|| "?".to_string(), |line| line.to_string())
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
