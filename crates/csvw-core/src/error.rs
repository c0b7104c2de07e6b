//! Errors raised while projecting rows and driving an import run.

use std::error::Error as StdError;

use csvw_ingest::IngestError;
use oxiri::IriParseError;
use oxrdf::LanguageTagParseError;
use thiserror::Error;

/// Why a single cell could not be turned into a statement.
#[derive(Debug, Error)]
pub enum CellError {
    #[error("'{iri}' does not resolve to a valid IRI")]
    InvalidIri {
        iri: String,
        #[source]
        source: IriParseError,
    },

    #[error("invalid language tag '{tag}'")]
    InvalidLanguageTag {
        tag: String,
        #[source]
        source: LanguageTagParseError,
    },
}

/// A row whose columns could not be projected. Ends the run.
#[derive(Debug, Error)]
#[error("could not parse content line {content_line}")]
pub struct RowProjectionError {
    /// 1-based count of accepted rows, including the failed one.
    pub content_line: u64,
    #[source]
    pub cause: CellError,
}

/// Terminal failure of an import run.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Projection(#[from] RowProjectionError),

    #[error("row source failed")]
    RowSource(#[from] IngestError),

    #[error("statement sink rejected a batch")]
    Sink(#[source] Box<dyn StdError + Send + Sync>),

    #[error("import cancelled after {rows} rows")]
    Cancelled { rows: u64 },

    #[error("the emitter has not emitted its table scaffold")]
    NotOpened,

    #[error("the emitter is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_error_keeps_its_cause() {
        let err = RowProjectionError {
            content_line: 3,
            cause: CellError::InvalidLanguageTag {
                tag: "not a tag".to_string(),
                source: oxrdf::Literal::new_language_tagged_literal("x", "not a tag")
                    .unwrap_err(),
            },
        };
        assert_eq!(err.to_string(), "could not parse content line 3");
        let cause = err.source().expect("cause");
        assert_eq!(cause.to_string(), "invalid language tag 'not a tag'");
    }

    #[test]
    fn import_error_is_transparent_for_projection() {
        let err = ImportError::from(RowProjectionError {
            content_line: 1,
            cause: CellError::InvalidIri {
                iri: "::".to_string(),
                source: oxiri::Iri::parse("::".to_string()).unwrap_err(),
            },
        });
        assert_eq!(err.to_string(), "could not parse content line 1");
    }
}
