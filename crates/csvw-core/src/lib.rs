//! Row-to-graph mapping for CSVW imports.
//!
//! A run takes resolved [`Metadata`](csvw_metadata::Metadata) and a row
//! source and produces an ordered statement stream:
//!
//! 1. the table group and table scaffold plus the table annotations
//! 2. per row: the row node, its described subject, one statement per
//!    projected cell, the row number and the row URL
//!
//! [`RowProjector`] computes the cells of a row, [`GraphEmitter`] drives
//! the per-run state, and [`Statements`] / [`run_import`] connect both to
//! a row source and a consumer.

pub mod emitter;
pub mod error;
pub mod iri;
pub mod pipeline;
pub mod projector;

pub use emitter::{EmitterState, GraphEmitter};
pub use error::{CellError, ImportError, Result, RowProjectionError};
pub use iri::IriResolver;
pub use pipeline::{CancellationToken, ImportSummary, StatementSink, Statements, run_import};
pub use projector::{CellStatement, ColumnPlan, RowContext, RowProjector};
