//! Driving a run from a row source to a consumer.
//!
//! Two shapes are offered:
//!
//! 1. **[`Statements`]**: a pull iterator. The next row is read only after
//!    every statement of the current row has been taken.
//! 2. **[`run_import`]**: pushes each row's statements to a
//!    [`StatementSink`] as one batch, so a sink never sees a partial row.
//!
//! Both check an optional [`CancellationToken`] before pulling a row.

use std::collections::VecDeque;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use csvw_ingest::RowSource;
use csvw_metadata::Metadata;
use oxrdf::{Dataset, Quad};
use tracing::info;

use crate::emitter::{EmitterState, GraphEmitter};
use crate::error::{ImportError, Result};

/// Shared flag to stop a run between rows.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Counters of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: u64,
    pub statements: u64,
}

// ============================================================================
// Pull iterator
// ============================================================================

/// The statements of one run, produced lazily.
///
/// Yields the scaffold first, then each row's statements. After the first
/// error the iterator is exhausted.
pub struct Statements<S> {
    emitter: GraphEmitter,
    source: S,
    pending: VecDeque<Quad>,
    cancellation: Option<CancellationToken>,
    finished: bool,
}

impl<S: RowSource> Statements<S> {
    pub fn new(metadata: Arc<Metadata>, source: S) -> Self {
        Self {
            emitter: GraphEmitter::new(metadata),
            source,
            pending: VecDeque::new(),
            cancellation: None,
            finished: false,
        }
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn emitter(&self) -> &GraphEmitter {
        &self.emitter
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            rows: self.emitter.rows(),
            statements: self.emitter.statements(),
        }
    }

    fn fail(&mut self, err: ImportError) -> Option<Result<Quad>> {
        self.finished = true;
        self.emitter.close();
        Some(Err(err))
    }
}

impl<S: RowSource> Iterator for Statements<S> {
    type Item = Result<Quad>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(quad) = self.pending.pop_front() {
                return Some(Ok(quad));
            }
            if self.finished {
                return None;
            }
            if self.emitter.state() == EmitterState::Start {
                self.pending.extend(self.emitter.open());
                continue;
            }
            if is_cancelled(self.cancellation.as_ref()) {
                let rows = self.emitter.rows();
                return self.fail(ImportError::Cancelled { rows });
            }
            match self.source.next_row() {
                None => {
                    self.finished = true;
                    self.emitter.close();
                    info!(
                        rows = self.emitter.rows(),
                        statements = self.emitter.statements(),
                        "import finished"
                    );
                }
                Some(Err(err)) => return self.fail(err.into()),
                Some(Ok(row)) => match self.emitter.emit_row(&row) {
                    Ok(batch) => self.pending.extend(batch),
                    Err(err) => return self.fail(err),
                },
            }
        }
    }
}

// ============================================================================
// Push driver
// ============================================================================

/// Receives the statements of a run, one row at a time.
pub trait StatementSink {
    type Error: StdError + Send + Sync + 'static;

    /// Accepts the statements of one row, or of the table scaffold.
    fn accept(&mut self, batch: Vec<Quad>) -> std::result::Result<(), Self::Error>;
}

impl StatementSink for Vec<Quad> {
    type Error = Infallible;

    fn accept(&mut self, batch: Vec<Quad>) -> std::result::Result<(), Self::Error> {
        self.extend(batch);
        Ok(())
    }
}

impl StatementSink for Dataset {
    type Error = Infallible;

    fn accept(&mut self, batch: Vec<Quad>) -> std::result::Result<(), Self::Error> {
        for quad in &batch {
            self.insert(quad);
        }
        Ok(())
    }
}

/// Runs one import, handing every row's statements to `sink` before the
/// next row is read.
///
/// # Errors
///
/// Ends at the first failing row, row source error, sink error or
/// cancellation. Batches accepted before the failure stay with the sink.
pub fn run_import<S, K>(
    metadata: Arc<Metadata>,
    mut source: S,
    sink: &mut K,
    cancellation: Option<&CancellationToken>,
) -> Result<ImportSummary>
where
    S: RowSource,
    K: StatementSink + ?Sized,
{
    let mut emitter = GraphEmitter::new(metadata);
    deliver(sink, emitter.open())?;
    loop {
        if is_cancelled(cancellation) {
            emitter.close();
            return Err(ImportError::Cancelled {
                rows: emitter.rows(),
            });
        }
        let row = match source.next_row() {
            None => break,
            Some(row) => row.inspect_err(|_| emitter.close())?,
        };
        let batch = emitter.emit_row(&row)?;
        if let Err(err) = deliver(sink, batch) {
            emitter.close();
            return Err(err);
        }
    }
    emitter.close();

    let summary = ImportSummary {
        rows: emitter.rows(),
        statements: emitter.statements(),
    };
    info!(
        rows = summary.rows,
        statements = summary.statements,
        "import finished"
    );
    Ok(summary)
}

fn deliver<K: StatementSink + ?Sized>(sink: &mut K, batch: Vec<Quad>) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    sink.accept(batch)
        .map_err(|err| ImportError::Sink(Box::new(err)))
}

fn is_cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}
