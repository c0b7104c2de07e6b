//! Row sources for CSVW imports.
//!
//! A row source yields [`SourceRow`]s: header-keyed fields plus the line
//! each record came from. Any iterator of `Result<SourceRow, IngestError>`
//! is a row source; [`CsvRowSource`] tokenizes delimited text according to
//! a resolved [`Dialect`](csvw_model::Dialect).

pub mod csv_source;
pub mod error;

pub use csv_source::CsvRowSource;
pub use error::{IngestError, Result};

use csvw_model::SourceRow;

/// Pull-based supplier of rows, consumed one at a time.
pub trait RowSource {
    /// The next row, an error, or `None` once the source is exhausted.
    fn next_row(&mut self) -> Option<Result<SourceRow>>;
}

impl<I> RowSource for I
where
    I: Iterator<Item = Result<SourceRow>>,
{
    fn next_row(&mut self) -> Option<Result<SourceRow>> {
        self.next()
    }
}
