//! Dialect-driven CSV tokenizing.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ErrorKind, Position, ReaderBuilder, StringRecord, Terminator, Trim};
use tracing::{debug, warn};

use csvw_model::{Dialect, ImportOptions, SourceRow};

use crate::error::{IngestError, Result};

/// Terminators the default reader already recognises.
const STANDARD_TERMINATORS: [&str; 3] = ["\n", "\r\n", "\r"];

/// Reads header-keyed rows from delimited text.
///
/// The first record is the header. Empty lines are skipped. Each row
/// reports the line its record starts on, so skipped records never shift
/// later line numbers.
pub struct CsvRowSource<R> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    record: StringRecord,
    skip_lines_with_error: bool,
    skipped: u64,
    done: bool,
}

impl CsvRowSource<File> {
    /// Opens `path` and reads its header.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Io`] when the file cannot be opened, or any
    /// error of [`CsvRowSource::new`].
    pub fn from_path(path: &Path, dialect: &Dialect, options: &ImportOptions) -> Result<Self> {
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file, dialect, options)
    }
}

impl<R: io::Read> CsvRowSource<R> {
    /// Wraps `input` and reads its header.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UnsupportedDialect`] for delimiters, quote
    /// characters or terminators the tokenizer cannot express,
    /// [`IngestError::Csv`] when the header cannot be read and
    /// [`IngestError::DuplicateHeader`] for repeated column names.
    pub fn new(input: R, dialect: &Dialect, options: &ImportOptions) -> Result<Self> {
        let mut builder = ReaderBuilder::new();
        builder
            .has_headers(true)
            .delimiter(ascii_byte("delimiter", dialect.delimiter)?)
            .terminator(terminator(dialect.line_terminators.as_deref())?)
            .flexible(options.relax_column_count);
        match dialect.quote_char {
            Some(quote) => {
                builder.quote(ascii_byte("quoteChar", quote)?);
            }
            None => {
                builder.quoting(false);
            }
        }
        if options.trim_headers {
            builder.trim(Trim::Headers);
        }

        let mut reader = builder.from_reader(input);
        let headers = normalize_headers(reader.headers().map_err(|source| IngestError::Csv {
            source_line: Some(1),
            source,
        })?)?;
        debug!(columns = headers.len(), "read header");

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            skip_lines_with_error: options.skip_lines_with_error,
            skipped: 0,
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of malformed records skipped so far in lenient mode.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: io::Read> Iterator for CsvRowSource<R> {
    type Item = Result<SourceRow>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.reader.read_record(&mut self.record) {
                Ok(false) => self.done = true,
                Ok(true) => {
                    let source_line = self.record.position().map_or(0, Position::line);
                    let fields = self
                        .headers
                        .iter()
                        .zip(self.record.iter())
                        .map(|(key, value)| (key.clone(), value.to_string()))
                        .collect();
                    return Some(Ok(SourceRow::new(source_line, fields)));
                }
                Err(source) => {
                    let source_line = source.position().map(Position::line);
                    if self.skip_lines_with_error && is_record_error(&source) {
                        self.skipped += 1;
                        warn!(source_line, error = %source, "skipping malformed record");
                        continue;
                    }
                    self.done = true;
                    return Some(Err(IngestError::Csv {
                        source_line,
                        source,
                    }));
                }
            }
        }
        None
    }
}

/// Errors confined to one record; the reader can continue after them.
fn is_record_error(error: &csv::Error) -> bool {
    matches!(
        error.kind(),
        ErrorKind::UnequalLengths { .. } | ErrorKind::Utf8 { .. }
    )
}

fn normalize_headers(record: &StringRecord) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut headers = Vec::with_capacity(record.len());
    for (idx, raw) in record.iter().enumerate() {
        let name = if idx == 0 {
            raw.trim_start_matches('\u{feff}')
        } else {
            raw
        };
        if !seen.insert(name) {
            return Err(IngestError::DuplicateHeader {
                name: name.to_string(),
            });
        }
        headers.push(name.to_string());
    }
    Ok(headers)
}

fn ascii_byte(property: &'static str, ch: char) -> Result<u8> {
    u8::try_from(ch)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| IngestError::UnsupportedDialect {
            property,
            value: ch.to_string(),
            reason: "must be a single ASCII character",
        })
}

fn terminator(terminators: Option<&[String]>) -> Result<Terminator> {
    let Some(terminators) = terminators else {
        return Ok(Terminator::CRLF);
    };
    if terminators
        .iter()
        .all(|term| STANDARD_TERMINATORS.contains(&term.as_str()))
    {
        return Ok(Terminator::CRLF);
    }
    match terminators {
        [single] if single.len() == 1 && single.is_ascii() => Ok(Terminator::Any(single.as_bytes()[0])),
        _ => Err(IngestError::UnsupportedDialect {
            property: "lineTerminators",
            value: terminators.join(" "),
            reason: "only the standard line endings or one single-byte terminator are supported",
        }),
    }
}
