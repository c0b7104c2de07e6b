//! Tests for the CSV row source.

use std::io::Write;

use csvw_ingest::{CsvRowSource, IngestError, RowSource};
use csvw_model::{Dialect, ImportOptions, SourceRow};

fn rows(input: &str, dialect: &Dialect, options: &ImportOptions) -> Vec<Result<SourceRow, IngestError>> {
    CsvRowSource::new(input.as_bytes(), dialect, options)
        .expect("header")
        .collect()
}

fn ok_rows(input: &str, dialect: &Dialect, options: &ImportOptions) -> Vec<SourceRow> {
    rows(input, dialect, options)
        .into_iter()
        .map(|row| row.expect("row"))
        .collect()
}

#[test]
fn rows_are_keyed_by_header_with_source_lines() {
    let rows = ok_rows("key0,key1\nvalue0,value1\n\nvalue2,value3\n", &Dialect::default(), &ImportOptions::default());
    assert_eq!(
        rows,
        [
            SourceRow::from_pairs(2, [("key0", "value0"), ("key1", "value1")]),
            SourceRow::from_pairs(4, [("key0", "value2"), ("key1", "value3")]),
        ]
    );
}

#[test]
fn quoted_fields_span_lines() {
    let rows = ok_rows("a,b\n\"x\ny\",z\nlast,row\n", &Dialect::default(), &ImportOptions::default());
    assert_eq!(rows[0].fields["a"], "x\ny");
    assert_eq!(rows[1].source_line, 4);
}

#[test]
fn column_count_mismatch_is_an_error() {
    let rows = rows("kzy1,key2\nvalue1_1;value2_1\n", &Dialect::default(), &ImportOptions::default());
    assert_eq!(rows.len(), 1);
    assert!(matches!(
        &rows[0],
        Err(IngestError::Csv {
            source_line: Some(2),
            ..
        })
    ));
}

#[test]
fn error_ends_the_source() {
    let rows = rows("a,b\n1\n2,3\n", &Dialect::default(), &ImportOptions::default());
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_err());
}

#[test]
fn lenient_mode_skips_malformed_records() {
    let options = ImportOptions::default().with_skip_lines_with_error(true);
    let mut source = CsvRowSource::new("a,b\n1,2\n3\n4,5\n".as_bytes(), &Dialect::default(), &options).unwrap();
    let first = source.next_row().unwrap().unwrap();
    let second = source.next_row().unwrap().unwrap();
    assert!(source.next_row().is_none());
    assert_eq!(first.source_line, 2);
    assert_eq!(second.source_line, 4);
    assert_eq!(second.fields["a"], "4");
    assert_eq!(source.skipped(), 1);
}

#[test]
fn relaxed_column_count_keeps_present_fields() {
    let options = ImportOptions::default().with_relax_column_count(true);
    let rows = ok_rows("a,b,c\n1,2\n3,4,5,6\n", &Dialect::default(), &options);
    assert_eq!(rows[0].fields.len(), 2);
    assert!(!rows[0].fields.contains_key("c"));
    assert_eq!(rows[1].fields.len(), 3);
    assert_eq!(rows[1].fields["c"], "5");
}

#[test]
fn dialect_delimiter_and_disabled_quoting() {
    let dialect = Dialect {
        delimiter: ';',
        quote_char: None,
        line_terminators: None,
    };
    let rows = ok_rows("a;b\n\"x;y\n", &dialect, &ImportOptions::default());
    assert_eq!(rows[0].fields["a"], "\"x");
    assert_eq!(rows[0].fields["b"], "y");
}

#[test]
fn custom_quote_character() {
    let dialect = Dialect {
        quote_char: Some('\''),
        ..Dialect::default()
    };
    let rows = ok_rows("a,b\n'1,5',2\n", &dialect, &ImportOptions::default());
    assert_eq!(rows[0].fields["a"], "1,5");
}

#[test]
fn single_byte_line_terminator() {
    let dialect = Dialect {
        line_terminators: Some(vec!["|".to_string()]),
        ..Dialect::default()
    };
    let rows = ok_rows("a,b|1,2|3,4|", &dialect, &ImportOptions::default());
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].fields["b"], "4");
}

#[test]
fn header_trimming_and_bom() {
    let options = ImportOptions::default().with_trim_headers(true);
    let rows = ok_rows("\u{feff}id , name \n1,Ann\n", &Dialect::default(), &options);
    assert_eq!(rows[0].fields.keys().collect::<Vec<_>>(), ["id", "name"]);
}

#[test]
fn duplicate_headers_are_rejected() {
    let result = CsvRowSource::new("a,a\n1,2\n".as_bytes(), &Dialect::default(), &ImportOptions::default());
    assert!(matches!(result, Err(IngestError::DuplicateHeader { name }) if name == "a"));
}

#[test]
fn non_ascii_delimiter_is_unsupported() {
    let dialect = Dialect {
        delimiter: '§',
        ..Dialect::default()
    };
    let result = CsvRowSource::new("a§b\n".as_bytes(), &dialect, &ImportOptions::default());
    assert!(matches!(
        result,
        Err(IngestError::UnsupportedDialect {
            property: "delimiter",
            ..
        })
    ));
}

#[test]
fn reads_from_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "id,label").unwrap();
    writeln!(file, "1,one").unwrap();
    let source = CsvRowSource::from_path(file.path(), &Dialect::default(), &ImportOptions::default()).unwrap();
    assert_eq!(source.headers(), ["id", "label"]);
    let rows: Vec<SourceRow> = source.map(Result::unwrap).collect();
    assert_eq!(rows.len(), 1);
}

#[test]
fn missing_file_is_an_io_error() {
    let result = CsvRowSource::from_path(
        std::path::Path::new("/definitely/not/here.csv"),
        &Dialect::default(),
        &ImportOptions::default(),
    );
    assert!(matches!(result, Err(IngestError::Io { .. })));
}
