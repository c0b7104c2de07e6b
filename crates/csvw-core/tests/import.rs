//! End-to-end tests: schema description and rows in, statements out.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use csvw_core::{
    CancellationToken, ImportError, ImportSummary, StatementSink, Statements, run_import,
};
use csvw_ingest::{CsvRowSource, IngestError};
use csvw_metadata::Metadata;
use csvw_model::vocab::{csvw, xsd};
use csvw_model::{ImportOptions, SourceRow};
use oxrdf::{Graph, Literal, NamedOrBlankNode, Quad, Term};
use oxttl::TurtleParser;

const PREFIXES: &str = "
@prefix csvw: <http://www.w3.org/ns/csvw#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix dc: <http://purl.org/dc/terms/> .
";

const STATIONS: &str = r#"
<http://example.org/meta> csvw:url "stations.csv" ;
  dc:publisher [ dc:name "Weather Lab" ] ;
  csvw:tableSchema [
    csvw:aboutUrl "station/{id}" ;
    csvw:column (
      [ csvw:title "id" ; csvw:suppressOutput "true" ]
      [ csvw:title "name" ; csvw:propertyUrl "http://schema.org/name" ]
      [ csvw:title "height" ; csvw:datatype "number" ; csvw:null "NA" ; csvw:default "0" ]
      [ csvw:title "opened" ; csvw:propertyUrl "http://schema.org/foundingDate" ;
        csvw:datatype [ csvw:base "date" ; csvw:format "dd.MM.yyyy" ] ]
    )
  ] .
"#;

fn metadata(body: Option<&str>, options: &ImportOptions) -> Arc<Metadata> {
    let graph = body.map(|body| {
        let mut graph = Graph::new();
        let document = format!("{PREFIXES}{body}");
        for triple in TurtleParser::new().for_reader(document.as_bytes()) {
            graph.insert(&triple.expect("valid turtle"));
        }
        graph
    });
    Arc::new(Metadata::parse(graph.as_ref(), options).expect("metadata"))
}

fn rows(rows: &[(u64, &[(&str, &str)])]) -> Vec<Result<SourceRow, IngestError>> {
    rows.iter()
        .map(|(line, fields)| Ok(SourceRow::from_pairs(*line, fields.iter().copied())))
        .collect()
}

fn import(metadata: Arc<Metadata>, source: Vec<Result<SourceRow, IngestError>>) -> Vec<Quad> {
    Statements::new(metadata, source.into_iter())
        .collect::<Result<_, _>>()
        .expect("import")
}

/// N-Triples lines with blank nodes renamed in order of appearance.
fn canonical(quads: &[Quad]) -> String {
    let mut labels: HashMap<String, String> = HashMap::new();
    let mut out = String::new();
    for quad in quads {
        let line = format!("{} {} {} .", quad.subject, quad.predicate, quad.object);
        let mut rest = line.as_str();
        while let Some(start) = rest.find("_:") {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 2..];
            let end = tail
                .find(|ch: char| !ch.is_ascii_alphanumeric())
                .unwrap_or(tail.len());
            let next = labels.len();
            let label = labels
                .entry(tail[..end].to_string())
                .or_insert_with(|| format!("b{next}"));
            out.push_str("_:");
            out.push_str(label);
            rest = &tail[end..];
        }
        out.push_str(rest);
        out.push('\n');
    }
    out
}

fn objects<'a>(quads: &'a [Quad], predicate: &str) -> Vec<&'a Term> {
    quads
        .iter()
        .filter(|quad| quad.predicate.as_str() == predicate)
        .map(|quad| &quad.object)
        .collect()
}

#[test]
fn undeclared_columns_end_to_end() {
    let quads = import(
        metadata(None, &ImportOptions::default()),
        rows(&[(2, &[("key0", "value0"), ("key1", "value1")])]),
    );
    insta::assert_snapshot!(canonical(&quads), @r#"
    _:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#TableGroup> .
    _:b0 <http://www.w3.org/ns/csvw#table> _:b1 .
    _:b1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#Table> .
    _:b1 <http://www.w3.org/ns/csvw#url> <> .
    _:b1 <http://www.w3.org/ns/csvw#row> _:b2 .
    _:b2 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#Row> .
    _:b2 <http://www.w3.org/ns/csvw#describes> _:b3 .
    _:b3 <#key0> "value0" .
    _:b3 <#key1> "value1" .
    _:b2 <http://www.w3.org/ns/csvw#rownum> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
    _:b2 <http://www.w3.org/ns/csvw#url> <#row=2> .
    "#);
}

#[test]
fn declared_schema_end_to_end() {
    let options = ImportOptions::new().with_base_iri("http://example.org/data/stations.csv");
    let quads = import(
        metadata(Some(STATIONS), &options),
        rows(&[
            (
                2,
                &[("id", "BER"), ("name", "Bern"), ("height", "553"), ("opened", "01.06.1864")],
            ),
            (
                3,
                &[("id", "ZRH"), ("name", "Zurich"), ("height", "NA"), ("opened", "soon")],
            ),
        ]),
    );
    insta::assert_snapshot!(canonical(&quads), @r#"
    _:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#TableGroup> .
    _:b0 <http://www.w3.org/ns/csvw#table> _:b1 .
    _:b1 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#Table> .
    _:b1 <http://www.w3.org/ns/csvw#url> <http://example.org/data/stations.csv> .
    _:b1 <http://purl.org/dc/terms/publisher> _:b2 .
    _:b2 <http://purl.org/dc/terms/name> "Weather Lab" .
    _:b1 <http://www.w3.org/ns/csvw#row> _:b3 .
    _:b3 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#Row> .
    _:b3 <http://www.w3.org/ns/csvw#describes> <http://example.org/data/station/BER> .
    <http://example.org/data/station/BER> <http://schema.org/name> "Bern" .
    <http://example.org/data/station/BER> <http://example.org/data/stations.csv#height> "553"^^<http://www.w3.org/2001/XMLSchema#double> .
    <http://example.org/data/station/BER> <http://schema.org/foundingDate> "1864-06-01"^^<http://www.w3.org/2001/XMLSchema#date> .
    _:b3 <http://www.w3.org/ns/csvw#rownum> "1"^^<http://www.w3.org/2001/XMLSchema#integer> .
    _:b3 <http://www.w3.org/ns/csvw#url> <http://example.org/data/stations.csv#row=2> .
    _:b1 <http://www.w3.org/ns/csvw#row> _:b4 .
    _:b4 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://www.w3.org/ns/csvw#Row> .
    _:b4 <http://www.w3.org/ns/csvw#describes> <http://example.org/data/station/ZRH> .
    <http://example.org/data/station/ZRH> <http://schema.org/name> "Zurich" .
    <http://example.org/data/station/ZRH> <http://schema.org/foundingDate> "soon"^^<http://www.w3.org/2001/XMLSchema#date> .
    _:b4 <http://www.w3.org/ns/csvw#rownum> "2"^^<http://www.w3.org/2001/XMLSchema#integer> .
    _:b4 <http://www.w3.org/ns/csvw#url> <http://example.org/data/stations.csv#row=3> .
    "#);
}

#[test]
fn row_numbers_count_accepted_rows_and_urls_keep_source_lines() {
    let options = ImportOptions::new()
        .with_base_iri("http://example.org/t.csv")
        .with_skip_lines_with_error(true);
    let metadata = metadata(None, &options);
    let source = CsvRowSource::new(
        "a,b\n1,2\nbroken\n3,4\n\n5,6\n".as_bytes(),
        &metadata.dialect,
        &options,
    )
    .unwrap();
    let quads: Vec<Quad> = Statements::new(metadata, source)
        .collect::<Result<_, _>>()
        .unwrap();

    let rownums: Vec<&str> = objects(&quads, csvw::ROWNUM.as_str())
        .into_iter()
        .map(|term| match term {
            Term::Literal(literal) => literal.value(),
            other => panic!("unexpected rownum {other}"),
        })
        .collect();
    assert_eq!(rownums, ["1", "2", "3"]);

    let urls: Vec<String> = objects(&quads, csvw::URL.as_str())
        .into_iter()
        .skip(1)
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        urls,
        [
            "<http://example.org/t.csv#row=2>",
            "<http://example.org/t.csv#row=4>",
            "<http://example.org/t.csv#row=6>",
        ]
    );
}

#[test]
fn declared_columns_precede_synthesized_ones() {
    let body = r#"<http://example.org/t> csvw:tableSchema [ csvw:column ( [ csvw:title "z" ] ) ] ."#;
    let options = ImportOptions::new().with_base_iri("http://example.org/t.csv");
    let quads = import(
        metadata(Some(body), &options),
        rows(&[(2, &[("b", "1"), ("z", "2"), ("a", "3")])]),
    );
    let predicates: Vec<&str> = quads
        .iter()
        .map(|quad| quad.predicate.as_str())
        .filter(|predicate| predicate.starts_with("http://example.org/t.csv#"))
        .collect();
    assert_eq!(
        predicates,
        [
            "http://example.org/t.csv#z",
            "http://example.org/t.csv#b",
            "http://example.org/t.csv#a",
        ]
    );
}

#[test]
fn unformatted_date_time_falls_back_to_raw_value() {
    let body = r#"<http://example.org/t> csvw:tableSchema [
        csvw:column ( [ csvw:title "at" ; csvw:datatype "datetime" ] ) ] ."#;
    let quads = import(
        metadata(Some(body), &ImportOptions::default()),
        rows(&[(2, &[("at", "not a date")])]),
    );
    assert_eq!(
        objects(&quads, "#at"),
        [&Term::from(Literal::new_typed_literal("not a date", xsd::DATE_TIME))]
    );
}

#[test]
fn timezone_option_applies_to_formatted_values() {
    let body = r#"<http://example.org/t> csvw:tableSchema [
        csvw:column ( [ csvw:title "at" ;
          csvw:datatype [ csvw:base "dateTime" ; csvw:format "yyyyMMdd HHmmss" ] ] ) ] ."#;
    let options = ImportOptions::new().with_timezone("Europe/Zurich");
    let quads = import(
        metadata(Some(body), &options),
        rows(&[(2, &[("at", "20180701 120000")])]),
    );
    assert_eq!(
        objects(&quads, "#at"),
        [&Term::from(Literal::new_typed_literal(
            "2018-07-01T12:00:00+02:00",
            xsd::DATE_TIME
        ))]
    );
}

#[test]
fn rows_without_about_url_get_distinct_subjects() {
    let quads = import(
        metadata(None, &ImportOptions::default()),
        rows(&[(2, &[("a", "1")]), (3, &[("a", "1")])]),
    );
    let described = objects(&quads, csvw::DESCRIBES.as_str());
    assert_eq!(described.len(), 2);
    assert_ne!(described[0], described[1]);
}

#[test]
fn projection_error_ends_the_run_without_partial_row() {
    let body = r#"<http://example.org/t> csvw:tableSchema [
        csvw:column ( [ csvw:title "label" ; csvw:lang "{lang}" ] [ csvw:title "lang" ] ) ] ."#;
    let metadata = metadata(Some(body), &ImportOptions::default());
    let source = rows(&[
        (2, &[("label", "ok"), ("lang", "en")]),
        (3, &[("label", "bad"), ("lang", "not a tag")]),
        (4, &[("label", "never"), ("lang", "en")]),
    ]);
    let mut sink: Vec<Quad> = Vec::new();
    let err = run_import(metadata, source.into_iter(), &mut sink, None).unwrap_err();

    let ImportError::Projection(projection) = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(projection.content_line, 2);
    assert_eq!(err.to_string(), "could not parse content line 2");
    assert_eq!(objects(&sink, csvw::ROWNUM.as_str()).len(), 1);
    assert!(
        sink.iter()
            .all(|quad| !matches!(&quad.object, Term::Literal(l) if l.value() == "bad"))
    );
}

#[test]
fn row_source_error_is_surfaced_after_earlier_rows() {
    let mut source = rows(&[(2, &[("a", "1")])]);
    source.push(Err(IngestError::DuplicateHeader {
        name: "a".to_string(),
    }));
    source.extend(rows(&[(4, &[("a", "2")])]));

    let mut statements = Statements::new(metadata(None, &ImportOptions::default()), source.into_iter());
    let results: Vec<_> = statements.by_ref().collect();
    assert!(matches!(results.last(), Some(Err(ImportError::RowSource(_)))));
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert_eq!(statements.summary().rows, 1);
}

#[test]
fn strict_column_count_fails_the_import() {
    let options = ImportOptions::default();
    let metadata = metadata(None, &options);
    let source = CsvRowSource::new(
        "kzy1,key2\nvalue1_1;value2_1\n".as_bytes(),
        &metadata.dialect,
        &options,
    )
    .unwrap();
    let mut sink = Vec::new();
    let err = run_import(metadata, source, &mut sink, None).unwrap_err();
    assert!(matches!(err, ImportError::RowSource(IngestError::Csv { .. })));
}

#[test]
fn cancellation_stops_between_rows() {
    let token = CancellationToken::new();
    let mut statements = Statements::new(
        metadata(None, &ImportOptions::default()),
        rows(&[(2, &[("a", "1")]), (3, &[("a", "2")])]).into_iter(),
    )
    .with_cancellation(token.clone());

    // scaffold plus the first row
    let first: Vec<Quad> = statements
        .by_ref()
        .take(4 + 6)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(objects(&first, csvw::ROWNUM.as_str()).len(), 1);

    token.cancel();
    assert!(matches!(
        statements.next(),
        Some(Err(ImportError::Cancelled { rows: 1 }))
    ));
    assert!(statements.next().is_none());
}

#[derive(Debug)]
struct Full;

impl fmt::Display for Full {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sink is full")
    }
}

impl std::error::Error for Full {}

/// Accepts a fixed number of batches.
struct BoundedSink {
    batches: Vec<Vec<Quad>>,
    capacity: usize,
}

impl StatementSink for BoundedSink {
    type Error = Full;

    fn accept(&mut self, batch: Vec<Quad>) -> Result<(), Full> {
        if self.batches.len() == self.capacity {
            return Err(Full);
        }
        self.batches.push(batch);
        Ok(())
    }
}

#[test]
fn sink_sees_whole_rows_and_its_errors_end_the_run() {
    let mut sink = BoundedSink {
        batches: Vec::new(),
        capacity: 2,
    };
    let err = run_import(
        metadata(None, &ImportOptions::default()),
        rows(&[(2, &[("a", "1"), ("b", "2")]), (3, &[("a", "3"), ("b", "4")])]).into_iter(),
        &mut sink,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ImportError::Sink(_)));
    // scaffold, then the first row as a single batch
    assert_eq!(sink.batches.len(), 2);
    assert_eq!(sink.batches[0].len(), 4);
    assert_eq!(sink.batches[1].len(), 7);
}

#[test]
fn concurrent_runs_share_metadata_but_not_nodes() {
    let metadata = metadata(Some(STATIONS), &ImportOptions::new().with_base_iri("http://example.org/s.csv"));
    let results: Vec<(ImportSummary, Vec<Quad>)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let metadata = Arc::clone(&metadata);
                scope.spawn(move || {
                    let mut sink = Vec::new();
                    let summary = run_import(
                        metadata,
                        rows(&[(2, &[("id", "A"), ("name", "a")])]).into_iter(),
                        &mut sink,
                        None,
                    )
                    .unwrap();
                    (summary, sink)
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert_eq!(results[0].0, results[1].0);
    assert_eq!(canonical(&results[0].1), canonical(&results[1].1));
    let table = |quads: &[Quad]| -> NamedOrBlankNode {
        quads
            .iter()
            .find(|quad| quad.predicate.as_str() == csvw::URL.as_str())
            .map(|quad| quad.subject.clone())
            .unwrap()
    };
    assert_ne!(table(&results[0].1), table(&results[1].1));
}

#[test]
fn summary_counts_rows_and_statements() {
    let mut sink = oxrdf::Dataset::new();
    let summary = run_import(
        metadata(None, &ImportOptions::new().with_graph_name("http://example.org/graph")),
        rows(&[(2, &[("a", "1")]), (3, &[("a", "")])]).into_iter(),
        &mut sink,
        None,
    )
    .unwrap();
    assert_eq!(summary.rows, 2);
    // scaffold, a full row, and a row whose only cell is empty
    assert_eq!(summary.statements, 4 + 6 + 5);
    assert_eq!(sink.len(), 15);
    assert!(
        sink.iter()
            .all(|quad| quad.graph_name.to_string() == "<http://example.org/graph>")
    );
}
