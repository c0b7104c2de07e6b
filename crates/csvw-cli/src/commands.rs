use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use oxrdf::{Graph, Quad};
use oxttl::TurtleParser;
use oxttl::nquads::{NQuadsSerializer, WriterNQuadsSerializer};
use tracing::{debug, info_span};

use csvw_core::{ImportSummary, StatementSink, run_import};
use csvw_ingest::CsvRowSource;
use csvw_metadata::{Metadata, MetadataBuilder, TableDescription};
use csvw_model::ImportOptions;

use crate::cli::{ImportArgs, MetadataArgs};

/// Result of `csvw-rdf import`.
#[derive(Debug)]
pub struct ImportOutcome {
    pub summary: ImportSummary,
    pub skipped: u64,
    pub elapsed: Duration,
    pub output: Option<PathBuf>,
}

pub fn import_options(args: &ImportArgs) -> ImportOptions {
    let mut options = ImportOptions::new()
        .with_base_iri(args.base_iri.as_str())
        .with_strict_property_escaping(args.strict_property_escaping)
        .with_relax_column_count(args.relax_column_count)
        .with_skip_lines_with_error(args.skip_lines_with_error)
        .with_trim_headers(args.trim_headers);
    if let Some(timezone) = &args.timezone {
        options = options.with_timezone(timezone.as_str());
    }
    if let Some(graph) = &args.graph {
        options = options.with_graph_name(graph.as_str());
    }
    options
}

pub fn run_import_command(args: &ImportArgs) -> Result<ImportOutcome> {
    let options = import_options(args);
    let span = info_span!("import", csv = %args.csv.display(), base_iri = %options.base_iri);
    let _guard = span.enter();
    let started = Instant::now();

    let description = args
        .metadata
        .as_deref()
        .map(|path| load_description(path, &options.base_iri))
        .transpose()?;
    let metadata = Arc::new(
        Metadata::parse(description.as_ref(), &options)
            .context("resolve schema description")?,
    );
    let mut source = CsvRowSource::from_path(&args.csv, &metadata.dialect, &options)
        .with_context(|| format!("open {}", args.csv.display()))?;

    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut sink = NQuadsSink::new(writer);
    let summary = run_import(metadata, source.by_ref(), &mut sink, None)
        .with_context(|| format!("import {}", args.csv.display()))?;
    sink.finish().context("flush output")?;

    Ok(ImportOutcome {
        summary,
        skipped: source.skipped(),
        elapsed: started.elapsed(),
        output: args.output.clone(),
    })
}

/// Reads a Turtle (or N-Triples) schema description.
pub fn load_description(path: &Path, base_iri: &str) -> Result<Graph> {
    let file = File::open(path)
        .with_context(|| format!("open schema description {}", path.display()))?;
    let mut parser = TurtleParser::new();
    if !base_iri.is_empty() {
        parser = parser
            .with_base_iri(base_iri)
            .with_context(|| format!("invalid base IRI '{base_iri}'"))?;
    }
    let mut graph = Graph::new();
    for triple in parser.for_reader(BufReader::new(file)) {
        let triple =
            triple.with_context(|| format!("parse schema description {}", path.display()))?;
        graph.insert(&triple);
    }
    debug!(triples = graph.len(), "loaded schema description");
    Ok(graph)
}

pub fn run_metadata_command(args: &MetadataArgs) -> Result<()> {
    let description = build_description(args)?;
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &description).context("write description")?;
    writeln!(stdout).context("write description")?;
    Ok(())
}

pub fn build_description(args: &MetadataArgs) -> Result<TableDescription> {
    let line = read_header_line(&args.csv)?;
    let base_iri = args
        .base_iri
        .clone()
        .unwrap_or_else(|| default_base_iri(&args.csv));
    let mut builder = MetadataBuilder::new(base_iri);
    if let Some(delimiter) = args.delimiter {
        builder = builder.with_delimiter(delimiter);
    }
    if let Some(about_url) = &args.about_url {
        builder = builder.with_about_url(about_url.as_str());
    }
    if let Some(property_base_iri) = &args.property_base_iri {
        builder = builder.with_property_base_iri(property_base_iri.as_str());
    }
    Ok(builder.from_header_line(&line))
}

fn read_header_line(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut line = String::new();
    let read = BufReader::new(file)
        .read_line(&mut line)
        .with_context(|| format!("read header of {}", path.display()))?;
    if read == 0 {
        bail!("{} is empty", path.display());
    }
    Ok(line.trim_start_matches('\u{feff}').to_string())
}

fn default_base_iri(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    if path.starts_with('/') {
        format!("file://{path}/")
    } else {
        format!("file:///{path}/")
    }
}

/// Writes each accepted batch as N-Quads.
struct NQuadsSink<W: Write> {
    serializer: WriterNQuadsSerializer<W>,
}

impl<W: Write> NQuadsSink<W> {
    fn new(writer: W) -> Self {
        Self {
            serializer: NQuadsSerializer::new().for_writer(writer),
        }
    }

    fn finish(self) -> io::Result<()> {
        self.serializer.finish().flush()
    }
}

impl<W: Write> StatementSink for NQuadsSink<W> {
    type Error = io::Error;

    fn accept(&mut self, batch: Vec<Quad>) -> io::Result<()> {
        for quad in &batch {
            self.serializer.serialize_quad(quad)?;
        }
        Ok(())
    }
}
