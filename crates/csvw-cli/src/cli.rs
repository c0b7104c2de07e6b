//! CLI argument definitions for `csvw-rdf`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "csvw-rdf",
    version,
    about = "Convert CSV files to RDF using CSVW metadata",
    long_about = "Convert CSV files to RDF using CSVW metadata.\n\n\
                  Rows are mapped to statements following the table schema of a\n\
                  Turtle schema description and written as N-Quads."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a CSV file to N-Quads.
    Import(ImportArgs),

    /// Draft a CSVW JSON description from the header line of a CSV file.
    Metadata(MetadataArgs),
}

#[derive(Parser)]
pub struct ImportArgs {
    /// CSV file to convert.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Turtle or N-Triples schema description.
    #[arg(long = "metadata", value_name = "TTL")]
    pub metadata: Option<PathBuf>,

    /// Base IRI for relative templates and the table and row URLs.
    #[arg(long = "base-iri", value_name = "IRI", default_value = "")]
    pub base_iri: String,

    /// Zone for date/time values without an offset (UTC, +02:00, Europe/Zurich).
    #[arg(long = "timezone", value_name = "ZONE")]
    pub timezone: Option<String>,

    /// Also percent-encode `-` in generated property IRIs.
    #[arg(long = "strict-property-escaping")]
    pub strict_property_escaping: bool,

    /// Accept records whose field count differs from the header.
    #[arg(long = "relax-column-count")]
    pub relax_column_count: bool,

    /// Skip malformed records instead of stopping.
    #[arg(long = "skip-lines-with-error")]
    pub skip_lines_with_error: bool,

    /// Trim whitespace around header names.
    #[arg(long = "trim-headers")]
    pub trim_headers: bool,

    /// Write every statement into this named graph.
    #[arg(long = "graph", value_name = "IRI")]
    pub graph: Option<String>,

    /// Output file (default: stdout).
    #[arg(long = "output", short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct MetadataArgs {
    /// CSV file whose header line is read.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Base IRI for the aboutUrl and the properties (default: file:///<CSV>/).
    #[arg(long = "base-iri", value_name = "IRI")]
    pub base_iri: Option<String>,

    /// Enforce a delimiter instead of detecting comma or tab.
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Use this aboutUrl template instead of one keyed on the first column.
    #[arg(long = "about-url", value_name = "TEMPLATE")]
    pub about_url: Option<String>,

    /// Use a different base IRI for properties.
    #[arg(long = "property-base-iri", value_name = "IRI")]
    pub property_base_iri: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
