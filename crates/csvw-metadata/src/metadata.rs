use csvw_model::{Dialect, ImportOptions, TableSchema};
use csvw_transform::DateTimeCoercer;
use oxrdf::{Graph, NamedNode};
use tracing::debug;

use crate::annotations::{Annotation, collect_annotations};
use crate::dialect::parse_dialect;
use crate::error::{Result, SchemaError};
use crate::graph::DescriptionGraph;
use crate::schema::parse_table_schema;

/// Everything an import run needs from its schema description.
///
/// Immutable once parsed; runs share it read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub dialect: Dialect,
    pub table_schema: TableSchema,
    pub annotations: Vec<Annotation>,
    pub coercer: DateTimeCoercer,
    /// Graph every statement is emitted in; `None` for the default graph.
    pub graph_name: Option<NamedNode>,
    pub options: ImportOptions,
}

impl Metadata {
    /// Resolves a schema description. A missing graph yields the defaults:
    /// standard dialect, no declared columns and fresh row subjects.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`](crate::SchemaError) for malformed templates,
    /// dialect values, datatypes, a graph name that is not an IRI or an
    /// unknown timezone option.
    pub fn parse<G: DescriptionGraph + ?Sized>(
        graph: Option<&G>,
        options: &ImportOptions,
    ) -> Result<Self> {
        let coercer = DateTimeCoercer::new(options.timezone.as_deref())?;
        let graph_name = options
            .graph_name
            .as_deref()
            .map(|name| {
                NamedNode::new(name).map_err(|source| SchemaError::GraphName {
                    value: name.to_string(),
                    source,
                })
            })
            .transpose()?;
        let Some(graph) = graph else {
            debug!("no schema description, using defaults");
            return Ok(Self {
                dialect: Dialect::default(),
                table_schema: TableSchema::default(),
                annotations: Vec::new(),
                coercer,
                graph_name,
                options: options.clone(),
            });
        };

        let dialect = parse_dialect(graph)?;
        let table_schema = parse_table_schema(graph, options)?;
        let annotations = collect_annotations(graph);
        debug!(
            columns = table_schema.columns.len(),
            has_about_url = table_schema.about_url.is_some(),
            delimiter = %dialect.delimiter.escape_debug(),
            quoting = dialect.quote_char.is_some(),
            annotations = annotations.len(),
            "resolved schema description"
        );

        Ok(Self {
            dialect,
            table_schema,
            annotations,
            coercer,
            graph_name,
            options: options.clone(),
        })
    }

    /// Metadata for a run without a schema description.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Timezone`](crate::SchemaError::Timezone) for
    /// an unknown timezone option.
    pub fn from_options(options: &ImportOptions) -> Result<Self> {
        Self::parse::<Graph>(None, options)
    }

    pub fn base_iri(&self) -> &str {
        &self.options.base_iri
    }
}
