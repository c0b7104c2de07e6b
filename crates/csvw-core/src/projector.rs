//! Per-row projection of the column plan into cell statements.
//!
//! The plan is the declared columns plus one synthesized string column per
//! row field no declared column covers. Synthesized columns are derived
//! from the first row of a run and then frozen: keys that only appear in
//! later rows never become columns.

use std::sync::Arc;

use csvw_metadata::Metadata;
use csvw_model::{ColumnSpec, Fields, PropertyUrl, SourceRow, TemplateVars, reserved};
use csvw_transform::TemporalKind;
use oxrdf::{Literal, NamedNode, Term};
use tracing::{debug, trace};

use crate::error::{CellError, RowProjectionError};
use crate::iri::IriResolver;

// ============================================================================
// Template contexts
// ============================================================================

/// Row fields plus the `_row` and `_sourceRow` keys.
#[derive(Debug)]
pub struct RowContext<'r> {
    fields: &'r Fields,
    content_line: u64,
    row: String,
    source_row: String,
}

impl<'r> RowContext<'r> {
    pub fn new(content_line: u64, row: &'r SourceRow) -> Self {
        Self {
            fields: &row.fields,
            content_line,
            row: content_line.to_string(),
            source_row: row.source_line.to_string(),
        }
    }

    pub fn content_line(&self) -> u64 {
        self.content_line
    }

    pub fn fields(&self) -> &'r Fields {
        self.fields
    }
}

impl TemplateVars for RowContext<'_> {
    fn var(&self, name: &str) -> Option<&str> {
        match name {
            reserved::ROW => Some(&self.row),
            reserved::SOURCE_ROW => Some(&self.source_row),
            _ => self.fields.var(name),
        }
    }
}

/// The row context plus `_name` and `_column` of the column being projected.
struct CellContext<'c> {
    row: &'c RowContext<'c>,
    name: &'c str,
    column: String,
}

impl TemplateVars for CellContext<'_> {
    fn var(&self, name: &str) -> Option<&str> {
        match name {
            reserved::NAME => Some(self.name),
            reserved::COLUMN => Some(&self.column),
            _ => self.row.var(name),
        }
    }
}

// ============================================================================
// Column plan
// ============================================================================

/// The columns a run projects, resolved once from its first row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPlan {
    /// Only the declared columns; no row seen yet.
    Unresolved(Vec<ColumnSpec>),
    /// Declared columns followed by the synthesized ones.
    Resolved(Vec<ColumnSpec>),
}

impl ColumnPlan {
    pub fn new(declared: &[ColumnSpec]) -> Self {
        Self::Unresolved(declared.to_vec())
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        match self {
            Self::Unresolved(columns) | Self::Resolved(columns) => columns,
        }
    }

    /// Adds a column for every key of `fields` that is neither covered by
    /// a declared title nor reserved, in field order. Does nothing once
    /// resolved.
    pub fn resolve(&mut self, fields: &Fields, metadata: &Metadata) -> &[ColumnSpec] {
        if let Self::Unresolved(declared) = self {
            let mut columns = std::mem::take(declared);
            let declared_count = columns.len();
            let table_property_url = metadata.table_schema.property_url.as_ref();
            let options = &metadata.options;
            let synthesized: Vec<ColumnSpec> = fields
                .keys()
                .filter(|key| !reserved::is_reserved(key))
                .filter(|key| !columns.iter().any(|column| column.covers(key)))
                .map(|key| {
                    ColumnSpec::synthesized(
                        key,
                        PropertyUrl::inherited_or_default(
                            table_property_url,
                            &options.base_iri,
                            key,
                            options.strict_property_escaping,
                        ),
                    )
                })
                .collect();
            columns.extend(synthesized);
            debug!(
                declared = declared_count,
                synthesized = columns.len() - declared_count,
                "resolved column plan"
            );
            *self = Self::Resolved(columns);
        }
        self.columns()
    }
}

// ============================================================================
// Projection
// ============================================================================

/// One column's contribution to a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStatement {
    /// `None` means the row's described subject.
    pub subject: Option<NamedNode>,
    pub predicate: NamedNode,
    pub object: Term,
}

/// Computes the cell statements of each row against a shared schema.
///
/// Owns the column plan of one run; create one projector per run.
#[derive(Debug)]
pub struct RowProjector {
    metadata: Arc<Metadata>,
    resolver: IriResolver,
    plan: ColumnPlan,
}

impl RowProjector {
    pub fn new(metadata: Arc<Metadata>) -> Self {
        let resolver = IriResolver::new(metadata.base_iri());
        let plan = ColumnPlan::new(&metadata.table_schema.columns);
        Self {
            metadata,
            resolver,
            plan,
        }
    }

    pub fn plan(&self) -> &ColumnPlan {
        &self.plan
    }

    pub fn resolver(&self) -> &IriResolver {
        &self.resolver
    }

    /// Projects every column of the plan for one row, dropping columns
    /// without a value. Resolves the plan on the first call.
    ///
    /// # Errors
    ///
    /// Returns [`RowProjectionError`] when a template fills to an invalid
    /// IRI or language tag. No statement of the row should be emitted then.
    pub fn project(&mut self, row: &RowContext<'_>) -> Result<Vec<CellStatement>, RowProjectionError> {
        let columns = self.plan.resolve(row.fields(), &self.metadata);
        let mut statements = Vec::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            let cell = CellContext {
                row,
                name: &column.name,
                column: (idx + 1).to_string(),
            };
            let projected = project_cell(column, &cell, &self.resolver, &self.metadata)
                .map_err(|cause| RowProjectionError {
                    content_line: row.content_line(),
                    cause,
                })?;
            statements.extend(projected);
        }
        Ok(statements)
    }
}

fn project_cell(
    column: &ColumnSpec,
    cell: &CellContext<'_>,
    resolver: &IriResolver,
    metadata: &Metadata,
) -> Result<Option<CellStatement>, CellError> {
    let Some(object) = cell_value(column, cell, resolver, metadata)? else {
        return Ok(None);
    };
    let subject = column
        .about_url
        .as_ref()
        .map(|template| resolver.resolve(&template.expand(cell)))
        .transpose()?;
    let predicate = resolver.resolve(&column.property_url.expand(cell))?;
    trace!(column = %column.name, %predicate, %object, "projected cell");
    Ok(Some(CellStatement {
        subject,
        predicate,
        object,
    }))
}

fn cell_value(
    column: &ColumnSpec,
    cell: &CellContext<'_>,
    resolver: &IriResolver,
    metadata: &Metadata,
) -> Result<Option<Term>, CellError> {
    if column.suppress_output {
        return Ok(None);
    }
    if let Some(value_url) = &column.value_url {
        return resolver.resolve(&value_url.expand(cell)).map(|node| Some(node.into()));
    }

    let mut value = column.raw_value(cell);
    if value == Some("")
        && let Some(default) = column.default_value.as_deref().filter(|d| !d.is_empty())
    {
        value = Some(default);
    }
    let Some(value) = value.filter(|value| !value.is_empty() && *value != column.null_value) else {
        return Ok(None);
    };

    let datatype = &column.datatype;
    let lexical = match (
        TemporalKind::from_datatype(datatype.base.as_str()),
        datatype.format.as_deref(),
    ) {
        (Some(kind), Some(format)) => match metadata.coercer.coerce(value, Some(format)) {
            Ok(instant) => instant.render(kind),
            Err(failure) => {
                debug!(column = %column.name, %failure, "keeping raw date/time value");
                value.to_string()
            }
        },
        _ => value.to_string(),
    };

    let language = column
        .language
        .as_ref()
        .map(|template| template.expand(cell).to_lowercase())
        .filter(|tag| !tag.is_empty());
    let literal = match language {
        Some(tag) => Literal::new_language_tagged_literal(lexical, &tag)
            .map_err(|source| CellError::InvalidLanguageTag { tag, source })?,
        None => Literal::new_typed_literal(lexical, datatype.base.clone()),
    };
    Ok(Some(literal.into()))
}
