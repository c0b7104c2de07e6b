//! Statement emission for one import run.

use std::collections::HashMap;
use std::sync::Arc;

use csvw_metadata::{Annotation, Metadata};
use csvw_model::SourceRow;
use csvw_model::vocab::{csvw, rdf, xsd};
use oxrdf::{BlankNode, GraphName, Literal, NamedNode, NamedOrBlankNode, Quad, Term};
use tracing::{debug, debug_span};

use crate::error::{ImportError, Result, RowProjectionError};
use crate::projector::{RowContext, RowProjector};

/// Lifecycle of a [`GraphEmitter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterState {
    Start,
    GroupEmitted,
    TableEmitted,
    RowLoop,
    Closed,
}

/// Turns the rows of one run into statements.
///
/// Each emitter allocates its own group, table and row nodes and keeps its
/// own content-line counter, so concurrent runs over the same [`Metadata`]
/// never share identities.
#[derive(Debug)]
pub struct GraphEmitter {
    metadata: Arc<Metadata>,
    projector: RowProjector,
    graph_name: GraphName,
    group: BlankNode,
    table: BlankNode,
    state: EmitterState,
    content_line: u64,
    emitted: u64,
}

impl GraphEmitter {
    pub fn new(metadata: Arc<Metadata>) -> Self {
        let graph_name = metadata
            .graph_name
            .clone()
            .map_or(GraphName::DefaultGraph, GraphName::NamedNode);
        Self {
            projector: RowProjector::new(Arc::clone(&metadata)),
            metadata,
            graph_name,
            group: BlankNode::default(),
            table: BlankNode::default(),
            state: EmitterState::Start,
            content_line: 0,
            emitted: 0,
        }
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// Rows accepted so far.
    pub fn rows(&self) -> u64 {
        self.content_line
    }

    /// Statements handed out so far.
    pub fn statements(&self) -> u64 {
        self.emitted
    }

    pub fn table_node(&self) -> &BlankNode {
        &self.table
    }

    pub fn projector(&self) -> &RowProjector {
        &self.projector
    }

    /// Emits the group and table scaffold followed by the table annotations.
    /// Returns nothing once the scaffold has been emitted.
    pub fn open(&mut self) -> Vec<Quad> {
        let mut batch = Vec::new();
        if self.state == EmitterState::Start {
            self.push(&mut batch, self.group.clone(), rdf::TYPE, csvw::TABLE_GROUP.into_owned());
            self.state = EmitterState::GroupEmitted;
        }
        if self.state == EmitterState::GroupEmitted {
            self.push(&mut batch, self.group.clone(), csvw::HAS_TABLE, self.table.clone());
            self.push(&mut batch, self.table.clone(), rdf::TYPE, csvw::TABLE.into_owned());
            let url = NamedNode::new_unchecked(self.metadata.base_iri());
            self.push(&mut batch, self.table.clone(), csvw::URL, url);
            self.copy_annotations(&mut batch);
            self.state = EmitterState::TableEmitted;
        }
        batch
    }

    /// Emits every statement of one row. [`open`](Self::open) must have
    /// emitted the scaffold first.
    ///
    /// A failing row emits nothing and closes the emitter.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Projection`] when a cell cannot be projected,
    /// [`ImportError::NotOpened`] before the scaffold was emitted and
    /// [`ImportError::Closed`] after [`close`](Self::close) or a failure.
    pub fn emit_row(&mut self, row: &SourceRow) -> Result<Vec<Quad>> {
        match self.state {
            EmitterState::Closed => return Err(ImportError::Closed),
            EmitterState::Start | EmitterState::GroupEmitted => {
                return Err(ImportError::NotOpened);
            }
            EmitterState::TableEmitted | EmitterState::RowLoop => {}
        }
        let mut batch = Vec::new();
        self.state = EmitterState::RowLoop;
        self.content_line += 1;
        let _span = debug_span!("row", content_line = self.content_line).entered();

        match self.row_statements(row, &mut batch) {
            Ok(()) => Ok(batch),
            Err(err) => {
                self.emitted -= batch.len() as u64;
                self.state = EmitterState::Closed;
                Err(err.into())
            }
        }
    }

    /// Ends the run. Later rows are rejected.
    pub fn close(&mut self) {
        if self.state != EmitterState::Closed {
            debug!(
                rows = self.content_line,
                statements = self.emitted,
                "closed emitter"
            );
        }
        self.state = EmitterState::Closed;
    }

    fn row_statements(
        &mut self,
        row: &SourceRow,
        batch: &mut Vec<Quad>,
    ) -> std::result::Result<(), RowProjectionError> {
        let context = RowContext::new(self.content_line, row);
        let described: NamedOrBlankNode = match &self.metadata.table_schema.about_url {
            Some(template) => self
                .projector
                .resolver()
                .resolve(&template.expand(&context))
                .map_err(|cause| RowProjectionError {
                    content_line: self.content_line,
                    cause,
                })?
                .into(),
            None => BlankNode::default().into(),
        };
        let cells = self.projector.project(&context)?;

        let row_node = BlankNode::default();
        self.push(batch, self.table.clone(), csvw::HAS_ROW, row_node.clone());
        self.push(batch, row_node.clone(), rdf::TYPE, csvw::ROW.into_owned());
        self.push(batch, row_node.clone(), csvw::DESCRIBES, described.clone());
        for cell in cells {
            let subject = cell
                .subject
                .map_or_else(|| described.clone(), NamedOrBlankNode::from);
            self.push(batch, subject, cell.predicate, cell.object);
        }
        let rownum = Literal::new_typed_literal(self.content_line.to_string(), xsd::INTEGER);
        self.push(batch, row_node.clone(), csvw::ROWNUM, rownum);
        let url = format!("{}#row={}", self.metadata.base_iri(), row.source_line);
        self.push(batch, row_node, csvw::URL, NamedNode::new_unchecked(url));
        Ok(())
    }

    /// Copies the annotations onto the table node. Their blank nodes are
    /// replaced by fresh ones, so each run gets its own copy.
    fn copy_annotations(&mut self, batch: &mut Vec<Quad>) {
        let metadata = Arc::clone(&self.metadata);
        let mut fresh: HashMap<&BlankNode, BlankNode> = HashMap::new();
        for Annotation {
            subject,
            predicate,
            object,
        } in &metadata.annotations
        {
            let subject: NamedOrBlankNode = match subject {
                None => self.table.clone().into(),
                Some(blank) => fresh.entry(blank).or_default().clone().into(),
            };
            let object = match object {
                Term::BlankNode(blank) => fresh.entry(blank).or_default().clone().into(),
                other => other.clone(),
            };
            self.push(batch, subject, predicate.clone(), object);
        }
    }

    fn push(
        &mut self,
        batch: &mut Vec<Quad>,
        subject: impl Into<NamedOrBlankNode>,
        predicate: impl Into<NamedNode>,
        object: impl Into<Term>,
    ) {
        batch.push(Quad::new(subject, predicate, object, self.graph_name.clone()));
        self.emitted += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvw_model::{ColumnSpec, ImportOptions, PropertyUrl, UriTemplate};

    fn emitter(options: &ImportOptions) -> GraphEmitter {
        GraphEmitter::new(Arc::new(Metadata::from_options(options).unwrap()))
    }

    #[test]
    fn open_walks_through_scaffold_states_once() {
        let mut emitter = emitter(&ImportOptions::default());
        assert_eq!(emitter.state(), EmitterState::Start);
        assert_eq!(emitter.open().len(), 4);
        assert_eq!(emitter.state(), EmitterState::TableEmitted);
        assert!(emitter.open().is_empty());
        assert_eq!(emitter.statements(), 4);
    }

    #[test]
    fn rows_follow_the_scaffold() {
        let mut emitter = emitter(&ImportOptions::default());
        emitter.open();
        let batch = emitter
            .emit_row(&SourceRow::from_pairs(2, [("a", "1")]))
            .unwrap();
        // row node, type, describes, one cell, rownum, url
        assert_eq!(batch.len(), 6);
        assert_eq!(emitter.state(), EmitterState::RowLoop);
        assert_eq!(emitter.rows(), 1);
        assert_eq!(emitter.statements(), 4 + 6);
    }

    #[test]
    fn rows_before_open_are_rejected_without_losing_the_scaffold() {
        let mut emitter = emitter(&ImportOptions::default());
        assert!(matches!(
            emitter.emit_row(&SourceRow::from_pairs(2, [("a", "1")])),
            Err(ImportError::NotOpened)
        ));
        assert_eq!(emitter.state(), EmitterState::Start);
        assert_eq!(emitter.rows(), 0);
        assert_eq!(emitter.open().len(), 4);
    }

    #[test]
    fn failing_first_row_keeps_the_emitted_scaffold() {
        let mut metadata = Metadata::from_options(&ImportOptions::default()).unwrap();
        let mut column = ColumnSpec::synthesized("a", PropertyUrl::Default("#a".to_string()));
        column.language = Some(UriTemplate::parse("{l}").unwrap());
        metadata.table_schema.columns = vec![column];
        let mut emitter = GraphEmitter::new(Arc::new(metadata));

        assert_eq!(emitter.open().len(), 4);
        let result = emitter.emit_row(&SourceRow::from_pairs(2, [("a", "1"), ("l", "bad tag")]));
        assert!(matches!(result, Err(ImportError::Projection(_))));
        assert_eq!(emitter.statements(), 4);
        assert_eq!(emitter.state(), EmitterState::Closed);
    }

    #[test]
    fn closed_emitter_rejects_rows() {
        let mut emitter = emitter(&ImportOptions::default());
        emitter.open();
        emitter.close();
        assert!(matches!(
            emitter.emit_row(&SourceRow::from_pairs(2, [("a", "1")])),
            Err(ImportError::Closed)
        ));
    }

    #[test]
    fn named_graph_option_scopes_every_statement() {
        let options = ImportOptions::default().with_graph_name("http://example.org/g");
        let mut emitter = emitter(&options);
        let mut batch = emitter.open();
        batch.extend(
            emitter
                .emit_row(&SourceRow::from_pairs(2, [("a", "1")]))
                .unwrap(),
        );
        assert!(batch.iter().all(|quad| {
            quad.graph_name == GraphName::NamedNode(NamedNode::new_unchecked("http://example.org/g"))
        }));
    }
}
