use csvw_model::Dialect;
use csvw_model::vocab::{csvw, xsd};
use oxrdf::TermRef;

use crate::error::{Result, SchemaError};
use crate::graph::{DescriptionGraph, as_node, is_list, lexical, rdf_list};

/// Reads the first `csvw:dialect` node. Missing properties keep their
/// defaults.
///
/// # Errors
///
/// Returns [`SchemaError::Dialect`] for a delimiter or quote character that
/// is not exactly one character.
pub fn parse_dialect<G: DescriptionGraph + ?Sized>(graph: &G) -> Result<Dialect> {
    let mut dialect = Dialect::default();
    let Some(node) = graph
        .triples_matching(None, Some(csvw::DIALECT))
        .next()
        .and_then(|triple| as_node(triple.object))
    else {
        return Ok(dialect);
    };

    if let Some(delimiter) = graph.object(node, csvw::DELIMITER) {
        dialect.delimiter = single_char("delimiter", lexical(delimiter))?;
    }

    let mut terminators = Vec::new();
    for term in graph.objects(node, csvw::LINE_TERMINATORS) {
        if is_list(graph, term) {
            terminators.extend(
                rdf_list(graph, term)
                    .iter()
                    .map(|item| lexical(item.as_ref()).to_string()),
            );
        } else {
            terminators.push(lexical(term).to_string());
        }
    }
    if !terminators.is_empty() {
        dialect.line_terminators = Some(terminators);
    }

    if let Some(quote) = graph.object(node, csvw::QUOTE_CHAR) {
        dialect.quote_char = if is_false(quote) {
            None
        } else {
            Some(single_char("quoteChar", lexical(quote))?)
        };
    }

    Ok(dialect)
}

/// A boolean-typed `false` literal.
fn is_false(term: TermRef<'_>) -> bool {
    matches!(term, TermRef::Literal(literal)
        if literal.datatype() == xsd::BOOLEAN && literal.value() == "false")
}

fn single_char(property: &'static str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => Ok(ch),
        (None, _) => Err(SchemaError::Dialect {
            property,
            value: value.to_string(),
            reason: "value is empty",
        }),
        (Some(_), Some(_)) => Err(SchemaError::Dialect {
            property,
            value: value.to_string(),
            reason: "expected a single character",
        }),
    }
}
