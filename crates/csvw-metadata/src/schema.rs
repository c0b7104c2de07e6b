//! Table schema and column resolution.

use csvw_model::vocab::{csvw, rdf, xsd};
use csvw_model::{ColumnSpec, Datatype, ImportOptions, PropertyUrl, TableSchema, UriTemplate};
use oxrdf::{NamedNode, NamedNodeRef, NamedOrBlankNodeRef, TermRef};
use tracing::warn;

use crate::error::{Result, SchemaError};
use crate::graph::{DescriptionGraph, as_node, lexical, rdf_list, value_of};

/// Reads the first `csvw:tableSchema` node and its ordered column list.
///
/// A graph without a table schema yields [`TableSchema::default`].
///
/// # Errors
///
/// Returns [`SchemaError`] for malformed templates or datatype IRIs.
pub fn parse_table_schema<G: DescriptionGraph + ?Sized>(
    graph: &G,
    options: &ImportOptions,
) -> Result<TableSchema> {
    let Some(root) = graph
        .triples_matching(None, Some(csvw::TABLE_SCHEMA))
        .next()
        .and_then(|triple| as_node(triple.object))
    else {
        return Ok(TableSchema::default());
    };

    let about_url = template_of(graph, root, csvw::ABOUT_URL, "aboutUrl")?;
    let property_url = template_of(graph, root, csvw::PROPERTY_URL, "propertyUrl")?;

    let items = graph
        .object(root, csvw::COLUMN)
        .map(|head| rdf_list(graph, head))
        .unwrap_or_default();
    let mut columns = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(node) = as_node(item.as_ref()) else {
            warn!(position = idx + 1, "skipping a literal in the column list");
            continue;
        };
        columns.push(parse_column(
            graph,
            node,
            idx + 1,
            property_url.as_ref(),
            options,
        )?);
    }

    Ok(TableSchema {
        about_url,
        property_url,
        columns,
    })
}

fn parse_column<G: DescriptionGraph + ?Sized>(
    graph: &G,
    node: NamedOrBlankNodeRef<'_>,
    position: usize,
    table_property_url: Option<&UriTemplate>,
    options: &ImportOptions,
) -> Result<ColumnSpec> {
    let titles: Vec<String> = graph
        .objects(node, csvw::TITLE)
        .map(|title| lexical(title).to_string())
        .collect();
    let name = value_of(graph, node, csvw::NAME)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| titles.first().cloned())
        .unwrap_or_else(|| format!("_col.{position}"));

    let property_url = match template_of(graph, node, csvw::PROPERTY_URL, "propertyUrl")? {
        Some(template) => PropertyUrl::Template(template),
        None => PropertyUrl::inherited_or_default(
            table_property_url,
            &options.base_iri,
            &name,
            options.strict_property_escaping,
        ),
    };

    Ok(ColumnSpec {
        datatype: parse_datatype(graph, node)?,
        null_value: value_of(graph, node, csvw::NULL)
            .unwrap_or_default()
            .to_string(),
        default_value: value_of(graph, node, csvw::DEFAULT).map(str::to_string),
        about_url: template_of(graph, node, csvw::ABOUT_URL, "aboutUrl")?,
        property_url,
        value_url: template_of(graph, node, csvw::VALUE_URL, "valueUrl")?,
        language: template_of(graph, node, csvw::LANG, "lang")?,
        suppress_output: value_of(graph, node, csvw::SUPPRESS_OUTPUT) == Some("true"),
        is_virtual: value_of(graph, node, csvw::VIRTUAL).is_some_and(|flag| flag != "false"),
        name,
        titles,
    })
}

/// A datatype IRI is used as-is; a literal is a `base` keyword; a node
/// carries `base` and `format`.
fn parse_datatype<G: DescriptionGraph + ?Sized>(
    graph: &G,
    node: NamedOrBlankNodeRef<'_>,
) -> Result<Datatype> {
    match graph.object(node, csvw::DATATYPE) {
        None => Ok(Datatype::string()),
        Some(TermRef::NamedNode(iri)) => Ok(Datatype::named(iri.into_owned())),
        Some(TermRef::Literal(keyword)) => Ok(Datatype::named(datatype_for_keyword(
            keyword.value(),
        )?)),
        Some(TermRef::BlankNode(blank)) => {
            let description = blank.into();
            let base = match graph.object(description, csvw::BASE) {
                None => xsd::STRING.into_owned(),
                Some(TermRef::NamedNode(iri)) => iri.into_owned(),
                Some(keyword) => datatype_for_keyword(lexical(keyword))?,
            };
            let format = value_of(graph, description, csvw::FORMAT).map(str::to_string);
            Ok(Datatype::new(base, format))
        }
    }
}

/// Maps a datatype keyword to its IRI. Unknown keywords are XML Schema
/// local names; absolute IRIs pass through.
pub fn datatype_for_keyword(keyword: &str) -> Result<NamedNode> {
    let known: Option<NamedNodeRef<'static>> = match keyword {
        "" => Some(xsd::STRING),
        "number" => Some(xsd::DOUBLE),
        "binary" => Some(xsd::BASE64_BINARY),
        "datetime" => Some(xsd::DATE_TIME),
        "any" => Some(xsd::ANY_ATOMIC_TYPE),
        "xml" => Some(rdf::XML_LITERAL),
        "html" => Some(rdf::HTML),
        "json" => Some(csvw::JSON),
        _ => None,
    };
    if let Some(iri) = known {
        return Ok(iri.into_owned());
    }
    let iri = if has_scheme(keyword) {
        NamedNode::new(keyword)
    } else {
        NamedNode::new(format!("{}{keyword}", xsd::NAMESPACE))
    };
    iri.map_err(|source| SchemaError::Datatype {
        value: keyword.to_string(),
        source,
    })
}

fn has_scheme(value: &str) -> bool {
    value.split_once(':').is_some_and(|(scheme, _)| {
        scheme.starts_with(|ch: char| ch.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
    })
}

/// Compiles the template held by `node predicate`, if any. Empty values
/// count as absent.
fn template_of<G: DescriptionGraph + ?Sized>(
    graph: &G,
    node: NamedOrBlankNodeRef<'_>,
    predicate: NamedNodeRef<'static>,
    property: &'static str,
) -> Result<Option<UriTemplate>> {
    value_of(graph, node, predicate)
        .filter(|value| !value.is_empty())
        .map(|value| {
            UriTemplate::parse(value).map_err(|source| SchemaError::Template { property, source })
        })
        .transpose()
}
