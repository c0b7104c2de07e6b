//! Resolved column specifications.

use oxrdf::NamedNode;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::template::{TemplateVars, UriTemplate};
use crate::vocab::xsd;

/// Characters `encodeURI` leaves untouched.
const URI_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#');

const URI_SAFE_STRICT: &AsciiSet = &URI_SAFE.add(b'-');

/// Builds the property IRI used when neither the column nor the table
/// declares a `propertyUrl`: `{base}#{escaped name}`.
pub fn default_property_iri(base_iri: &str, name: &str, strict_escaping: bool) -> String {
    let set = if strict_escaping {
        URI_SAFE_STRICT
    } else {
        URI_SAFE
    };
    format!("{base_iri}#{}", utf8_percent_encode(name, set))
}

/// A datatype base IRI plus an optional lexical format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datatype {
    pub base: NamedNode,
    pub format: Option<String>,
}

impl Datatype {
    pub fn new(base: NamedNode, format: Option<String>) -> Self {
        Self { base, format }
    }

    /// A datatype used verbatim, without a format.
    pub fn named(base: NamedNode) -> Self {
        Self { base, format: None }
    }

    pub fn string() -> Self {
        Self::named(xsd::STRING.into())
    }
}

impl Default for Datatype {
    fn default() -> Self {
        Self::string()
    }
}

/// Where a column's predicate comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyUrl {
    /// A `propertyUrl` declared on the column or inherited from the table.
    Template(UriTemplate),
    /// The synthesized `{base}#{escaped name}` IRI.
    Default(String),
}

impl PropertyUrl {
    pub fn expand<V: TemplateVars + ?Sized>(&self, vars: &V) -> String {
        match self {
            Self::Template(template) => template.expand(vars),
            Self::Default(iri) => iri.clone(),
        }
    }

    /// Picks the table-level template when there is one, otherwise the
    /// synthesized default for `name`.
    pub fn inherited_or_default(
        table_property_url: Option<&UriTemplate>,
        base_iri: &str,
        name: &str,
        strict_escaping: bool,
    ) -> Self {
        match table_property_url {
            Some(template) => Self::Template(template.clone()),
            None => Self::Default(default_property_iri(base_iri, name, strict_escaping)),
        }
    }
}

/// One column of the executable plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    /// Row field keys feeding this column, tried in order.
    pub titles: Vec<String>,
    pub datatype: Datatype,
    pub null_value: String,
    pub default_value: Option<String>,
    pub about_url: Option<UriTemplate>,
    pub property_url: PropertyUrl,
    pub value_url: Option<UriTemplate>,
    pub language: Option<UriTemplate>,
    pub suppress_output: bool,
    /// Informational. A virtual column has no source field; projection
    /// treats it like any column whose titles match nothing, so it only
    /// yields a value through `value_url` or `default_value`.
    pub is_virtual: bool,
}

impl ColumnSpec {
    /// A plain string column for a row field no declared column covers.
    pub fn synthesized(title: &str, property_url: PropertyUrl) -> Self {
        Self {
            name: title.to_string(),
            titles: vec![title.to_string()],
            datatype: Datatype::string(),
            null_value: String::new(),
            default_value: None,
            about_url: None,
            property_url,
            value_url: None,
            language: None,
            suppress_output: false,
            is_virtual: false,
        }
    }

    /// Whether `key` is one of this column's titles.
    pub fn covers(&self, key: &str) -> bool {
        self.titles.iter().any(|title| title == key)
    }

    /// The first non-empty field among the titles, in title order.
    ///
    /// When every title is empty or absent, the outcome of the last lookup
    /// decides: `Some("")` if that field was present (or there are no
    /// titles at all), `None` if it was absent from the row.
    pub fn raw_value<'a, V: TemplateVars + ?Sized>(&self, fields: &'a V) -> Option<&'a str> {
        let mut value = Some("");
        for title in &self.titles {
            if value.is_some_and(|v| !v.is_empty()) {
                break;
            }
            value = fields.var(title);
        }
        value
    }
}
