//! Starter schema descriptions generated from a header line.
//!
//! The generated document is CSVW JSON: one column per header, each with
//! a property IRI under a common base and a table `aboutUrl` keyed on the
//! first header.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

/// Characters `encodeURIComponent` leaves untouched.
const COMPONENT_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const CSVW_CONTEXT: &str = "http://www.w3.org/ns/csvw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescription {
    #[serde(rename = "@context")]
    pub context: String,
    /// Only written for delimiters other than `,`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialect: Option<DialectDescription>,
    #[serde(rename = "tableSchema")]
    pub table_schema: TableSchemaDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialectDescription {
    pub delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchemaDescription {
    pub about_url: String,
    pub columns: Vec<ColumnDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescription {
    pub titles: String,
    pub property_url: String,
}

/// Builds a [`TableDescription`] from a header line.
#[derive(Debug, Clone, Default)]
pub struct MetadataBuilder {
    base_iri: String,
    about_url: Option<String>,
    delimiter: Option<char>,
    headers: Option<Vec<String>>,
    property_base_iri: Option<String>,
}

impl MetadataBuilder {
    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            base_iri: base_iri.into(),
            ..Self::default()
        }
    }

    /// Replaces the generated `aboutUrl` template.
    #[must_use]
    pub fn with_about_url(mut self, about_url: impl Into<String>) -> Self {
        self.about_url = Some(about_url.into());
        self
    }

    /// Skips delimiter detection.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Uses these column titles instead of the header line's.
    #[must_use]
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Base for property IRIs. Defaults to the base IRI.
    #[must_use]
    pub fn with_property_base_iri(mut self, property_base_iri: impl Into<String>) -> Self {
        self.property_base_iri = Some(property_base_iri.into());
        self
    }

    pub fn from_header_line(&self, line: &str) -> TableDescription {
        let delimiter = self
            .delimiter
            .unwrap_or_else(|| detect_delimiter(line));
        match &self.headers {
            Some(headers) => self.build(headers, delimiter),
            None => self.build(&extract_headers(line, delimiter), delimiter),
        }
    }

    pub fn build(&self, headers: &[String], delimiter: char) -> TableDescription {
        let property_base = self
            .property_base_iri
            .as_deref()
            .unwrap_or(&self.base_iri);
        let about_url = self.about_url.clone().unwrap_or_else(|| match headers.first() {
            Some(key) => format!("{}{{{}}}", self.base_iri, encode_component(key)),
            None => self.base_iri.clone(),
        });
        TableDescription {
            context: CSVW_CONTEXT.to_string(),
            dialect: (delimiter != ',').then(|| DialectDescription {
                delimiter: delimiter.to_string(),
            }),
            table_schema: TableSchemaDescription {
                about_url,
                columns: headers
                    .iter()
                    .map(|header| ColumnDescription {
                        titles: header.clone(),
                        property_url: format!("{property_base}{}", encode_component(header)),
                    })
                    .collect(),
            },
        }
    }
}

/// `,` when the line has more commas than tabs, otherwise a tab.
pub fn detect_delimiter(line: &str) -> char {
    let commas = line.matches(',').count();
    let tabs = line.matches('\t').count();
    if commas > tabs { ',' } else { '\t' }
}

/// Splits a header line, dropping quote characters and surrounding blanks.
pub fn extract_headers(line: &str, delimiter: char) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(delimiter)
        .map(|header| header.replace('"', "").trim().to_string())
        .collect()
}

fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT_SAFE).to_string()
}
