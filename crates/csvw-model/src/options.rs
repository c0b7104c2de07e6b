//! Configuration options for an import run.

use serde::{Deserialize, Serialize};

/// Options shared by schema resolution, tokenizing and statement emission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Base for IRI resolution and for the table and row `url` statements.
    /// Default: empty, which keeps filled templates as relative IRIs.
    pub base_iri: String,

    /// Zone assumed for date/time values without an explicit offset.
    /// Accepts `UTC`, `Z`, `+hh:mm`, `UTC+hh:mm` or an IANA zone name.
    pub timezone: Option<String>,

    /// Also percent-encode `-` in synthesized property IRIs.
    pub strict_property_escaping: bool,

    /// Accept records whose column count differs from the header.
    pub relax_column_count: bool,

    /// Skip malformed records instead of failing the run. Skipped records
    /// do not advance the row counter.
    pub skip_lines_with_error: bool,

    /// Trim whitespace around header names.
    pub trim_headers: bool,

    /// Emit every statement in this named graph instead of the default graph.
    pub graph_name: Option<String>,
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = base_iri.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_strict_property_escaping(mut self, enable: bool) -> Self {
        self.strict_property_escaping = enable;
        self
    }

    pub fn with_relax_column_count(mut self, enable: bool) -> Self {
        self.relax_column_count = enable;
        self
    }

    pub fn with_skip_lines_with_error(mut self, enable: bool) -> Self {
        self.skip_lines_with_error = enable;
        self
    }

    pub fn with_trim_headers(mut self, enable: bool) -> Self {
        self.trim_headers = enable;
        self
    }

    pub fn with_graph_name(mut self, graph_name: impl Into<String>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }
}
