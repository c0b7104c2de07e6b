use crate::column::ColumnSpec;
use crate::template::UriTemplate;

/// The declarative column-to-statement mapping for one table.
///
/// The default value has no columns and no `aboutUrl`, so every row
/// describes a fresh blank node and every field becomes a synthesized column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableSchema {
    pub about_url: Option<UriTemplate>,
    pub property_url: Option<UriTemplate>,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Whether a declared column lists `key` among its titles.
    pub fn declares(&self, key: &str) -> bool {
        self.columns.iter().any(|column| column.covers(key))
    }
}
