use indexmap::IndexMap;

/// Field values of one record, keyed by header, in header order.
pub type Fields = IndexMap<String, String>;

/// Keys injected into template contexts. They never become columns.
pub mod reserved {
    /// 1-based count of accepted rows.
    pub const ROW: &str = "_row";
    /// Line number of the record in the tabular source.
    pub const SOURCE_ROW: &str = "_sourceRow";
    /// Logical name of the column being projected.
    pub const NAME: &str = "_name";
    /// 1-based position of the column in the expanded plan.
    pub const COLUMN: &str = "_column";
    pub const SOURCE_COLUMN: &str = "_sourceColumn";

    pub const ALL: [&str; 5] = [ROW, SOURCE_ROW, NAME, COLUMN, SOURCE_COLUMN];

    pub fn is_reserved(key: &str) -> bool {
        ALL.contains(&key)
    }
}

/// A record as delivered by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line of the record in the original source, counting
    /// skipped and header lines.
    pub source_line: u64,
    pub fields: Fields,
}

impl SourceRow {
    pub fn new(source_line: u64, fields: Fields) -> Self {
        Self {
            source_line,
            fields,
        }
    }

    /// Builds a row from `(key, value)` pairs, preserving their order.
    pub fn from_pairs<K, V>(source_line: u64, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            source_line,
            fields: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
