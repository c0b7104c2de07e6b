/// Syntax parameters of the tabular source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: char,
    /// `None` disables quoting.
    pub quote_char: Option<char>,
    /// `None` means the tokenizer detects line endings itself.
    pub line_terminators: Option<Vec<String>>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: Some('"'),
            line_terminators: None,
        }
    }
}
