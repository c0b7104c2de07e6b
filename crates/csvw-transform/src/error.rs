use thiserror::Error;

/// A cell value that could not be read as a date/time.
///
/// Never fatal: the projector falls back to the raw lexical form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "could not parse '{value}' as a date/time with format '{}'",
    .format.as_deref().unwrap_or("ISO 8601 / RFC 2822")
)]
pub struct DateTimeParseFailure {
    pub value: String,
    pub format: Option<String>,
}

impl DateTimeParseFailure {
    pub fn new(value: &str, format: Option<&str>) -> Self {
        Self {
            value: value.to_string(),
            format: format.map(str::to_string),
        }
    }
}

/// A timezone option that names neither an offset nor a known zone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timezone '{value}'")]
pub struct InvalidTimezone {
    pub value: String,
}
