use thiserror::Error;

/// Why a URI template could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateErrorKind {
    #[error("expression is never closed")]
    UnclosedExpression,
    #[error("closing brace without an opening brace")]
    UnexpectedClosingBrace,
    #[error("expression has an empty variable name")]
    EmptyVariable,
    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),
    #[error("operator '{0}' is reserved")]
    ReservedOperator(char),
    #[error("invalid prefix modifier '{0}'")]
    InvalidPrefix(String),
}

/// A malformed URI template, reported when a schema is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid URI template '{template}' at offset {position}: {kind}")]
pub struct TemplateError {
    pub template: String,
    pub position: usize,
    pub kind: TemplateErrorKind,
}

pub type Result<T> = std::result::Result<T, TemplateError>;
