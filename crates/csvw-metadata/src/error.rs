use csvw_model::TemplateError;
use csvw_transform::InvalidTimezone;
use oxrdf::IriParseError;
use thiserror::Error;

/// A schema description that cannot be turned into a column plan.
///
/// Raised before any row is read; fatal to the run.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid {property} template")]
    Template {
        property: &'static str,
        #[source]
        source: TemplateError,
    },

    #[error("invalid dialect {property} '{value}': {reason}")]
    Dialect {
        property: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("invalid datatype '{value}'")]
    Datatype {
        value: String,
        #[source]
        source: IriParseError,
    },

    #[error("invalid graph name '{value}'")]
    GraphName {
        value: String,
        #[source]
        source: IriParseError,
    },

    #[error("invalid timezone option")]
    Timezone(#[from] InvalidTimezone),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
