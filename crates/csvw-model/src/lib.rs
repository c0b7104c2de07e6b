//! Data model for CSVW row-to-graph mapping.
//!
//! - **template**: RFC 6570 URI templates compiled at schema load time
//! - **dialect**: delimiter, quoting and line terminators of the source
//! - **column** / **schema**: the resolved column plan of a table
//! - **row**: records delivered by the tokenizer and reserved template keys
//! - **options**: configuration of an import run
//! - **vocab**: CSVW, XSD and RDF terms

#![deny(unsafe_code)]

pub mod column;
pub mod dialect;
pub mod error;
pub mod options;
pub mod row;
pub mod schema;
pub mod template;
pub mod vocab;

pub use column::{ColumnSpec, Datatype, PropertyUrl, default_property_iri};
pub use dialect::Dialect;
pub use error::{TemplateError, TemplateErrorKind};
pub use options::ImportOptions;
pub use row::{Fields, SourceRow, reserved};
pub use schema::TableSchema;
pub use template::{TemplateVars, UriTemplate};
