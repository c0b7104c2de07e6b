//! Resolution of CSVW schema descriptions.
//!
//! A schema description is a graph using the CSVW vocabulary. This crate
//! reads it once, before any row, into an immutable [`Metadata`]:
//!
//! - **dialect**: delimiter, quote character and line terminators
//! - **schema**: the table-level templates and the ordered column list
//! - **annotations**: extra statements about the described table
//! - **graph**: the [`DescriptionGraph`] query seam and `rdf:List` walking
//!
//! [`MetadataBuilder`] goes the other way and drafts a CSVW JSON
//! description from a header line.

pub mod annotations;
pub mod builder;
pub mod dialect;
pub mod error;
pub mod graph;
mod metadata;
pub mod schema;

pub use annotations::Annotation;
pub use builder::{MetadataBuilder, TableDescription};
pub use error::{Result, SchemaError};
pub use graph::DescriptionGraph;
pub use metadata::Metadata;
