//! Resolution of filled templates against the run's base IRI.

use oxiri::Iri;
use oxrdf::NamedNode;
use tracing::debug;

use crate::error::CellError;

/// Turns filled template strings into named nodes.
///
/// With an absolute base IRI, references are resolved per RFC 3986. With an
/// empty or relative base the filled string is kept verbatim, so relative
/// IRIs such as `#key0` may appear in the output.
#[derive(Debug, Clone)]
pub struct IriResolver {
    base_iri: Option<Iri<String>>,
}

impl IriResolver {
    pub fn new(base_iri: &str) -> Self {
        let base_iri = match Iri::parse(base_iri.to_string()) {
            Ok(iri) => Some(iri),
            Err(error) => {
                if !base_iri.is_empty() {
                    debug!(base_iri, %error, "base IRI is not absolute, keeping references verbatim");
                }
                None
            }
        };
        Self { base_iri }
    }

    /// # Errors
    ///
    /// Returns [`CellError::InvalidIri`] when `reference` cannot be resolved
    /// against an absolute base.
    pub fn resolve(&self, reference: &str) -> Result<NamedNode, CellError> {
        match &self.base_iri {
            Some(base) => base
                .resolve(reference)
                .map(|iri| NamedNode::new_unchecked(iri.into_inner()))
                .map_err(|source| CellError::InvalidIri {
                    iri: reference.to_string(),
                    source,
                }),
            None => Ok(NamedNode::new_unchecked(reference)),
        }
    }
}
