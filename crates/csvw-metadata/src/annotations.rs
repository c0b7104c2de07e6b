//! Table annotations copied from the schema description.

use std::collections::HashSet;

use csvw_model::vocab::csvw;
use oxrdf::{BlankNode, NamedNode, NamedNodeRef, NamedOrBlankNode, Term, TermRef};

use crate::graph::DescriptionGraph;

/// A statement to emit about the table node or one of its nested nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// `None` stands for the table node of the run.
    pub subject: Option<BlankNode>,
    pub predicate: NamedNode,
    pub object: Term,
}

/// Collects the statements about the subject of the first `csvw:url`
/// statement, in depth-first order.
///
/// Top-level statements with a CSVW predicate are skipped. Blank node
/// objects are followed to any depth; each is expanded once.
pub fn collect_annotations<G: DescriptionGraph + ?Sized>(graph: &G) -> Vec<Annotation> {
    let Some(url_subject) = graph
        .triples_matching(None, Some(csvw::URL))
        .next()
        .map(|triple| triple.subject.into_owned())
    else {
        return Vec::new();
    };

    let mut annotations = Vec::new();
    let mut expanded = HashSet::new();
    if let NamedOrBlankNode::BlankNode(blank) = &url_subject {
        expanded.insert(blank.clone());
    }
    for triple in graph.triples_matching(Some(url_subject.as_ref()), None) {
        if triple.predicate.as_str().starts_with(csvw::NAMESPACE) {
            continue;
        }
        copy_into(
            graph,
            None,
            triple.predicate,
            triple.object,
            &mut expanded,
            &mut annotations,
        );
    }
    annotations
}

fn copy_into<G: DescriptionGraph + ?Sized>(
    graph: &G,
    subject: Option<BlankNode>,
    predicate: NamedNodeRef<'_>,
    object: TermRef<'_>,
    expanded: &mut HashSet<BlankNode>,
    annotations: &mut Vec<Annotation>,
) {
    annotations.push(Annotation {
        subject,
        predicate: predicate.into_owned(),
        object: object.into_owned(),
    });
    let TermRef::BlankNode(blank) = object else {
        return;
    };
    if !expanded.insert(blank.into_owned()) {
        return;
    }
    for triple in graph.triples_matching(Some(blank.into()), None) {
        copy_into(
            graph,
            Some(blank.into_owned()),
            triple.predicate,
            triple.object,
            expanded,
            annotations,
        );
    }
}
