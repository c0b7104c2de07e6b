//! Read access to a schema description graph.

use std::collections::HashSet;

use csvw_model::vocab::rdf;
use oxrdf::{Graph, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term, TermRef, TripleRef};
use tracing::warn;

/// A graph that can be queried by subject and predicate.
///
/// `None` in a pattern position matches anything.
pub trait DescriptionGraph {
    fn triples_matching<'a>(
        &'a self,
        subject: Option<NamedOrBlankNodeRef<'a>>,
        predicate: Option<NamedNodeRef<'a>>,
    ) -> Box<dyn Iterator<Item = TripleRef<'a>> + 'a>;

    /// Objects of `subject predicate ?o`, in graph order.
    fn objects<'a>(
        &'a self,
        subject: NamedOrBlankNodeRef<'a>,
        predicate: NamedNodeRef<'a>,
    ) -> Box<dyn Iterator<Item = TermRef<'a>> + 'a> {
        Box::new(
            self.triples_matching(Some(subject), Some(predicate))
                .map(|triple| triple.object),
        )
    }

    fn object<'a>(
        &'a self,
        subject: NamedOrBlankNodeRef<'a>,
        predicate: NamedNodeRef<'a>,
    ) -> Option<TermRef<'a>> {
        self.objects(subject, predicate).next()
    }
}

impl DescriptionGraph for Graph {
    fn triples_matching<'a>(
        &'a self,
        subject: Option<NamedOrBlankNodeRef<'a>>,
        predicate: Option<NamedNodeRef<'a>>,
    ) -> Box<dyn Iterator<Item = TripleRef<'a>> + 'a> {
        match (subject, predicate) {
            (Some(subject), Some(predicate)) => Box::new(
                self.triples_for_subject(subject)
                    .filter(move |triple| triple.predicate == predicate),
            ),
            (Some(subject), None) => Box::new(self.triples_for_subject(subject)),
            (None, Some(predicate)) => Box::new(self.triples_for_predicate(predicate)),
            (None, None) => Box::new(self.iter()),
        }
    }
}

impl<G: DescriptionGraph + ?Sized> DescriptionGraph for &G {
    fn triples_matching<'a>(
        &'a self,
        subject: Option<NamedOrBlankNodeRef<'a>>,
        predicate: Option<NamedNodeRef<'a>>,
    ) -> Box<dyn Iterator<Item = TripleRef<'a>> + 'a> {
        (**self).triples_matching(subject, predicate)
    }
}

/// The lexical value of a term: the IRI, blank node id or literal value.
pub fn lexical(term: TermRef<'_>) -> &str {
    match term {
        TermRef::NamedNode(node) => node.as_str(),
        TermRef::BlankNode(node) => node.as_str(),
        TermRef::Literal(literal) => literal.value(),
    }
}

pub fn as_node(term: TermRef<'_>) -> Option<NamedOrBlankNodeRef<'_>> {
    match term {
        TermRef::NamedNode(node) => Some(node.into()),
        TermRef::BlankNode(node) => Some(node.into()),
        TermRef::Literal(_) => None,
    }
}

/// First lexical value of `subject predicate ?o`.
pub fn value_of<'a, G: DescriptionGraph + ?Sized>(
    graph: &'a G,
    subject: NamedOrBlankNodeRef<'a>,
    predicate: NamedNodeRef<'a>,
) -> Option<&'a str> {
    graph.object(subject, predicate).map(lexical)
}

/// Whether `head` starts an `rdf:first`/`rdf:rest` list.
pub fn is_list<G: DescriptionGraph + ?Sized>(graph: &G, head: TermRef<'_>) -> bool {
    head == TermRef::from(rdf::NIL)
        || as_node(head).is_some_and(|node| graph.object(node, rdf::FIRST).is_some())
}

/// Unrolls the `rdf:first`/`rdf:rest` list starting at `head`.
///
/// Walking stops at `rdf:nil`, at a node without `rdf:first`, at a literal
/// in rest position, or when a node is revisited.
pub fn rdf_list<G: DescriptionGraph + ?Sized>(graph: &G, head: TermRef<'_>) -> Vec<Term> {
    let mut items = Vec::new();
    let mut visited: HashSet<NamedOrBlankNode> = HashSet::new();
    let mut current = as_node(head).map(NamedOrBlankNodeRef::into_owned);
    while let Some(node) = current.take() {
        if node.as_ref() == NamedOrBlankNodeRef::from(rdf::NIL) {
            break;
        }
        if !visited.insert(node.clone()) {
            warn!(node = %node, "rdf list revisits a node; truncating");
            break;
        }
        let Some(first) = graph.object(node.as_ref(), rdf::FIRST) else {
            break;
        };
        items.push(first.into_owned());
        current = graph
            .object(node.as_ref(), rdf::REST)
            .and_then(as_node)
            .map(NamedOrBlankNodeRef::into_owned);
    }
    items
}
