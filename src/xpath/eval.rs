//! XPath Evaluation Engine
//!
//! Evaluates compiled selectors against a [`Document`]. Every step merges
//! its results across the current node set, deduplicates and sorts them
//! into document order. Predicates on a child step apply to each context
//! node's own children; predicates on a `//name` step apply to the merged
//! set.

use std::sync::Arc;
use std::vec;

use super::cache::QueryCache;
use super::compiler::{CompiledQuery, Op};
use super::parser::{NodeTest, Predicate};
use crate::error::{Error, Result};
use crate::index::{Document, NodeAddress};
use crate::nav::Cursor;

/// A member of an intermediate node set. The document node precedes every
/// element in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Node {
    Document,
    Element(NodeAddress),
}

/// Evaluate a compiled selector with `context` as the context element.
///
/// Absolute selectors ignore `context`, but it must still belong to `doc`.
pub fn evaluate(query: &CompiledQuery, doc: &Document, context: NodeAddress) -> Result<Vec<NodeAddress>> {
    if !doc.contains(context) {
        return Err(Error::evaluation(
            query.expression(),
            format!("context node {context} is not part of the document"),
        ));
    }

    let mut nodes: Vec<Node> = Vec::new();
    for op in query.ops() {
        nodes = match op {
            Op::Root => vec![Node::Document],
            Op::Context => vec![Node::Element(context)],
            Op::DescendantOrSelf => merge(&nodes, |node, out| {
                out.push(node);
                out.extend(descendants(doc, node).map(Node::Element));
            }),
            Op::Descendant(test) => merge(&nodes, |node, out| {
                out.extend(
                    descendants(doc, node)
                        .filter(|&addr| matches_node_test(doc, addr, test))
                        .map(Node::Element),
                );
            }),
            Op::Child(test, predicates) => merge(&nodes, |node, out| {
                let children: Vec<Node> = match node {
                    Node::Document if matches_node_test(doc, doc.root(), test) => vec![Node::Element(doc.root())],
                    Node::Document => Vec::new(),
                    Node::Element(addr) => doc
                        .element_children(addr)
                        .filter(|&child| matches_node_test(doc, child, test))
                        .map(Node::Element)
                        .collect(),
                };
                out.extend(
                    predicates
                        .iter()
                        .fold(children, |set, pred| apply_predicate(doc, set, pred)),
                );
            }),
            Op::Parent => merge(&nodes, |node, out| {
                if let Node::Element(addr) = node {
                    out.push(doc.parent(addr).map_or(Node::Document, Node::Element));
                }
            }),
            Op::Filter(pred) => apply_predicate(doc, nodes, pred),
        };

        if nodes.is_empty() {
            break;
        }
    }

    let matches: Vec<NodeAddress> = nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Element(addr) => Some(addr),
            Node::Document => None,
        })
        .collect();

    tracing::trace!(expression = query.expression(), matches = matches.len(), "selector evaluated");
    Ok(matches)
}

/// Apply `expand` to every node, then restore document order without duplicates
fn merge(nodes: &[Node], mut expand: impl FnMut(Node, &mut Vec<Node>)) -> Vec<Node> {
    let mut result = Vec::with_capacity(nodes.len());
    for &node in nodes {
        expand(node, &mut result);
    }
    result.sort_unstable();
    result.dedup();
    result
}

/// Filter an ordered node set; positions count within `nodes`
fn apply_predicate(doc: &Document, nodes: Vec<Node>, pred: &Predicate) -> Vec<Node> {
    match pred {
        Predicate::Position(n) => usize::try_from(*n)
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| nodes.get(idx).copied())
            .into_iter()
            .collect(),
        Predicate::Last => nodes.last().copied().into_iter().collect(),
        Predicate::AttrEq(name, value) => {
            retain_elements(nodes, |addr| doc.attribute(addr, name).is_some_and(|v| v == value.as_str()))
        }
        Predicate::AttrNotEq(name, value) => {
            retain_elements(nodes, |addr| doc.attribute(addr, name).is_some_and(|v| v != value.as_str()))
        }
        Predicate::AttrExists(name) => retain_elements(nodes, |addr| doc.attribute(addr, name).is_some()),
    }
}

fn retain_elements(mut nodes: Vec<Node>, mut keep: impl FnMut(NodeAddress) -> bool) -> Vec<Node> {
    nodes.retain(|node| match *node {
        Node::Element(addr) => keep(addr),
        Node::Document => false,
    });
    nodes
}

/// Element descendants of a node; for the document node that is every element
fn descendants(doc: &Document, node: Node) -> Box<dyn Iterator<Item = NodeAddress> + '_> {
    match node {
        Node::Document => {
            let root = doc.root();
            Box::new(std::iter::once(root).chain(doc.descendants(root)))
        }
        Node::Element(addr) => Box::new(doc.descendants(addr)),
    }
}

fn matches_node_test(doc: &Document, addr: NodeAddress, test: &NodeTest) -> bool {
    match test {
        NodeTest::Any => true,
        NodeTest::Name(name) => doc.tag_name(addr) == Some(name.as_str()),
    }
}

#[derive(Debug)]
enum State {
    Unstarted,
    Running(vec::IntoIter<NodeAddress>),
    Finished,
}

/// Bound selector plus its match iteration state.
///
/// Evaluation happens on the first [`next`](Evaluator::next) after a
/// [`bind`](Evaluator::bind), using the cursor's position at that moment as
/// the context element.
#[derive(Debug)]
pub struct Evaluator {
    cache: Arc<QueryCache>,
    query: Option<Arc<CompiledQuery>>,
    state: State,
}

impl Evaluator {
    pub fn new(cache: Arc<QueryCache>) -> Self {
        Self {
            cache,
            query: None,
            state: State::Unstarted,
        }
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    /// The bound selector, if any
    pub fn query(&self) -> Option<&CompiledQuery> {
        self.query.as_deref()
    }

    /// Discard prior state and bind `selector`.
    ///
    /// On a compilation error the evaluator is left unbound.
    pub fn bind(&mut self, selector: &str) -> Result<()> {
        self.reset();
        self.query = Some(self.cache.get_or_compile(selector)?);
        Ok(())
    }

    /// Drop the bound selector and any pending matches
    pub fn reset(&mut self) {
        self.query = None;
        self.state = State::Unstarted;
    }

    /// Next match in document order, `Ok(None)` once exhausted or unbound.
    ///
    /// An evaluation error ends the sequence.
    pub fn next(&mut self, cursor: &Cursor) -> Result<Option<NodeAddress>> {
        let Some(query) = &self.query else {
            return Ok(None);
        };
        let doc = cursor.document();

        if matches!(self.state, State::Unstarted) {
            match evaluate(query, doc, cursor.current_address()) {
                Ok(matches) => self.state = State::Running(matches.into_iter()),
                Err(err) => {
                    self.state = State::Finished;
                    return Err(err);
                }
            }
        }

        let next = match &mut self.state {
            State::Running(matches) => matches.next(),
            _ => return Ok(None),
        };

        match next {
            Some(addr) if doc.contains(addr) => Ok(Some(addr)),
            Some(addr) => {
                self.state = State::Finished;
                Err(Error::evaluation(
                    query.expression(),
                    format!("match {addr} is outside the document"),
                ))
            }
            None => {
                self.state = State::Finished;
                Ok(None)
            }
        }
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(Arc::new(QueryCache::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::xpath::compile;

    const XML: &str = "<r><a id='1'><b/><a id='2'><b/></a><b k=''/></a><c/><a/></r>";

    fn doc() -> Arc<Document> {
        Arc::new(Document::parse(XML, &ParserConfig::default()).unwrap())
    }

    fn names(doc: &Document, selector: &str, context: NodeAddress) -> Vec<String> {
        let query = compile(selector).unwrap();
        evaluate(&query, doc, context)
            .unwrap()
            .into_iter()
            .map(|addr| match doc.attribute(addr, "id") {
                Some(id) => format!("{}#{id}", doc.tag_name(addr).unwrap_or("")),
                None => format!("{}@{}", doc.tag_name(addr).unwrap_or(""), addr.index()),
            })
            .collect()
    }

    #[test]
    fn test_absolute_paths() {
        let doc = doc();
        assert_eq!(names(&doc, "/r", doc.root()), vec!["r@0"]);
        assert_eq!(names(&doc, "/a", doc.root()), Vec::<String>::new());
        assert_eq!(names(&doc, "/r/a", doc.root()), vec!["a#1", "a@7"]);
        assert_eq!(names(&doc, "/r[1]/a[2]", doc.root()), vec!["a@7"]);
        assert_eq!(names(&doc, "/*", doc.root()), vec!["r@0"]);
    }

    #[test]
    fn test_descendants_in_document_order() {
        let doc = doc();
        assert_eq!(names(&doc, "//a", doc.root()), vec!["a#1", "a#2", "a@7"]);
        assert_eq!(names(&doc, "//b", doc.root()), vec!["b@2", "b@4", "b@5"]);
        assert_eq!(names(&doc, "//r", doc.root()), vec!["r@0"]);
        assert_eq!(names(&doc, "/r//b", doc.root()).len(), 3);
        assert_eq!(names(&doc, "//a/b", doc.root()), vec!["b@2", "b@4", "b@5"]);
    }

    #[test]
    fn test_child_predicates_count_per_parent() {
        let doc = doc();
        assert_eq!(names(&doc, "//a/b[1]", doc.root()), vec!["b@2", "b@4"]);
        assert_eq!(names(&doc, "//a/b[last()]", doc.root()), vec!["b@4", "b@5"]);
        assert_eq!(names(&doc, "//a/b[2]", doc.root()), vec!["b@5"]);
        assert_eq!(names(&doc, "//a/b[@k][1]", doc.root()), vec!["b@5"]);
        assert_eq!(names(&doc, "//b[1]", doc.root()), vec!["b@2"]);

        let shelves = Document::parse(
            "<lib><shelf><book/><book/></shelf><shelf><book/></shelf></lib>",
            &ParserConfig::default(),
        )
        .unwrap();
        let first_books = evaluate(&compile("/lib/shelf/book[1]").unwrap(), &shelves, shelves.root()).unwrap();
        assert_eq!(first_books, vec![NodeAddress::new(2), NodeAddress::new(5)]);
        let first_book = evaluate(&compile("//book[1]").unwrap(), &shelves, shelves.root()).unwrap();
        assert_eq!(first_book, vec![NodeAddress::new(2)]);
    }

    #[test]
    fn test_predicates_filter_merged_set() {
        let doc = doc();
        assert_eq!(names(&doc, "//a[2]", doc.root()), vec!["a#2"]);
        assert_eq!(names(&doc, "//a[last()]", doc.root()), vec!["a@7"]);
        assert_eq!(names(&doc, "//a[0]", doc.root()), Vec::<String>::new());
        assert_eq!(names(&doc, "//a[9]", doc.root()), Vec::<String>::new());
        assert_eq!(names(&doc, "//a[@id][2]", doc.root()), vec!["a#2"]);
    }

    #[test]
    fn test_attribute_predicates() {
        let doc = doc();
        assert_eq!(names(&doc, "//a[@id='2']", doc.root()), vec!["a#2"]);
        assert_eq!(names(&doc, "//a[@id!='2']", doc.root()), vec!["a#1"]);
        assert_eq!(names(&doc, "//b[@k]", doc.root()), vec!["b@5"]);
        assert_eq!(names(&doc, "//b[@k='']", doc.root()), vec!["b@5"]);
        assert_eq!(names(&doc, "//*[@missing]", doc.root()), Vec::<String>::new());
    }

    #[test]
    fn test_relative_selectors() {
        let doc = doc();
        let first_a = NodeAddress::new(1);
        assert_eq!(names(&doc, "b", first_a), vec!["b@2", "b@5"]);
        assert_eq!(names(&doc, "./a", first_a), vec!["a#2"]);
        assert_eq!(names(&doc, ".//b", first_a), vec!["b@2", "b@4", "b@5"]);
        assert_eq!(names(&doc, ".", first_a), vec!["a#1"]);
        assert_eq!(names(&doc, "..", first_a), vec!["r@0"]);
        assert_eq!(names(&doc, "../c", first_a), vec!["c@6"]);
        assert_eq!(names(&doc, "..", doc.root()), Vec::<String>::new());
        assert_eq!(names(&doc, "//b/..", doc.root()), vec!["a#1", "a#2"]);
    }

    #[test]
    fn test_stale_context_is_an_error() {
        let doc = doc();
        let query = compile("/r").unwrap();
        let err = evaluate(&query, &doc, NodeAddress::new(99)).unwrap_err();
        assert!(matches!(err, Error::Evaluation { .. }));
    }

    #[test]
    fn test_evaluator_lazy_iteration() {
        let doc = doc();
        let mut cursor = Cursor::new(Arc::clone(&doc));
        let mut eval = Evaluator::default();

        eval.bind("a").unwrap();
        cursor.move_to_first_child();
        // context taken at the first next()
        assert_eq!(eval.next(&cursor).unwrap(), Some(NodeAddress::new(3)));
        cursor.reset();
        assert_eq!(eval.next(&cursor).unwrap(), None);
        assert_eq!(eval.next(&cursor).unwrap(), None);

        eval.bind("a").unwrap();
        let mut all = Vec::new();
        while let Some(addr) = eval.next(&cursor).unwrap() {
            all.push(addr.index());
        }
        assert_eq!(all, vec![1, 7]);
    }

    #[test]
    fn test_evaluator_unbound_and_failed_bind() {
        let doc = doc();
        let cursor = Cursor::new(doc);
        let mut eval = Evaluator::default();
        assert_eq!(eval.next(&cursor).unwrap(), None);

        eval.bind("//a").unwrap();
        assert!(eval.bind("//a[").is_err());
        assert!(eval.query().is_none());
        assert_eq!(eval.next(&cursor).unwrap(), None);
    }

    #[test]
    fn test_evaluator_out_of_bounds_match_ends_sequence() {
        // Matches computed against a larger document are foreign to this one
        let big = doc();
        let small = Arc::new(Document::parse("<r/>", &ParserConfig::default()).unwrap());
        let mut eval = Evaluator::default();
        eval.bind("//b").unwrap();

        let big_cursor = Cursor::new(big);
        let small_cursor = Cursor::new(small);
        assert_eq!(eval.next(&big_cursor).unwrap(), Some(NodeAddress::new(2)));
        assert!(matches!(eval.next(&small_cursor), Err(Error::Evaluation { .. })));
        assert_eq!(eval.next(&big_cursor).unwrap(), None);
    }
}
