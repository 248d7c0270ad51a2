//! XPath Expression Compiler
//!
//! Lowers a parsed selector into a flat list of node-set operations.

use super::parser::{Axis, NodeTest, Predicate, Selector};
use crate::error::{Error, Result};

/// Compiled selector
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    expression: String,
    ops: Vec<Op>,
}

/// Compiled operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Start from the document node
    Root,
    /// Start from the context element
    Context,
    /// Replace the set with its descendant-or-self closure
    DescendantOrSelf,
    /// Fast path for `//name`: descendants matching the test
    Descendant(NodeTest),
    /// Element children matching the test, each context node's children
    /// filtered on their own before the merge
    Child(NodeTest, Vec<Predicate>),
    /// Parent elements
    Parent,
    /// Filter the whole document-ordered set
    Filter(Predicate),
}

impl CompiledQuery {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// True when evaluation ignores the context node
    pub fn is_absolute(&self) -> bool {
        matches!(self.ops.first(), Some(Op::Root))
    }

    fn lower(expression: &str, selector: &Selector) -> Self {
        let mut ops = Vec::with_capacity(selector.steps.len() * 2 + 1);
        ops.push(if selector.absolute { Op::Root } else { Op::Context });

        for step in &selector.steps {
            match (&step.axis, step.descendant) {
                (Axis::Child(test), true) => {
                    ops.push(Op::Descendant(test.clone()));
                    ops.extend(step.predicates.iter().cloned().map(Op::Filter));
                }
                (Axis::Child(test), false) => ops.push(Op::Child(test.clone(), step.predicates.clone())),
                (Axis::SelfNode, descendant) => {
                    if descendant {
                        ops.push(Op::DescendantOrSelf);
                    }
                }
                (Axis::Parent, descendant) => {
                    if descendant {
                        ops.push(Op::DescendantOrSelf);
                    }
                    ops.push(Op::Parent);
                }
            }
        }

        CompiledQuery {
            expression: expression.to_string(),
            ops,
        }
    }
}

/// Compile a selector string
pub fn compile(expression: &str) -> Result<CompiledQuery> {
    let selector =
        super::parser::parse(expression).map_err(|reason| Error::compilation(expression, reason))?;
    Ok(CompiledQuery::lower(expression, &selector))
}
