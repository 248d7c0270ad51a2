//! XPath location paths
//!
//! A compact XPath subset for element selection:
//! - Absolute, relative and `//` descendant paths
//! - `*`, `.` and `..` steps
//! - `[n]`, `[last()]` and attribute predicates
//! - Compiled selector caching

pub mod cache;
pub mod compiler;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use cache::{QueryCache, DEFAULT_CACHE_CAPACITY};
pub use compiler::{compile, CompiledQuery};
pub use eval::{evaluate, Evaluator};
