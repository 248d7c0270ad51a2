//! Structural Index Module
//!
//! Memory-efficient representation of a parsed XML document using byte
//! offsets into the decoded input.
//!
//! ```text
//! Document
//! ├── text: String                    # decoded input
//! └── StructuralIndex
//!     ├── elements: Vec<IndexElement>     # document order, address = position
//!     ├── texts: Vec<IndexText>
//!     ├── attributes: Vec<IndexAttribute>
//!     └── children: flat storage of ChildRef
//! ```

pub mod builder;
pub mod document;
pub mod element;
pub mod span;
pub mod structural;

pub use document::{Document, NodeAddress};
pub use span::Span;
pub use structural::StructuralIndex;
