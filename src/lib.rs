//! xmlnav - XPath-driven navigation over indexed XML documents
//!
//! A document is parsed once into an offset-based structural index. Query
//! sessions then walk it with a cursor and return detached [`Element`]
//! values, each carrying a canonical position path such as
//! `/root[1]/element[3]/childElement[2]` that selects it again.
//!
//! Layers:
//! - core: tokenizer, entity decoding, encoding detection
//! - index: structural index and the [`Document`] handle
//! - nav: [`Cursor`] with scoped save/restore, position resolution
//! - xpath: location-path compiler, [`QueryCache`], [`Evaluator`]
//! - session: [`XmlNavigator`], the fail-soft query surface
//! - batch: parallel evaluation of independent selectors
//!
//! ```
//! use xmlnav::{ParserConfig, XmlNavigator};
//!
//! let mut nav = XmlNavigator::new(ParserConfig::default());
//! nav.load_bytes("<root><item id='a'>one</item><item id='b'>two</item></root>")?;
//!
//! let items = nav.search_by_attribute("item", "id", "b")?;
//! assert_eq!(items[0].canonical_path(), "/root[1]/item[2]");
//! assert_eq!(items[0].text(), "two");
//! # Ok::<(), xmlnav::Error>(())
//! ```

mod core;

pub mod batch;
pub mod config;
pub mod element;
pub mod error;
pub mod index;
pub mod nav;
pub mod session;
pub mod xpath;

pub use config::ParserConfig;
pub use element::{materialize, Element};
pub use error::{Error, ParseError, Result};
pub use index::{Document, NodeAddress};
pub use nav::{resolve_position, Cursor, PositionTuple, SavedContext};
pub use session::XmlNavigator;
pub use xpath::{compile, CompiledQuery, Evaluator, QueryCache};
