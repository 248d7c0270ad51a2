//! Query session
//!
//! [`XmlNavigator`] owns one cursor over a bound document plus an evaluator,
//! and exposes the element queries. Queries are fail-soft: a missing
//! document or an evaluation failure is logged and degrades to an empty or
//! partial result. Only selector compilation errors reach the caller.

use std::path::Path;
use std::sync::Arc;

use crate::config::ParserConfig;
use crate::element::{materialize, Element};
use crate::error::{Error, Result};
use crate::index::{Document, NodeAddress};
use crate::nav::Cursor;
use crate::xpath::{Evaluator, QueryCache};

pub struct XmlNavigator {
    config: ParserConfig,
    evaluator: Evaluator,
    cursor: Option<Cursor>,
}

impl XmlNavigator {
    /// Create a session with its own selector cache
    pub fn new(config: ParserConfig) -> Self {
        Self::with_cache(config, Arc::new(QueryCache::default()))
    }

    /// Create a session backed by a shared selector cache
    pub fn with_cache(config: ParserConfig, cache: Arc<QueryCache>) -> Self {
        Self {
            config,
            evaluator: Evaluator::new(cache),
            cursor: None,
        }
    }

    /// Load and bind a document file.
    ///
    /// Any previously bound document is released first, so a failed load
    /// leaves the session without a document.
    pub fn load_document(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.close();
        let doc = Document::open(path.as_ref(), &self.config)?;
        self.bind_document(Arc::new(doc));
        Ok(())
    }

    /// Parse and bind in-memory document bytes
    pub fn load_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        self.close();
        let doc = Document::parse(bytes, &self.config)?;
        self.bind_document(Arc::new(doc));
        Ok(())
    }

    /// Bind an already parsed document, replacing any current one
    pub fn bind_document(&mut self, doc: Arc<Document>) {
        self.evaluator.reset();
        self.cursor = Some(Cursor::new(doc));
    }

    /// Release the bound document
    pub fn close(&mut self) {
        self.evaluator.reset();
        if self.cursor.take().is_some() {
            tracing::debug!("document released");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn document(&self) -> Option<&Arc<Document>> {
        self.cursor.as_ref().map(Cursor::document)
    }

    /// The bound document, or `DocumentNotLoaded`
    pub fn document_required(&self) -> Result<&Arc<Document>> {
        self.document().ok_or(Error::DocumentNotLoaded)
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        self.evaluator.cache()
    }

    /// Every element matching `selector`, in document order
    pub fn search_by_xpath(&mut self, selector: &str) -> Result<Vec<Element>> {
        self.collect(selector, usize::MAX)
    }

    /// Elements named `tag` whose attribute `attr_name` equals `attr_value`
    pub fn search_by_attribute(&mut self, tag: &str, attr_name: &str, attr_value: &str) -> Result<Vec<Element>> {
        let selector = format!("//{tag}[@{attr_name}={}]", quote_literal(attr_value)?);
        self.search_by_xpath(&selector)
    }

    /// The `index`-th (0-based) element named `tag` in document order
    pub fn search_by_index(&mut self, tag: &str, index: usize) -> Result<Option<Element>> {
        let selector = format!("//{tag}[{}]", index.saturating_add(1));
        Ok(self.collect(&selector, 1)?.into_iter().next())
    }

    /// Children of `parent` whose attribute `attr_name` equals `attr_value`
    pub fn search_children_by_attribute(
        &mut self,
        parent: &Element,
        attr_name: &str,
        attr_value: &str,
    ) -> Result<Vec<Element>> {
        let selector = format!(
            "{}/*[@{attr_name}={}]",
            parent.canonical_path(),
            quote_literal(attr_value)?
        );
        self.search_by_xpath(&selector)
    }

    /// Element children of `parent`, in document order
    pub fn get_children(&mut self, parent: &Element) -> Result<Vec<Element>> {
        let selector = format!("{}/*", parent.canonical_path());
        self.search_by_xpath(&selector)
    }

    /// Number of matches, without materializing them
    pub fn count_matches(&mut self, selector: &str) -> Result<usize> {
        let mut count = 0;
        self.for_each_match(selector, |_, _| {
            count += 1;
            true
        })?;
        Ok(count)
    }

    /// Text of the first match; `None` when nothing matches or the first
    /// match has no text
    pub fn first_text_value(&mut self, selector: &str) -> Result<Option<String>> {
        let mut value = None;
        self.for_each_match(selector, |cursor, addr| {
            value = cursor.document().first_text(addr).map(|text| text.into_owned());
            false
        })?;
        Ok(value)
    }

    pub fn exists(&mut self, selector: &str) -> Result<bool> {
        let mut found = false;
        self.for_each_match(selector, |_, _| {
            found = true;
            false
        })?;
        Ok(found)
    }

    /// Materialize up to `limit` matches
    fn collect(&mut self, selector: &str, limit: usize) -> Result<Vec<Element>> {
        let mut elements = Vec::new();
        self.for_each_match(selector, |cursor, addr| {
            let mut saved = cursor.save();
            if !saved.move_to(addr) {
                tracing::warn!(selector, %addr, "match is outside the document; returning partial results");
                return false;
            }
            match materialize(&mut saved, elements.len() + 1) {
                Ok(element) => {
                    tracing::trace!(selector, path = element.canonical_path(), "match materialized");
                    elements.push(element);
                }
                Err(err) => {
                    tracing::warn!(selector, error = %err, "materialization failed; returning partial results");
                    return false;
                }
            }
            elements.len() < limit
        })?;
        Ok(elements)
    }

    /// Bind `selector` and feed matches to `visit` until it returns false.
    ///
    /// Compilation errors propagate; everything else is logged and ends the
    /// iteration. The cursor is back at the root element afterwards.
    fn for_each_match(
        &mut self,
        selector: &str,
        mut visit: impl FnMut(&mut Cursor, NodeAddress) -> bool,
    ) -> Result<()> {
        let Some(cursor) = self.cursor.as_mut() else {
            tracing::warn!(selector, error = %Error::DocumentNotLoaded, "query skipped");
            return Ok(());
        };

        self.evaluator.bind(selector)?;
        loop {
            match self.evaluator.next(cursor) {
                Ok(Some(addr)) => {
                    if !visit(cursor, addr) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(selector, error = %err, "evaluation failed; returning partial results");
                    break;
                }
            }
        }
        self.evaluator.reset();

        debug_assert_eq!(cursor.depth(), 0, "context stack not unwound");
        debug_assert_eq!(cursor.current_address(), cursor.document().root(), "cursor not restored");
        Ok(())
    }
}

impl Default for XmlNavigator {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl std::fmt::Debug for XmlNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlNavigator")
            .field("config", &self.config)
            .field("document", &self.document())
            .finish()
    }
}

/// Quote `value` as a selector string literal: `'` unless the value
/// contains one, then `"`
fn quote_literal(value: &str) -> Result<String> {
    match (value.contains('\''), value.contains('"')) {
        (false, _) => Ok(format!("'{value}'")),
        (true, false) => Ok(format!("\"{value}\"")),
        (true, true) => Err(Error::compilation(
            value,
            "literal contains both quote characters",
        )),
    }
}
