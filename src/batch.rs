//! Batch evaluation
//!
//! Runs independent selectors against one shared document with Rayon.
//! Each selector gets its own session, so cursors are never shared;
//! matches within one selector are still processed sequentially.

use std::sync::Arc;

use rayon::prelude::*;

use crate::element::Element;
use crate::error::Result;
use crate::index::Document;
use crate::session::XmlNavigator;
use crate::xpath::QueryCache;

fn session(doc: &Arc<Document>, cache: &Arc<QueryCache>) -> XmlNavigator {
    let mut nav = XmlNavigator::with_cache(doc.config().clone(), Arc::clone(cache));
    nav.bind_document(Arc::clone(doc));
    nav
}

/// Count the matches of every selector, results in selector order
pub fn count_all(doc: &Arc<Document>, cache: &Arc<QueryCache>, selectors: &[&str]) -> Vec<Result<usize>> {
    tracing::debug!(selectors = selectors.len(), "batch count");
    selectors
        .par_iter()
        .map(|selector| session(doc, cache).count_matches(selector))
        .collect()
}

/// Materialize the matches of every selector, results in selector order
pub fn search_all(
    doc: &Arc<Document>,
    cache: &Arc<QueryCache>,
    selectors: &[&str],
) -> Vec<Result<Vec<Element>>> {
    tracing::debug!(selectors = selectors.len(), "batch search");
    selectors
        .par_iter()
        .map(|selector| session(doc, cache).search_by_xpath(selector))
        .collect()
}
