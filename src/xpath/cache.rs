//! Compiled selector cache
//!
//! An explicit LRU keyed by selector text. One cache can back many sessions
//! through `Arc<QueryCache>`.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;

use super::compiler::{compile, CompiledQuery};
use crate::error::Result;

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

pub struct QueryCache {
    entries: Mutex<LruCache<String, Arc<CompiledQuery>>>,
}

impl QueryCache {
    /// Create a cache holding up to `capacity` compiled selectors (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the cached compilation of `expression`, compiling on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, expression: &str) -> Result<Arc<CompiledQuery>> {
        if let Some(hit) = self.lock().get(expression) {
            tracing::trace!(expression, "selector cache hit");
            return Ok(Arc::clone(hit));
        }

        let compiled = Arc::new(compile(expression)?);
        tracing::trace!(expression, ops = compiled.ops().len(), "selector compiled");
        self.lock().put(expression.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<CompiledQuery>>> {
        // Entries are immutable once inserted
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
