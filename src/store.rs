//! The cache between the facade and the finder.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::builder::Config;
use crate::error::ConfigError;
use crate::finder::Finder;
use crate::value::ConfigValue;

/// Caches resolved values per key.
///
/// The cache is unbounded and never expires on its own: configuration sets
/// are small and finite. Under the `always_reload` policy the entry for a
/// key is evicted at the start of every access, so each access is a fresh
/// load.
pub struct Store {
    finder: Finder,
    config: Arc<Config>,
    cache: IndexMap<String, ConfigValue>,
}

impl Store {
    /// Create an empty store over the given configuration.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            finder: Finder::new(Arc::clone(&config)),
            config,
            cache: IndexMap::new(),
        }
    }

    /// Retrieve the value for a key, expiring the cache and/or loading it
    /// if necessary.
    ///
    /// # Errors
    ///
    /// Propagates the finder's [`ConfigError`] unmodified.
    pub fn get(&mut self, key: &str) -> Result<ConfigValue, ConfigError> {
        if self.config.always_reload() && self.cache.shift_remove(key).is_some() {
            tracing::trace!(key, "store: evicted entry for reload");
        }
        if let Some(value) = self.cache.get(key) {
            tracing::trace!(key, "store: cache hit");
            return Ok(value.clone());
        }
        let value = self.finder.load(key)?;
        self.cache.insert(key.to_owned(), value.clone());
        tracing::debug!(key, cached = self.cache.len(), "store: cached new entry");
        Ok(value)
    }

    /// The currently cached keys, in the order they were first cached.
    pub fn keys(&self) -> Vec<String> {
        self.cache.keys().cloned().collect()
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
