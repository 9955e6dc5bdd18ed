//! Process-wide cache of compiled templates.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::config::CompileOptions;
use crate::domain::Template;
use crate::error::Result;

static GLOBAL: Lazy<TemplateCache> = Lazy::new(TemplateCache::new);

/// A thread-safe cache of compiled templates, keyed by template text and
/// compile options.
#[derive(Clone, Default)]
pub struct TemplateCache {
    inner: Arc<DashMap<(String, CompileOptions), Arc<Template>>>,
}

impl TemplateCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by [`crate::matches`].
    pub fn global() -> &'static TemplateCache {
        &GLOBAL
    }

    /// Return the compiled template, compiling and inserting it on first use.
    ///
    /// Compile errors are returned and never cached.
    pub fn get_or_compile(&self, template: &str, options: CompileOptions) -> Result<Arc<Template>> {
        let key = (template.to_string(), options);
        if let Some(hit) = self.inner.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = Arc::new(Template::compile_with(template, options)?);
        // the shard guard must be gone before len() locks every shard
        let compiled = Arc::clone(self.inner.entry(key).or_insert(compiled).value());
        debug!(template, cached = self.inner.len(), "cached compiled template");
        Ok(compiled)
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;

    #[test]
    fn test_cache_operations() {
        let cache = TemplateCache::new();
        assert!(cache.is_empty());

        let first = cache
            .get_or_compile("/widgets/{id}", CompileOptions::default())
            .unwrap();
        let second = cache
            .get_or_compile("/widgets/{id}", CompileOptions::default())
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache
            .get_or_compile("/widgets/{id}", CompileOptions::new(Dialect::Extended))
            .unwrap();
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = TemplateCache::new();
        assert!(cache
            .get_or_compile("/{-list|,|a,b}", CompileOptions::new(Dialect::Extended))
            .is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = TemplateCache::new();
        let clone = cache.clone();
        clone.get_or_compile("/a", CompileOptions::default()).unwrap();
        assert_eq!(cache.len(), 1);
    }
}
