/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled-template cache.
//!
//! Compilation is memoized on the source text together with every option
//! that shapes the generated program, so a cached value is always the one a
//! fresh compilation would produce.
//!
//! Entries are compiled outside the lock and published with a single write,
//! so readers never observe a partially built entry. Two threads missing on
//! the same key may both compile; the first insert wins and both callers get
//! that entry.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::codegen::generate;
use crate::error::TemplateResult;
use crate::options::CompileOptions;
use crate::scanner::scan;
use crate::template::{Compiled, Template};
use crate::tree::build;

/// Capacity of the process-wide cache.
pub const DEFAULT_GLOBAL_CAPACITY: usize = 1024;

static GLOBAL_CACHE: Lazy<TemplateCache> =
    Lazy::new(|| TemplateCache::with_capacity(DEFAULT_GLOBAL_CAPACITY));

/// The process-wide cache used by [`compile`] and by partial resolution.
pub fn global_cache() -> &'static TemplateCache {
    &GLOBAL_CACHE
}

/// Compile `source` through the process-wide cache.
pub fn compile(source: &str, options: &CompileOptions) -> TemplateResult<Compiled> {
    GLOBAL_CACHE.compile(source, options)
}

/// Run the full pipeline (scan, build, generate) without caching.
pub fn compile_uncached(source: &str, options: &CompileOptions) -> TemplateResult<Compiled> {
    let tokens = scan(source, options.delimiters.as_ref())?;
    let tree = build(tokens, &options.section_tags)?;
    Ok(generate(&tree, source, options))
}

/// Cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries; the oldest entry is evicted first.
    /// `None` keeps every entry for the life of the cache.
    pub capacity: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    source: String,
    options: CompileOptions,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, Compiled>,
    /// Insertion order, for eviction.
    order: VecDeque<CacheKey>,
}

/// A thread-safe memo of `(source, options) -> Compiled`.
#[derive(Debug, Default)]
pub struct TemplateCache {
    config: CacheConfig,
    inner: RwLock<CacheInner>,
}

impl TemplateCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache holding at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_config(CacheConfig {
            capacity: Some(capacity),
        })
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            inner: RwLock::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Compile `source`, reusing a previous result for the same source and options.
    pub fn compile(&self, source: &str, options: &CompileOptions) -> TemplateResult<Compiled> {
        let key = CacheKey {
            source: source.to_string(),
            options: options.clone(),
        };

        if let Some(hit) = self.read().entries.get(&key) {
            tracing::trace!(len = source.len(), "template cache hit");
            return Ok(hit.clone());
        }

        tracing::debug!(
            len = source.len(),
            as_compiled_source = options.as_compiled_source,
            "template cache miss, compiling"
        );
        let compiled = compile_uncached(source, options)?;

        let mut inner = self.write();
        if let Some(existing) = inner.entries.get(&key) {
            return Ok(existing.clone());
        }
        if let Some(capacity) = self.config.capacity {
            if capacity == 0 {
                return Ok(compiled);
            }
            while inner.entries.len() >= capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.entries.remove(&oldest);
                tracing::trace!("evicted template cache entry");
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, compiled.clone());
        Ok(compiled)
    }

    /// Compile `source` as an executable template, whatever `options.as_compiled_source` says.
    pub fn template(&self, source: &str, options: &CompileOptions) -> TemplateResult<Arc<Template>> {
        let options = CompileOptions {
            as_compiled_source: false,
            ..options.clone()
        };
        match self.compile(source, &options)? {
            Compiled::Template(template) => Ok(template),
            Compiled::Source(_) => unreachable!("as_compiled_source is cleared above"),
        }
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.entries.clear();
        inner.order.clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TemplateValue;
    use crate::error::TemplateError;
    use crate::options::{Delimiters, SectionTag};

    fn data() -> TemplateValue {
        [("x", "1")].into_iter().collect()
    }

    #[test]
    fn test_hit_returns_same_entry() {
        let cache = TemplateCache::new();
        let options = CompileOptions::default();
        let a = cache.compile("{{x}}", &options).unwrap();
        let b = cache.compile("{{x}}", &options).unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_options_get_distinct_entries() {
        let cache = TemplateCache::new();
        let source = "{{x}}<%x%>";
        let plain = cache.compile(source, &CompileOptions::default()).unwrap();
        let custom = cache
            .compile(
                source,
                &CompileOptions::default().with_delimiters(Delimiters::parse("<% %>", 0).unwrap()),
            )
            .unwrap();
        let as_source = cache
            .compile(source, &CompileOptions::default().with_compiled_source(true))
            .unwrap();
        let tagged = cache
            .compile(
                source,
                &CompileOptions::default().with_section_tag(SectionTag::new("_a", "a")),
            )
            .unwrap();

        assert_eq!(cache.len(), 4);
        assert!(!plain.ptr_eq(&custom));
        assert!(!plain.ptr_eq(&tagged));
        assert!(as_source.as_source().is_some());

        let plain = plain.into_template().unwrap();
        let custom = custom.into_template().unwrap();
        assert_eq!(plain.render(&data()).unwrap(), "1<%x%>");
        assert_eq!(custom.render(&data()).unwrap(), "{{x}}1");
    }

    #[test]
    fn test_cached_matches_uncached() {
        let cache = TemplateCache::new();
        let options = CompileOptions::default();
        let source = "{{#x}}[{{.}}]{{/x}}";
        let cached = cache.template(source, &options).unwrap();
        let again = cache.template(source, &options).unwrap();
        let fresh = compile_uncached(source, &options)
            .unwrap()
            .into_template()
            .unwrap();
        let expected = fresh.render(&data()).unwrap();
        assert_eq!(cached.render(&data()).unwrap(), expected);
        assert_eq!(again.render(&data()).unwrap(), expected);
        assert_eq!(expected, "[1]");
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = TemplateCache::new();
        assert!(matches!(
            cache.compile("{{/a}}", &CompileOptions::default()),
            Err(TemplateError::UnmatchedClose { .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = TemplateCache::with_capacity(2);
        let options = CompileOptions::default();
        let first = cache.compile("a", &options).unwrap();
        cache.compile("b", &options).unwrap();
        cache.compile("c", &options).unwrap();
        assert_eq!(cache.len(), 2);

        // "a" was evicted, so compiling it again yields a new entry.
        let again = cache.compile("a", &options).unwrap();
        assert!(!first.ptr_eq(&again));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = TemplateCache::with_capacity(0);
        cache.compile("a", &CompileOptions::default()).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = TemplateCache::new();
        cache.compile("a", &CompileOptions::default()).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_template_ignores_compiled_source_flag() {
        let cache = TemplateCache::new();
        let options = CompileOptions::default().with_compiled_source(true);
        let template = cache.template("{{x}}", &options).unwrap();
        assert_eq!(template.render(&data()).unwrap(), "1");

        // Both requests resolve to the single executable entry.
        let plain = cache.template("{{x}}", &CompileOptions::default()).unwrap();
        assert!(Arc::ptr_eq(&template, &plain));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_compiles_agree() {
        let cache = Arc::new(TemplateCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache
                        .template("{{#x}}{{.}}{{/x}}", &CompileOptions::default())
                        .unwrap()
                        .render(&data())
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "1");
        }
        assert_eq!(cache.len(), 1);
    }
}
