/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial template resolution.
//!
//! This module provides traits and implementations for loading partial templates
//! from various sources (filesystem, memory, etc.).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default file extension for partials loaded from disk.
pub const DEFAULT_PARTIAL_EXTENSION: &str = "mustache";

/// Trait for loading partial templates.
///
/// Implementations of this trait are responsible for finding and loading
/// partial template content given a partial name. A `None` result renders
/// the partial as empty text.
pub trait PartialResolver {
    /// Load a partial template by name (e.g., "header", "items/row").
    fn get_partial(&self, name: &str) -> Option<String>;
}

/// Resolver that loads partials from a directory.
///
/// - If the partial name has no extension, the resolver's extension is appended
/// - If the partial name has an extension, it is used as-is
/// - Names are resolved relative to the root directory
#[derive(Debug, Clone)]
pub struct FileSystemResolver {
    root: PathBuf,
    extension: String,
}

impl FileSystemResolver {
    /// Resolve partials as `<root>/<name>.mustache`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_PARTIAL_EXTENSION.to_string(),
        }
    }

    /// Use `extension` (without the leading dot) for extension-less names.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PartialResolver for FileSystemResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        let partial_path = resolve_partial_path(name, &self.root, &self.extension);
        match std::fs::read_to_string(&partial_path) {
            Ok(content) => Some(content),
            Err(err) => {
                tracing::debug!(path = %partial_path.display(), error = %err, "partial not loaded");
                None
            }
        }
    }
}

/// Resolver that returns nothing.
///
/// Use this resolver when rendering templates that don't use partials.
#[derive(Debug, Clone, Default)]
pub struct NullResolver;

impl PartialResolver for NullResolver {
    fn get_partial(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Resolver that loads partials from an in-memory map.
///
/// Useful for testing and for scenarios where templates are bundled
/// into the application.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    partials: HashMap<String, String>,
}

impl MemoryResolver {
    /// Create a new empty memory resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a partial to the resolver.
    ///
    /// The name should match what will be used in the template (e.g., "header").
    pub fn add(&mut self, name: impl Into<String>, content: impl Into<String>) -> &mut Self {
        self.partials.insert(name.into(), content.into());
        self
    }

    /// Create a resolver with the given partials.
    pub fn with_partials(
        partials: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        let mut resolver = Self::new();
        for (name, content) in partials {
            resolver.add(name, content);
        }
        resolver
    }
}

impl PartialResolver for MemoryResolver {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.partials.get(name).cloned()
    }
}

impl PartialResolver for HashMap<String, String> {
    fn get_partial(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Resolve the path to a partial file.
///
/// # Examples
///
/// ```ignore
/// // Root: /templates, ext: mustache, partial: "header" → /templates/header.mustache
/// // Root: /templates, ext: mustache, partial: "header.html" → /templates/header.html
/// // Root: /templates, ext: mustache, partial: "inc/header" → /templates/inc/header.mustache
/// ```
pub fn resolve_partial_path(partial_name: &str, root: &Path, extension: &str) -> PathBuf {
    let partial_path = Path::new(partial_name);

    if partial_path.extension().is_some() || extension.is_empty() {
        root.join(partial_name)
    } else {
        root.join(partial_name).with_extension(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_partial_path_no_extension() {
        let result = resolve_partial_path("header", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/header.mustache"));
    }

    #[test]
    fn test_resolve_partial_path_with_extension() {
        let result = resolve_partial_path("header.html", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/header.html"));
    }

    #[test]
    fn test_resolve_partial_path_subdirectory() {
        let result = resolve_partial_path("inc/header", Path::new("/templates"), "mustache");
        assert_eq!(result, PathBuf::from("/templates/inc/header.mustache"));
    }

    #[test]
    fn test_resolve_partial_path_empty_extension() {
        let result = resolve_partial_path("header", Path::new("/templates"), "");
        assert_eq!(result, PathBuf::from("/templates/header"));
    }

    #[test]
    fn test_null_resolver() {
        let resolver = NullResolver;
        assert!(resolver.get_partial("anything").is_none());
    }

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryResolver::new();
        resolver.add("header", "<h1>Title</h1>");
        resolver.add("footer", "<footer>End</footer>");

        assert_eq!(
            resolver.get_partial("header"),
            Some("<h1>Title</h1>".to_string())
        );
        assert_eq!(
            resolver.get_partial("footer"),
            Some("<footer>End</footer>".to_string())
        );
        assert!(resolver.get_partial("missing").is_none());
    }

    #[test]
    fn test_memory_resolver_with_partials() {
        let resolver = MemoryResolver::with_partials([("a", "content a"), ("b", "content b")]);

        assert_eq!(resolver.get_partial("a"), Some("content a".to_string()));
        assert_eq!(resolver.get_partial("b"), Some("content b".to_string()));
    }

    #[test]
    fn test_hash_map_resolver() {
        let mut partials = HashMap::new();
        partials.insert("row".to_string(), "<tr/>".to_string());
        assert_eq!(partials.get_partial("row"), Some("<tr/>".to_string()));
        assert_eq!(partials.get_partial("col"), None);
    }

    #[test]
    fn test_file_system_resolver_missing_file() {
        let resolver = FileSystemResolver::new("/nonexistent-stache-dir").with_extension("tpl");
        assert!(resolver.get_partial("header").is_none());
        assert_eq!(resolver.root(), Path::new("/nonexistent-stache-dir"));
    }
}
