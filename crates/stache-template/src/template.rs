/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compiled template types.

use std::path::Path;
use std::sync::Arc;

use crate::cache;
use crate::codegen::{Program, lower};
use crate::error::TemplateResult;
use crate::options::CompileOptions;
use crate::scanner::scan;
use crate::tree::build;

/// A compiled template ready for rendering.
///
/// Immutable once built; shared through the compilation cache as `Arc<Template>`.
#[derive(Debug, Clone)]
pub struct Template {
    /// The generated program.
    pub(crate) program: Program,

    /// Original source (for lambdas and introspection).
    pub(crate) source: String,

    /// Options the template was compiled with.
    pub(crate) options: CompileOptions,
}

impl Template {
    pub(crate) fn new(program: Program, source: &str, options: CompileOptions) -> Self {
        Self {
            program,
            source: source.to_string(),
            options,
        }
    }

    /// Compile a template through the process-wide cache with default options.
    pub fn compile(source: &str) -> TemplateResult<Arc<Self>> {
        Self::compile_with_options(source, &CompileOptions::default())
    }

    /// Compile a template through the process-wide cache.
    ///
    /// `as_compiled_source` is ignored; use [`cache::compile`] to get the
    /// textual form.
    pub fn compile_with_options(source: &str, options: &CompileOptions) -> TemplateResult<Arc<Self>> {
        cache::global_cache().template(source, options)
    }

    /// Read a template file and compile it through the process-wide cache.
    pub fn compile_from_file(path: &Path, options: &CompileOptions) -> TemplateResult<Arc<Self>> {
        let source = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded template");
        Self::compile_with_options(&source, options)
    }

    /// Compile a template without consulting any cache.
    pub fn parse(source: &str, options: &CompileOptions) -> TemplateResult<Self> {
        let tokens = scan(source, options.delimiters.as_ref())?;
        let tree = build(tokens, &options.section_tags)?;
        let options = CompileOptions {
            as_compiled_source: false,
            ..options.clone()
        };
        Ok(Self::new(lower(&tree), source, options))
    }

    /// The template source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The options this template was compiled with.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// The generated program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The textual procedure definition of this template's program.
    pub fn to_compiled_source(&self) -> String {
        self.program.to_source()
    }
}

/// Result of compilation: an executable template, or its textual form when
/// compiled with `as_compiled_source`.
#[derive(Debug, Clone)]
pub enum Compiled {
    Template(Arc<Template>),
    Source(Arc<str>),
}

impl Compiled {
    pub fn as_template(&self) -> Option<&Arc<Template>> {
        match self {
            Compiled::Template(template) => Some(template),
            Compiled::Source(_) => None,
        }
    }

    pub fn into_template(self) -> Option<Arc<Template>> {
        match self {
            Compiled::Template(template) => Some(template),
            Compiled::Source(_) => None,
        }
    }

    pub fn as_source(&self) -> Option<&str> {
        match self {
            Compiled::Template(_) => None,
            Compiled::Source(source) => Some(source),
        }
    }

    /// Whether both values are the same shared allocation.
    pub fn ptr_eq(&self, other: &Compiled) -> bool {
        match (self, other) {
            (Compiled::Template(a), Compiled::Template(b)) => Arc::ptr_eq(a, b),
            (Compiled::Source(a), Compiled::Source(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
