/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Mustache template compiler.
//!
//! Templates are compiled in four stages:
//!
//! - [`scan`] tokenizes the source, tracking delimiter changes and
//!   standalone lines
//! - [`build`] turns the tokens into a tree, checking that sections nest
//! - [`generate`] lowers the tree into a [`Program`] (or its textual form)
//! - the [`TemplateCache`] memoizes the whole pipeline per source and options
//!
//! Supported syntax: variables `{{name}}`, raw output `{{{name}}}` and
//! `{{&name}}`, dotted names `{{a.b}}`, the implicit iterator `{{.}}`,
//! sections `{{#x}}...{{/x}}`, inverted sections `{{^x}}...{{/x}}`, comments
//! `{{! ... }}`, partials `{{> name}}` and delimiter changes `{{=<% %>=}}`.
//!
//! # Example
//!
//! ```ignore
//! use stache_template::{MemoryResolver, Template, TemplateValue};
//!
//! let template = Template::compile("Hello, {{name}}!{{> footer}}")?;
//! let data: TemplateValue = [("name", "World")].into_iter().collect();
//! let partials = MemoryResolver::with_partials([("footer", " Bye.")]);
//!
//! let output = template.render_with_partials(&data, &partials)?;
//! assert_eq!(output, "Hello, World! Bye.");
//! ```

pub mod cache;
pub mod codegen;
pub mod context;
pub mod error;
pub mod options;
pub mod resolver;
pub mod runtime;
pub mod scanner;
pub mod template;
pub mod token;
pub mod tree;

// Re-export main types at crate root
pub use cache::{CacheConfig, TemplateCache, compile, compile_uncached, global_cache};
pub use codegen::{Lookup, Op, Program, generate, lower};
pub use context::{ContextStack, Lambda, TemplateValue};
pub use error::{TemplateError, TemplateResult};
pub use options::{
    CompileOptions, DEFAULT_MAX_PARTIAL_DEPTH, Delimiters, RenderOptions, SectionTag,
};
pub use resolver::{FileSystemResolver, MemoryResolver, NullResolver, PartialResolver};
pub use runtime::{Output, Renderer, escape, raw};
pub use scanner::scan;
pub use template::{Compiled, Template};
pub use token::{Tag, TagKind, Token};
pub use tree::{MAX_SECTION_DEPTH, Node, build};
