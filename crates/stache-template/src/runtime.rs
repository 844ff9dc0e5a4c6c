/*
 * runtime.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template rendering.
//!
//! The [`Renderer`] executes a [`Program`] against a [`ContextStack`]. It
//! owns the primitives a program needs at run time: value lookup, section
//! tests, partial resolution and the [`Output`] buffer with its escaped and
//! raw emitters.

use std::borrow::Cow;

use crate::cache;
use crate::codegen::{Lookup, Op, Program};
use crate::context::{ContextStack, Lambda, TemplateValue};
use crate::error::{TemplateError, TemplateResult};
use crate::options::{CompileOptions, Delimiters, RenderOptions};
use crate::resolver::{NullResolver, PartialResolver};
use crate::template::Template;

/// Characters replaced by [`escape`], with their entities.
pub const HTML_ESCAPES: &[(char, &str)] = &[
    ('&', "&amp;"),
    ('<', "&lt;"),
    ('>', "&gt;"),
    ('"', "&quot;"),
    ('\'', "&#39;"),
];

/// HTML-escape `text` for `{{name}}` output.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(|c: char| HTML_ESCAPES.iter().any(|(e, _)| *e == c)) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match HTML_ESCAPES.iter().find(|(e, _)| *e == c) {
            Some((_, entity)) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Unescaped output for `{{{name}}}` and `{{&name}}`.
pub fn raw(text: &str) -> Cow<'_, str> {
    Cow::Borrowed(text)
}

impl Template {
    /// Render this template with the given data and no partials.
    pub fn render(&self, data: &TemplateValue) -> TemplateResult<String> {
        self.render_with(data, &NullResolver, &RenderOptions::default())
    }

    /// Render this template, loading partials from `partials`.
    pub fn render_with_partials(
        &self,
        data: &TemplateValue,
        partials: &dyn PartialResolver,
    ) -> TemplateResult<String> {
        self.render_with(data, partials, &RenderOptions::default())
    }

    /// Render this template with explicit render options.
    pub fn render_with(
        &self,
        data: &TemplateValue,
        partials: &dyn PartialResolver,
        options: &RenderOptions,
    ) -> TemplateResult<String> {
        let mut renderer = Renderer::new(data, partials, &self.options, options);
        renderer.run(&self.program, &self.source)?;
        Ok(renderer.finish())
    }
}

/// Output buffer.
///
/// Tracks the indentation of the partial currently being rendered; the
/// indentation is written before the first output on each line.
#[derive(Debug, Default)]
pub struct Output {
    buf: String,
    indent: String,
    at_line_start: bool,
}

impl Output {
    /// Append text, indenting it if it starts a line.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start {
            self.buf.push_str(&self.indent);
            self.at_line_start = false;
        }
        self.buf.push_str(text);
    }

    pub fn newline(&mut self, newline: &str) {
        self.write(newline);
        self.at_line_start = true;
    }

    /// Extend the indentation for a standalone partial. Returns the value to
    /// pass to [`Output::pop_indent`].
    pub fn push_indent(&mut self, indent: &str) -> usize {
        let saved = self.indent.len();
        if !indent.is_empty() {
            self.indent.push_str(indent);
            self.at_line_start = true;
        }
        saved
    }

    pub fn pop_indent(&mut self, saved: usize) {
        self.indent.truncate(saved);
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

/// Executes programs against a context stack.
pub struct Renderer<'a> {
    stack: ContextStack<'a>,
    partials: &'a dyn PartialResolver,
    compile_options: &'a CompileOptions,
    options: &'a RenderOptions,
    out: Output,
    depth: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(
        data: &'a TemplateValue,
        partials: &'a dyn PartialResolver,
        compile_options: &'a CompileOptions,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            stack: ContextStack::new(data),
            partials,
            compile_options,
            options,
            out: Output::default(),
            depth: 0,
        }
    }

    /// Consume the renderer and return the output text.
    pub fn finish(self) -> String {
        self.out.into_string()
    }

    /// Execute `program`; `source` is the text it was compiled from.
    pub fn run(&mut self, program: &Program, source: &str) -> TemplateResult<()> {
        for op in program.ops() {
            match op {
                Op::Text(text) => self.out.write(text),
                Op::Newline(newline) => self.out.newline(newline),
                Op::Interpolate { lookup, escaped } => self.interpolate(lookup, *escaped)?,
                Op::Section {
                    lookup,
                    body,
                    start,
                    end,
                    delimiters,
                } => {
                    let text = source.get(*start..*end).unwrap_or("");
                    self.section(lookup, body, source, text, delimiters)?;
                }
                Op::Inverted { lookup, body } => {
                    if !self.test(lookup) {
                        self.run(body, source)?;
                    }
                }
                Op::Partial { name, indent } => self.partial(name, indent)?,
            }
        }
        Ok(())
    }

    /// Resolve a name against the stack.
    pub fn resolve(&self, lookup: &Lookup) -> Option<&'a TemplateValue> {
        match lookup {
            Lookup::Implicit => self.stack.top(),
            Lookup::Flat(name) => self.stack.lookup(name),
            Lookup::Dotted(path) => self.stack.lookup_dotted(path),
        }
    }

    /// Section truthiness of a name. Missing values are falsy.
    pub fn test(&self, lookup: &Lookup) -> bool {
        self.resolve(lookup).is_some_and(TemplateValue::is_truthy)
    }

    fn interpolate(&mut self, lookup: &Lookup, escaped: bool) -> TemplateResult<()> {
        let text = match self.resolve(lookup) {
            None => return Ok(()),
            Some(TemplateValue::Lambda(lambda)) => {
                let result = lambda.call("");
                self.expand_to_string(&lookup.name(), &result)?
            }
            Some(value) => value.render(),
        };
        let text = if escaped { escape(&text) } else { raw(&text) };
        self.out.write(&text);
        Ok(())
    }

    fn section(
        &mut self,
        lookup: &Lookup,
        body: &Program,
        source: &str,
        text: &str,
        delimiters: &Delimiters,
    ) -> TemplateResult<()> {
        match self.resolve(lookup) {
            Some(TemplateValue::Lambda(lambda)) => {
                self.expand_lambda(&lookup.name(), lambda, text, delimiters)
            }
            Some(TemplateValue::List(items)) => {
                for item in items {
                    self.with_frame(item, |renderer| renderer.run(body, source))?;
                }
                Ok(())
            }
            Some(value) if value.is_truthy() => {
                self.with_frame(value, |renderer| renderer.run(body, source))
            }
            _ => Ok(()),
        }
    }

    fn with_frame(
        &mut self,
        value: &'a TemplateValue,
        f: impl FnOnce(&mut Self) -> TemplateResult<()>,
    ) -> TemplateResult<()> {
        self.stack.push(value);
        let result = f(self);
        self.stack.pop();
        result
    }

    /// Render a named partial with the current stack.
    fn partial(&mut self, name: &str, indent: &str) -> TemplateResult<()> {
        let Some(source) = self.partials.get_partial(name) else {
            tracing::trace!(partial = name, "partial not found, rendering empty");
            return Ok(());
        };
        tracing::trace!(partial = name, depth = self.depth, "rendering partial");
        let template = cache::global_cache().template(&source, &self.compile_options.for_nested(None))?;

        let saved = self.out.push_indent(indent);
        let result = self.nested(name, |renderer| {
            renderer.run(template.program(), template.source())
        });
        self.out.pop_indent(saved);
        result
    }

    /// Render a section lambda's result in place, using the section's delimiters.
    fn expand_lambda(
        &mut self,
        name: &str,
        lambda: &Lambda,
        text: &str,
        delimiters: &Delimiters,
    ) -> TemplateResult<()> {
        let result = lambda.call(text);
        let delimiters = (!delimiters.is_default()).then(|| delimiters.clone());
        let template = cache::global_cache().template(&result, &self.compile_options.for_nested(delimiters))?;
        self.nested(name, |renderer| {
            renderer.run(template.program(), template.source())
        })
    }

    /// Render a variable lambda's result to a string with default delimiters.
    fn expand_to_string(&mut self, name: &str, result: &str) -> TemplateResult<String> {
        let template = cache::global_cache().template(result, &self.compile_options.for_nested(None))?;
        let outer = std::mem::take(&mut self.out);
        let rendered = self.nested(name, |renderer| {
            renderer.run(template.program(), template.source())
        });
        let inner = std::mem::replace(&mut self.out, outer);
        rendered.map(|()| inner.into_string())
    }

    /// Run `f` one partial level deeper, failing past the depth ceiling.
    fn nested(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Self) -> TemplateResult<()>,
    ) -> TemplateResult<()> {
        if self.depth >= self.options.max_partial_depth {
            return Err(TemplateError::RecursionLimit {
                name: name.to_string(),
                max_depth: self.options.max_partial_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}
