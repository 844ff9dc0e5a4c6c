/*
 * codegen.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Lowering of the instruction tree into an executable program.
//!
//! A [`Program`] is a flat list of [`Op`]s, one per output-producing node;
//! section bodies are nested programs. Everything that can be decided from
//! the template alone is decided here (in particular the lookup strategy for
//! each name), so rendering only walks the ops.
//!
//! [`Program::to_source`] serializes a program into a textual procedure
//! definition written in terms of the runtime primitives. It is what
//! `as_compiled_source` compilation returns.

use std::fmt::Write;
use std::sync::Arc;

use crate::options::{CompileOptions, Delimiters};
use crate::template::{Compiled, Template};
use crate::tree::{Node, Partial, Section, Variable};

/// How a name is resolved against the context stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// `.`: the top of the stack.
    Implicit,
    /// A single key, searched innermost-first.
    Flat(String),
    /// A dotted path: head searched on the stack, tail traversed.
    Dotted(Vec<String>),
}

impl Lookup {
    /// Choose the lookup strategy for a tag name.
    pub fn for_name(name: &str) -> Self {
        if name == "." {
            Lookup::Implicit
        } else if name.contains('.') {
            Lookup::Dotted(name.split('.').map(str::to_string).collect())
        } else {
            Lookup::Flat(name.to_string())
        }
    }

    /// The name as written in the template.
    pub fn name(&self) -> String {
        match self {
            Lookup::Implicit => ".".to_string(),
            Lookup::Flat(name) => name.clone(),
            Lookup::Dotted(path) => path.join("."),
        }
    }
}

/// A single program instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Emit literal text.
    Text(String),

    /// Emit a line break; the next line picks up the current indentation.
    Newline(&'static str),

    /// Look up a value and emit it, HTML-escaped or raw.
    Interpolate { lookup: Lookup, escaped: bool },

    /// Run `body` once per item (lists) or once with the value pushed (other
    /// truthy values). `start..end` is the literal body, used by lambdas.
    Section {
        lookup: Lookup,
        body: Program,
        start: usize,
        end: usize,
        delimiters: Delimiters,
    },

    /// Run `body` once when the value is falsy; the stack is not changed.
    Inverted { lookup: Lookup, body: Program },

    /// Render a named partial with the current stack, indenting every line.
    Partial { name: String, indent: String },
}

/// An executable program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    ops: Vec<Op>,
}

impl Program {
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Serialize this program as a procedure definition.
    pub fn to_source(&self) -> String {
        let mut out = String::from("|ctx, partials, out| {\n");
        write_ops(&mut out, &self.ops, 1);
        out.push_str("}\n");
        out
    }
}

/// Lower an instruction tree into a program.
pub fn lower(tree: &[Node]) -> Program {
    let mut ops: Vec<Op> = Vec::with_capacity(tree.len());
    for node in tree {
        match node {
            Node::Text(text) => match ops.last_mut() {
                Some(Op::Text(prev)) => prev.push_str(text),
                _ => ops.push(Op::Text(text.clone())),
            },
            Node::Newline(newline) => ops.push(Op::Newline(newline)),
            Node::Variable(Variable { name, escaped, .. }) => ops.push(Op::Interpolate {
                lookup: Lookup::for_name(name),
                escaped: *escaped,
            }),
            Node::Section(Section {
                name,
                inverted: false,
                start,
                end,
                delimiters,
                children,
                ..
            }) => ops.push(Op::Section {
                lookup: Lookup::for_name(name),
                body: lower(children),
                start: *start,
                end: *end,
                delimiters: delimiters.clone(),
            }),
            Node::Section(Section {
                name,
                inverted: true,
                children,
                ..
            }) => ops.push(Op::Inverted {
                lookup: Lookup::for_name(name),
                body: lower(children),
            }),
            Node::Partial(Partial { name, indent, .. }) => ops.push(Op::Partial {
                name: name.clone(),
                indent: indent.clone(),
            }),
            Node::Comment(_) => {}
        }
    }
    Program { ops }
}

/// Generate the compiled form of `tree`.
///
/// With `options.as_compiled_source` the result is the program's textual
/// definition, otherwise an executable [`Template`].
pub fn generate(tree: &[Node], source: &str, options: &CompileOptions) -> Compiled {
    let program = lower(tree);
    if options.as_compiled_source {
        Compiled::Source(Arc::from(program.to_source()))
    } else {
        Compiled::Template(Arc::new(Template::new(program, source, options.clone())))
    }
}

fn write_lookup(out: &mut String, lookup: &Lookup) {
    match lookup {
        Lookup::Implicit => out.push_str("ctx.top()"),
        Lookup::Flat(name) => {
            let _ = write!(out, "ctx.lookup({:?})", name);
        }
        Lookup::Dotted(path) => {
            let _ = write!(out, "ctx.lookup_dotted(&{:?})", path);
        }
    }
}

fn write_ops(out: &mut String, ops: &[Op], depth: usize) {
    let pad = "    ".repeat(depth);
    for op in ops {
        out.push_str(&pad);
        match op {
            Op::Text(text) => {
                let _ = writeln!(out, "out.text({:?});", text);
            }
            Op::Newline(newline) => {
                let _ = writeln!(out, "out.newline({:?});", newline);
            }
            Op::Interpolate { lookup, escaped } => {
                out.push_str(if *escaped { "out.escaped(" } else { "out.raw(" });
                write_lookup(out, lookup);
                out.push_str(");\n");
            }
            Op::Section {
                lookup,
                body,
                start,
                end,
                delimiters,
            } => {
                out.push_str("ctx.section(");
                write_lookup(out, lookup);
                let _ = writeln!(out, ", {}..{}, {:?}, |ctx| {{", start, end, delimiters.to_string());
                write_ops(out, body.ops(), depth + 1);
                out.push_str(&pad);
                out.push_str("});\n");
            }
            Op::Inverted { lookup, body } => {
                out.push_str("if !ctx.truthy(");
                write_lookup(out, lookup);
                out.push_str(") {\n");
                write_ops(out, body.ops(), depth + 1);
                out.push_str(&pad);
                out.push_str("}\n");
            }
            Op::Partial { name, indent } => {
                let _ = writeln!(out, "out.partial(partials, ctx, {:?}, {:?});", name, indent);
            }
        }
    }
}
