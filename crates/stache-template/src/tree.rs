/*
 * tree.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Instruction tree types and the tree builder.
//!
//! The builder consumes scanner tokens front to back and nests everything
//! between a section opener and its matching closer into a [`Section`] node.
//! Unbalanced templates are rejected here; nothing downstream has to check.

use std::collections::VecDeque;

use crate::error::{TemplateError, TemplateResult};
use crate::options::{Delimiters, SectionTag};
use crate::token::{Tag, TagKind, Token};

/// Maximum depth of nested sections in one template.
pub const MAX_SECTION_DEPTH: usize = 128;

/// A node in the instruction tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text.
    Text(String),

    /// A line break kept in the output.
    Newline(&'static str),

    /// Variable interpolation: `{{name}}` (escaped) or `{{{name}}}` / `{{&name}}` (raw).
    Variable(Variable),

    /// Section or inverted section with its body.
    Section(Section),

    /// Partial inclusion: `{{>name}}` or `{{<name}}`.
    Partial(Partial),

    /// Comment (not rendered).
    Comment(String),
}

/// Variable interpolation node.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub escaped: bool,
    /// Offset of the tag in the source.
    pub start: usize,
}

/// Section node: `{{#name}}...{{/name}}` or `{{^name}}...{{/name}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub name: String,
    pub inverted: bool,
    /// Offset of the opening tag in the source.
    pub tag_start: usize,
    /// Offset of the first byte of the body.
    pub start: usize,
    /// Offset one past the last byte of the body (the closer's position).
    pub end: usize,
    /// Delimiters active at the opening tag.
    pub delimiters: Delimiters,
    pub children: Vec<Node>,
}

impl Section {
    /// The literal body text of this section.
    pub fn body<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

/// Partial node.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    pub name: String,
    /// `{{<name}}` rather than `{{>name}}`.
    pub parent: bool,
    /// Indentation applied to every line of the partial's output.
    pub indent: String,
    pub start: usize,
}

/// Build the instruction tree from scanner output.
///
/// `section_tags` lists custom `{open, close}` name pairs that are treated
/// as section boundaries.
pub fn build(tokens: Vec<Token>, section_tags: &[SectionTag]) -> TemplateResult<Vec<Node>> {
    let mut queue: VecDeque<Token> = tokens.into();
    let mut stack: Vec<Tag> = Vec::new();
    let (nodes, _) = build_level(&mut queue, &mut stack, section_tags)?;
    Ok(nodes)
}

/// Build one nesting level. Returns the level's nodes and, when the level was
/// terminated by a closing tag, the offset of that tag.
fn build_level(
    queue: &mut VecDeque<Token>,
    stack: &mut Vec<Tag>,
    section_tags: &[SectionTag],
) -> TemplateResult<(Vec<Node>, Option<usize>)> {
    let mut nodes = Vec::new();

    while let Some(token) = queue.pop_front() {
        let tag = match token {
            Token::Text(text) => {
                nodes.push(Node::Text(text));
                continue;
            }
            Token::Newline(newline) => {
                nodes.push(Node::Newline(newline));
                continue;
            }
            Token::Tag(tag) => tag,
        };

        match tag.kind {
            TagKind::Section | TagKind::InvertedSection => {
                nodes.push(open_section(tag, queue, stack, section_tags)?);
            }
            TagKind::Variable if is_opener(&tag.name, section_tags) => {
                nodes.push(open_section(tag, queue, stack, section_tags)?);
            }
            TagKind::Close => {
                let Some(opener) = stack.pop() else {
                    return Err(TemplateError::UnmatchedClose {
                        name: tag.name,
                        offset: tag.start,
                    });
                };
                if tag.name != opener.name && !is_closer(&tag.name, &opener.name, section_tags) {
                    return Err(TemplateError::Nesting {
                        expected: opener.name,
                        found: tag.name,
                        offset: tag.start,
                    });
                }
                return Ok((nodes, Some(tag.offset)));
            }
            TagKind::Variable | TagKind::Triple | TagKind::Ampersand => {
                nodes.push(Node::Variable(Variable {
                    name: tag.name,
                    escaped: tag.kind == TagKind::Variable,
                    start: tag.start,
                }));
            }
            TagKind::Partial | TagKind::ParentPartial => {
                nodes.push(Node::Partial(Partial {
                    name: tag.name,
                    parent: tag.kind == TagKind::ParentPartial,
                    indent: tag.indent,
                    start: tag.start,
                }));
            }
            TagKind::Comment => nodes.push(Node::Comment(tag.name)),
            TagKind::SetDelimiters => {}
        }
    }

    if let Some(outermost) = stack.first() {
        return Err(TemplateError::UnclosedTag {
            name: outermost.name.clone(),
            offset: outermost.start,
        });
    }

    Ok((nodes, None))
}

fn open_section(
    tag: Tag,
    queue: &mut VecDeque<Token>,
    stack: &mut Vec<Tag>,
    section_tags: &[SectionTag],
) -> TemplateResult<Node> {
    if stack.len() >= MAX_SECTION_DEPTH {
        return Err(TemplateError::NestingLimit {
            name: tag.name,
            offset: tag.start,
            max_depth: MAX_SECTION_DEPTH,
        });
    }
    stack.push(tag.clone());
    let (children, end) = build_level(queue, stack, section_tags)?;
    let end = end.ok_or_else(|| TemplateError::UnclosedTag {
        name: tag.name.clone(),
        offset: tag.start,
    })?;

    Ok(Node::Section(Section {
        name: tag.name,
        inverted: tag.kind == TagKind::InvertedSection,
        tag_start: tag.start,
        start: tag.offset,
        end,
        delimiters: tag.delimiters,
        children,
    }))
}

fn is_opener(name: &str, section_tags: &[SectionTag]) -> bool {
    section_tags.iter().any(|t| t.open == name)
}

fn is_closer(close: &str, open: &str, section_tags: &[SectionTag]) -> bool {
    section_tags.iter().any(|t| t.close == close && t.open == open)
}
