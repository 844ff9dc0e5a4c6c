/*
 * scanner.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template tokenizer.
//!
//! Converts template text into a flat, source-ordered list of [`Token`]s.
//! The scanner tracks the active delimiters (which `{{=<% %>=}}` tags change
//! from that point on) and applies the Mustache standalone-line rules: a line
//! holding only whitespace and structural tags produces no output of its own.

use crate::error::{TemplateError, TemplateResult};
use crate::options::Delimiters;
use crate::token::{Tag, TagKind, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InText,
    InTagType,
    InTag,
}

/// Tokenize `text`, starting with `delimiters` (or `{{ }}` when `None`).
pub fn scan(text: &str, delimiters: Option<&Delimiters>) -> TemplateResult<Vec<Token>> {
    let mut scanner = Scanner::new(text, delimiters.cloned().unwrap_or_default());
    scanner.run()?;
    Ok(scanner.tokens)
}

struct Scanner<'a> {
    text: &'a str,
    delimiters: Delimiters,
    tokens: Vec<Token>,
    buf: String,
    /// Index into `tokens` of the first token on the current line.
    line_start: usize,
    seen_tag: bool,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, delimiters: Delimiters) -> Self {
        Self {
            text,
            delimiters,
            tokens: Vec::new(),
            buf: String::new(),
            line_start: 0,
            seen_tag: false,
        }
    }

    fn run(&mut self) -> TemplateResult<()> {
        let text = self.text;
        let mut state = State::InText;
        let mut kind = TagKind::Variable;
        let mut tag_start = 0;
        let mut body_start = 0;
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            match state {
                State::InText => {
                    if rest.starts_with(self.delimiters.open()) {
                        self.flush_text();
                        tag_start = i;
                        i += self.delimiters.open().len();
                        state = State::InTagType;
                    } else if rest.starts_with('\n') {
                        self.filter_line(Some("\n"));
                        i += 1;
                    } else if rest.starts_with("\r\n") {
                        self.filter_line(Some("\r\n"));
                        i += 2;
                    } else {
                        let c = next_char(rest);
                        self.buf.push(c);
                        i += c.len_utf8();
                    }
                }
                State::InTagType => {
                    let c = next_char(rest);
                    kind = TagKind::from_sigil(c).unwrap_or(TagKind::Variable);
                    self.seen_tag = true;
                    if kind == TagKind::SetDelimiters {
                        i = self.change_delimiters(tag_start, i + c.len_utf8())?;
                        state = State::InText;
                    } else {
                        if kind != TagKind::Variable {
                            i += c.len_utf8();
                        }
                        body_start = i;
                        state = State::InTag;
                    }
                }
                State::InTag => {
                    if rest.starts_with(self.delimiters.close()) {
                        let close_start = i;
                        i += self.delimiters.close().len();
                        let mut name = text[body_start..close_start].trim();
                        if kind == TagKind::Triple {
                            if self.delimiters.close() == "}}" {
                                if text[i..].starts_with('}') {
                                    i += 1;
                                }
                            } else {
                                name = name.strip_suffix('}').unwrap_or(name).trim_end();
                                kind = TagKind::Ampersand;
                            }
                        }
                        let offset = if kind == TagKind::Close { tag_start } else { i };
                        self.tokens.push(Token::Tag(Tag {
                            kind,
                            name: name.to_string(),
                            delimiters: self.delimiters.clone(),
                            start: tag_start,
                            offset,
                            indent: String::new(),
                        }));
                        state = State::InText;
                    } else {
                        i += next_char(rest).len_utf8();
                    }
                }
            }
        }

        if state != State::InText {
            // An unterminated tag is kept as literal text.
            self.buf.push_str(&text[tag_start..]);
        }

        self.filter_line(None);
        tracing::trace!(tokens = self.tokens.len(), "scanned template");
        Ok(())
    }

    /// Handle `{{=<% %>=}}`; `body_start` points just past the `=` sigil.
    /// Returns the index just past the tag.
    fn change_delimiters(&mut self, tag_start: usize, body_start: usize) -> TemplateResult<usize> {
        let terminator = format!("={}", self.delimiters.close());
        let Some(rel) = self.text[body_start..].find(&terminator) else {
            return Err(TemplateError::DelimiterSyntax {
                body: self.text[body_start..].to_string(),
                offset: tag_start,
            });
        };
        let body = self.text[body_start..body_start + rel].trim();
        let new_delimiters = Delimiters::parse(body, tag_start)?;
        self.tokens.push(Token::Tag(Tag {
            kind: TagKind::SetDelimiters,
            name: body.to_string(),
            delimiters: self.delimiters.clone(),
            start: tag_start,
            offset: tag_start,
            indent: String::new(),
        }));
        self.delimiters = new_delimiters;
        Ok(body_start + rel + terminator.len())
    }

    fn flush_text(&mut self) {
        if !self.buf.is_empty() {
            self.tokens.push(Token::Text(std::mem::take(&mut self.buf)));
        }
    }

    /// Close the current line, dropping it if it is a standalone tag line.
    fn filter_line(&mut self, newline: Option<&'static str>) {
        self.flush_text();

        let standalone = self.seen_tag
            && self.tokens[self.line_start..]
                .iter()
                .all(Token::is_standalone_candidate);

        if standalone {
            let line: Vec<Token> = self.tokens.drain(self.line_start..).collect();
            let mut leading_ws: Option<String> = None;
            for token in line {
                match token {
                    Token::Text(ws) => leading_ws = Some(ws),
                    Token::Tag(mut tag) => {
                        if let Some(ws) = leading_ws.take() {
                            if tag.kind.is_partial() {
                                tag.indent = ws;
                            }
                        }
                        self.tokens.push(Token::Tag(tag));
                    }
                    Token::Newline(_) => {}
                }
            }
        } else if let Some(newline) = newline {
            self.tokens.push(Token::Newline(newline));
        }

        self.seen_tag = false;
        self.line_start = self.tokens.len();
    }
}

fn next_char(s: &str) -> char {
    s.chars().next().unwrap_or('\0')
}
