/*
 * options.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Compilation and rendering options.
//!
//! [`CompileOptions`] carries everything that shapes the generated program
//! and therefore takes part in the cache key. [`RenderOptions`] only affects
//! how a compiled program is executed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};

/// An opening/closing delimiter pair, e.g. `{{` and `}}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Delimiters {
    open: String,
    close: String,
}

impl Delimiters {
    /// Create a delimiter pair. Both sides must be non-empty and free of whitespace.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> TemplateResult<Self> {
        let open = open.into();
        let close = close.into();
        if !is_valid_delimiter(&open) || !is_valid_delimiter(&close) {
            return Err(TemplateError::DelimiterSyntax {
                body: format!("{} {}", open, close),
                offset: 0,
            });
        }
        Ok(Self { open, close })
    }

    /// Parse a whitespace-separated pair such as `"<% %>"`.
    ///
    /// `offset` is reported in the error if the body is malformed.
    pub fn parse(body: &str, offset: usize) -> TemplateResult<Self> {
        let mut parts = body.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(open), Some(close), None) if !open.contains('=') && !close.contains('=') => {
                Ok(Self {
                    open: open.to_string(),
                    close: close.to_string(),
                })
            }
            _ => Err(TemplateError::DelimiterSyntax {
                body: body.to_string(),
                offset,
            }),
        }
    }

    pub fn open(&self) -> &str {
        &self.open
    }

    pub fn close(&self) -> &str {
        &self.close
    }

    /// Whether this is the standard `{{ }}` pair.
    pub fn is_default(&self) -> bool {
        self.open == "{{" && self.close == "}}"
    }
}

fn is_valid_delimiter(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "{{".to_string(),
            close: "}}".to_string(),
        }
    }
}

impl fmt::Display for Delimiters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.open, self.close)
    }
}

impl FromStr for Delimiters {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, 0)
    }
}

impl TryFrom<String> for Delimiters {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Delimiters> for String {
    fn from(value: Delimiters) -> Self {
        value.to_string()
    }
}

/// A custom section alias: `{{_foo}}...{{/foo}}` with `open = "_foo"`, `close = "foo"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionTag {
    pub open: String,
    pub close: String,
}

impl SectionTag {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// Options that influence the shape of the compiled program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompileOptions {
    /// Delimiters active at the start of the template (default `{{ }}`).
    pub delimiters: Option<Delimiters>,

    /// Custom tag names treated as section boundaries.
    pub section_tags: Vec<SectionTag>,

    /// Produce the textual procedure definition instead of an executable template.
    pub as_compiled_source: bool,
}

impl CompileOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = Some(delimiters);
        self
    }

    pub fn with_section_tag(mut self, tag: SectionTag) -> Self {
        self.section_tags.push(tag);
        self
    }

    pub fn with_compiled_source(mut self, as_compiled_source: bool) -> Self {
        self.as_compiled_source = as_compiled_source;
        self
    }

    /// Options used to compile a partial or lambda result on behalf of a template
    /// compiled with `self`: default delimiters, same section tags, always executable.
    pub(crate) fn for_nested(&self, delimiters: Option<Delimiters>) -> Self {
        Self {
            delimiters,
            section_tags: self.section_tags.clone(),
            as_compiled_source: false,
        }
    }
}

/// Default ceiling for nested partial and lambda expansion.
pub const DEFAULT_MAX_PARTIAL_DEPTH: usize = 64;

/// Options that only affect rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RenderOptions {
    /// Maximum nesting depth of partials (and lambda expansions).
    pub max_partial_depth: usize,
}

impl RenderOptions {
    pub fn with_max_partial_depth(mut self, depth: usize) -> Self {
        self.max_partial_depth = depth;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_partial_depth: DEFAULT_MAX_PARTIAL_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiters() {
        let delims: Delimiters = "<% %>".parse().unwrap();
        assert_eq!(delims.open(), "<%");
        assert_eq!(delims.close(), "%>");
        assert!(!delims.is_default());
        assert!(Delimiters::default().is_default());
    }

    #[test]
    fn test_parse_delimiters_extra_whitespace() {
        let delims = Delimiters::parse("  |   | ", 3).unwrap();
        assert_eq!(delims.open(), "|");
        assert_eq!(delims.close(), "|");
    }

    #[test]
    fn test_parse_delimiters_rejects_malformed() {
        for body in ["", "<%", "<% %> extra", "a= b"] {
            match Delimiters::parse(body, 7) {
                Err(TemplateError::DelimiterSyntax { offset, .. }) => assert_eq!(offset, 7),
                other => panic!("expected delimiter error for {:?}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_new_rejects_whitespace() {
        assert!(Delimiters::new("< %", "%>").is_err());
        assert!(Delimiters::new("", "%>").is_err());
        assert!(Delimiters::new("[[", "]]").is_ok());
    }

    #[test]
    fn test_compile_options_from_json() {
        let options: CompileOptions = serde_json::from_str(
            r#"{"delimiters": "<% %>", "section-tags": [{"open": "_foo", "close": "foo"}]}"#,
        )
        .unwrap();
        assert_eq!(options.delimiters, Some("<% %>".parse().unwrap()));
        assert_eq!(options.section_tags, vec![SectionTag::new("_foo", "foo")]);
        assert!(!options.as_compiled_source);
    }

    #[test]
    fn test_render_options_default_depth() {
        let options: RenderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.max_partial_depth, DEFAULT_MAX_PARTIAL_DEPTH);
    }
}
