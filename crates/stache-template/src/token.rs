/*
 * token.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Token types produced by the scanner.

use crate::options::Delimiters;

/// The kind of a scanned tag, selected by the sigil after the opening delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `{{#name}}`
    Section,
    /// `{{^name}}`
    InvertedSection,
    /// `{{/name}}`
    Close,
    /// `{{! comment}}`
    Comment,
    /// `{{> name}}`
    Partial,
    /// `{{< name}}`
    ParentPartial,
    /// `{{=<% %>=}}`
    SetDelimiters,
    /// `{{name}}`
    Variable,
    /// `{{{name}}}`
    Triple,
    /// `{{& name}}`
    Ampersand,
}

/// Sigil table, in recognition order. Anything else is [`TagKind::Variable`].
pub const SIGILS: &[(char, TagKind)] = &[
    ('#', TagKind::Section),
    ('^', TagKind::InvertedSection),
    ('/', TagKind::Close),
    ('!', TagKind::Comment),
    ('>', TagKind::Partial),
    ('<', TagKind::ParentPartial),
    ('=', TagKind::SetDelimiters),
    ('{', TagKind::Triple),
    ('&', TagKind::Ampersand),
];

impl TagKind {
    /// Classify the character following an opening delimiter.
    pub fn from_sigil(c: char) -> Option<TagKind> {
        SIGILS
            .iter()
            .find(|(sigil, _)| *sigil == c)
            .map(|(_, kind)| *kind)
    }

    /// The sigil character for this kind, if it has one.
    pub fn sigil(self) -> Option<char> {
        SIGILS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(sigil, _)| *sigil)
    }

    /// Tags that may stand alone on a line without producing output.
    pub fn is_structural(self) -> bool {
        match self {
            TagKind::Section
            | TagKind::InvertedSection
            | TagKind::Close
            | TagKind::Comment
            | TagKind::Partial
            | TagKind::ParentPartial
            | TagKind::SetDelimiters => true,
            TagKind::Variable | TagKind::Triple | TagKind::Ampersand => false,
        }
    }

    pub fn is_partial(self) -> bool {
        matches!(self, TagKind::Partial | TagKind::ParentPartial)
    }
}

/// A tag record.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub kind: TagKind,
    /// Trimmed tag body.
    pub name: String,
    /// Delimiters active when the tag was scanned.
    pub delimiters: Delimiters,
    /// Offset of the tag's opening delimiter.
    pub start: usize,
    /// For section openers, the offset just past the tag; for closers, the
    /// offset of the closer's opening delimiter; otherwise the tag start.
    pub offset: usize,
    /// Leading whitespace of a standalone partial tag.
    pub indent: String,
}

/// A scanned token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal text (never contains a line break).
    Text(String),
    /// A line break kept in the output (`"\n"` or `"\r\n"`).
    Newline(&'static str),
    /// A tag.
    Tag(Tag),
}

impl Token {
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Token::Tag(tag) => Some(tag),
            Token::Text(_) | Token::Newline(_) => None,
        }
    }

    /// Whitespace-only text or a structural tag.
    pub(crate) fn is_standalone_candidate(&self) -> bool {
        match self {
            Token::Text(text) => text.chars().all(char::is_whitespace),
            Token::Tag(tag) => tag.kind.is_structural(),
            Token::Newline(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_roundtrip() {
        for (sigil, kind) in SIGILS {
            assert_eq!(TagKind::from_sigil(*sigil), Some(*kind));
            assert_eq!(kind.sigil(), Some(*sigil));
        }
        assert_eq!(TagKind::from_sigil('x'), None);
        assert_eq!(TagKind::Variable.sigil(), None);
    }

    #[test]
    fn test_structural_kinds() {
        assert!(TagKind::Section.is_structural());
        assert!(TagKind::Partial.is_structural());
        assert!(!TagKind::Variable.is_structural());
        assert!(!TagKind::Triple.is_structural());
    }

    #[test]
    fn test_standalone_candidate() {
        assert!(Token::Text("  \t".to_string()).is_standalone_candidate());
        assert!(!Token::Text(" x ".to_string()).is_standalone_candidate());
        assert!(!Token::Newline("\n").is_standalone_candidate());
    }
}
