/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for template compilation and rendering.

use thiserror::Error;

/// Errors that can occur during template operations.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A delimiter-change tag (or delimiter override) is malformed.
    #[error("Invalid delimiter specification '{body}' at offset {offset}")]
    DelimiterSyntax { body: String, offset: usize },

    /// A closing tag does not match the innermost open section.
    #[error("Nesting error: expected closing tag for '{expected}', found '{found}' at offset {offset}")]
    Nesting {
        expected: String,
        found: String,
        offset: usize,
    },

    /// A section was still open at the end of the template.
    #[error("Missing closing tag for '{name}' opened at offset {offset}")]
    UnclosedTag { name: String, offset: usize },

    /// A closing tag was found with no open section.
    #[error("Closing tag without opener: '/{name}' at offset {offset}")]
    UnmatchedClose { name: String, offset: usize },

    /// Sections nested deeper than the builder allows.
    #[error("Section '{name}' at offset {offset} is nested deeper than {max_depth} levels")]
    NestingLimit {
        name: String,
        offset: usize,
        max_depth: usize,
    },

    /// Partial (or lambda) expansion nested deeper than the configured ceiling.
    #[error("Recursive partial inclusion detected (depth > {max_depth}): {name}")]
    RecursionLimit { name: String, max_depth: usize },

    /// I/O error (e.g., reading a template or partial file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TemplateError {
    /// Source offset of the offending tag, for compile-time errors.
    pub fn offset(&self) -> Option<usize> {
        match self {
            TemplateError::DelimiterSyntax { offset, .. }
            | TemplateError::Nesting { offset, .. }
            | TemplateError::UnclosedTag { offset, .. }
            | TemplateError::UnmatchedClose { offset, .. }
            | TemplateError::NestingLimit { offset, .. } => Some(*offset),
            TemplateError::RecursionLimit { .. } | TemplateError::Io(_) => None,
        }
    }

    /// The tag name the error refers to, if any.
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            TemplateError::Nesting { found, .. } => Some(found),
            TemplateError::UnclosedTag { name, .. }
            | TemplateError::UnmatchedClose { name, .. }
            | TemplateError::NestingLimit { name, .. }
            | TemplateError::RecursionLimit { name, .. } => Some(name),
            TemplateError::DelimiterSyntax { .. } | TemplateError::Io(_) => None,
        }
    }
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nesting_message_names_both_tags() {
        let err = TemplateError::Nesting {
            expected: "outer".to_string(),
            found: "inner".to_string(),
            offset: 12,
        };
        let message = err.to_string();
        assert!(message.contains("outer"));
        assert!(message.contains("inner"));
        assert_eq!(err.offset(), Some(12));
        assert_eq!(err.tag_name(), Some("inner"));
    }

    #[test]
    fn test_recursion_limit_has_no_offset() {
        let err = TemplateError::RecursionLimit {
            name: "self".to_string(),
            max_depth: 4,
        };
        assert_eq!(err.offset(), None);
        assert_eq!(err.to_string(), "Recursive partial inclusion detected (depth > 4): self");
    }
}
