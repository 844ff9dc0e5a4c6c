/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Source-annotated reports for template compile errors.

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use stache_template::TemplateError;

/// Render `error` against the template `source` as an ariadne report.
///
/// Errors without a source position (I/O, recursion) are rendered as a plain
/// message.
pub fn render_report(path: &str, source: &str, error: &TemplateError, color: bool) -> String {
    let Some(offset) = error.offset().filter(|offset| *offset <= source.len()) else {
        return format!("Error: {}\n", error);
    };
    let end = source
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(offset, |c| offset + c.len_utf8());

    let label_message = match error {
        TemplateError::Nesting { expected, .. } => format!("expected {{{{/{}}}}} here", expected),
        TemplateError::UnclosedTag { name, .. } => format!("section '{}' opened here", name),
        TemplateError::UnmatchedClose { .. } => "no section is open".to_string(),
        TemplateError::DelimiterSyntax { .. } => "delimiter change starts here".to_string(),
        TemplateError::NestingLimit { max_depth, .. } => {
            format!("section nested more than {} levels deep", max_depth)
        }
        TemplateError::RecursionLimit { .. } | TemplateError::Io(_) => error.to_string(),
    };

    let path = path.to_string();
    let report = Report::build(ReportKind::Error, path.clone(), offset)
        .with_config(Config::default().with_color(color))
        .with_message(error.to_string())
        .with_label(
            Label::new((path.clone(), offset..end))
                .with_message(label_message)
                .with_color(Color::Red),
        )
        .finish();

    let mut output = Vec::new();
    if report.write((path, Source::from(source)), &mut output).is_err() {
        return format!("Error: {}\n", error);
    }
    String::from_utf8_lossy(&output).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stache_template::Template;

    #[test]
    fn test_report_points_at_unclosed_section() {
        let source = "line one\n{{#items}}\n- {{name}}\n";
        let error = Template::compile(source).unwrap_err();
        let report = render_report("page.mustache", source, &error, false);
        assert!(report.contains("page.mustache"), "{}", report);
        assert!(report.contains("section 'items' opened here"), "{}", report);
        assert!(report.contains("{{#items}}"), "{}", report);
    }

    #[test]
    fn test_report_for_nesting_error() {
        let source = "{{#a}}{{#b}}{{/a}}";
        let error = Template::compile(source).unwrap_err();
        let report = render_report("t.mustache", source, &error, false);
        assert!(report.contains("expected {{/b}} here"), "{}", report);
    }

    #[test]
    fn test_report_for_nesting_limit() {
        let source = format!("{}{}", "{{#a}}".repeat(200), "{{/a}}".repeat(200));
        let error = Template::compile(&source).unwrap_err();
        let report = render_report("deep.mustache", &source, &error, false);
        assert!(report.contains("nested more than 128 levels deep"), "{}", report);
    }

    #[test]
    fn test_report_without_position() {
        let error = TemplateError::RecursionLimit {
            name: "loop".to_string(),
            max_depth: 4,
        };
        let report = render_report("t.mustache", "", &error, false);
        assert_eq!(report, format!("Error: {}\n", error));
    }
}
