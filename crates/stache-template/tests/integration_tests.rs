/*
 * integration_tests.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Integration tests for stache-template using test fixtures.
 */

use pretty_assertions::assert_eq;
use serde_json::json;
use stache_template::{
    CompileOptions, FileSystemResolver, Template, TemplateError, TemplateValue,
};
use std::path::Path;
use std::sync::Arc;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> std::path::PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir).join("test-fixtures").join(name)
}

/// Helper to load a template from fixtures
fn load_template(name: &str) -> Arc<Template> {
    let path = fixture_path(name);
    Template::compile_from_file(&path, &CompileOptions::default())
        .unwrap_or_else(|_| panic!("Failed to load template: {}", name))
}

fn partials() -> FileSystemResolver {
    FileSystemResolver::new(fixture_path("partials"))
}

#[test]
fn test_page_with_items() {
    let template = load_template("page.mustache");
    let data = TemplateValue::from(json!({
        "title": "Fruit & Veg",
        "items": [
            { "name": "Apple", "price": 1.5 },
            { "name": "Pear" }
        ]
    }));

    let result = template.render_with_partials(&data, &partials()).unwrap();
    assert_eq!(
        result,
        "<h1>Fruit &amp; Veg</h1>\n<ul>\n  <li>Apple (1.5)</li>\n  <li>Pear</li>\n</ul>\n"
    );
}

#[test]
fn test_page_without_items() {
    let template = load_template("page.mustache");
    let data = TemplateValue::from(json!({ "title": "Empty", "items": [] }));

    let result = template.render_with_partials(&data, &partials()).unwrap();
    assert_eq!(result, "<h1>Empty</h1>\n<ul>\n</ul>\n<p>No items.</p>\n");
}

#[test]
fn test_partials_use_default_delimiters() {
    let template = load_template("custom-delimiters.mustache");
    let data = TemplateValue::from(json!({
        "sections": [
            { "title": "A", "text": "a" },
            { "title": "B", "text": "b" }
        ]
    }));

    let result = template.render_with_partials(&data, &partials()).unwrap();
    assert_eq!(result, "[A]\n  a\n[B]\n  b\n");
}

#[test]
fn test_unclosed_fixture_reports_section() {
    let path = fixture_path("unclosed.mustache");
    match Template::compile_from_file(&path, &CompileOptions::default()) {
        Err(TemplateError::UnclosedTag { name, offset }) => {
            assert_eq!(name, "broken");
            assert_eq!(offset, 0);
        }
        other => panic!("expected unclosed tag error, got {:?}", other),
    }
}

#[test]
fn test_missing_partial_file_renders_empty() {
    let template = Template::compile("[{{> no-such-partial}}]").unwrap();
    let result = template
        .render_with_partials(&TemplateValue::Null, &partials())
        .unwrap();
    assert_eq!(result, "[]");
}
