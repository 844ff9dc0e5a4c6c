/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render command implementation.
//!
//! `stache render` compiles a template file, loads its data (JSON or YAML)
//! and renders it, resolving partials from a directory.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stache_template::resolver::DEFAULT_PARTIAL_EXTENSION;
use stache_template::{FileSystemResolver, Template, TemplateValue};
use tracing::{debug, info};

use crate::config::StacheConfig;
use crate::diagnostics;

/// Arguments for the render command
#[derive(Debug, Default)]
pub struct RenderArgs {
    /// Template file
    pub template: PathBuf,
    /// Data file, or `-` for stdin
    pub data: Option<String>,
    /// Partials directory
    pub partials: Option<PathBuf>,
    /// Partial file extension
    pub extension: Option<String>,
    /// Initial delimiters
    pub delimiters: Option<String>,
    pub max_partial_depth: Option<usize>,
    /// Config file
    pub config: Option<PathBuf>,
    /// Output file, or `-` for stdout
    pub output: Option<String>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let config = StacheConfig::load(args.config.as_deref())?;
    let output = render(&args, &config)?;
    super::write_output(args.output.as_deref(), &output)
}

/// Render the template described by `args` to a string.
pub fn render(args: &RenderArgs, config: &StacheConfig) -> Result<String> {
    let compile_options = config.compile_options(args.delimiters.as_deref())?;
    let render_options = config.render_options(args.max_partial_depth);

    let source = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template: {}", args.template.display()))?;
    let template = Template::compile_with_options(&source, &compile_options).map_err(|err| {
        eprint!(
            "{}",
            diagnostics::render_report(&args.template.display().to_string(), &source, &err, true)
        );
        anyhow::anyhow!("Failed to compile template: {}", args.template.display())
    })?;

    let data = match &args.data {
        Some(path) => load_data(path)?,
        None => TemplateValue::Null,
    };

    let partials_dir = args
        .partials
        .clone()
        .or_else(|| config.partials.clone())
        .unwrap_or_else(|| template_dir(&args.template));
    let extension = args
        .extension
        .clone()
        .or_else(|| config.extension.clone())
        .unwrap_or_else(|| DEFAULT_PARTIAL_EXTENSION.to_string());
    debug!(dir = %partials_dir.display(), %extension, "resolving partials");
    let resolver = FileSystemResolver::new(partials_dir).with_extension(extension);

    let output = template
        .render_with(&data, &resolver, &render_options)
        .with_context(|| format!("Failed to render template: {}", args.template.display()))?;
    info!(template = %args.template.display(), bytes = output.len(), "rendered");
    Ok(output)
}

/// Load a data file as a template value.
///
/// `-` reads JSON from stdin; `.yml`/`.yaml` files are YAML, anything else JSON.
pub fn load_data(path: &str) -> Result<TemplateValue> {
    if path == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read data from stdin")?;
        let value: serde_json::Value =
            serde_json::from_str(&text).context("Invalid JSON data on stdin")?;
        return Ok(value.into());
    }

    let path = Path::new(path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yml" | "yaml"));

    let value: serde_json::Value = if is_yaml {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid YAML data file: {}", path.display()))?
    } else {
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON data file: {}", path.display()))?
    };
    Ok(value.into())
}

fn template_dir(template: &Path) -> PathBuf {
    match template.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn args(template: PathBuf) -> RenderArgs {
        RenderArgs {
            template,
            ..RenderArgs::default()
        }
    }

    #[test]
    fn test_render_with_json_data_and_partials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("page.mustache"), "{{#people}}\n  {{> person}}\n{{/people}}\n").unwrap();
        fs::write(dir.path().join("person.mustache"), "- {{name}}\n").unwrap();
        fs::write(
            dir.path().join("data.json"),
            r#"{ "people": [{ "name": "Ada" }, { "name": "Alan" }] }"#,
        )
        .unwrap();

        let mut args = args(dir.path().join("page.mustache"));
        args.data = Some(dir.path().join("data.json").display().to_string());

        let output = render(&args, &StacheConfig::default()).unwrap();
        assert_eq!(output, "  - Ada\n  - Alan\n");
    }

    #[test]
    fn test_render_with_yaml_data_and_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("parts")).unwrap();
        fs::write(dir.path().join("page.html"), "<%title%><%> footer%>").unwrap();
        fs::write(dir.path().join("parts/footer.tpl"), "|{{title}}").unwrap();
        fs::write(dir.path().join("data.yaml"), "title: Hello\n").unwrap();

        let config = StacheConfig::parse(&format!(
            "delimiters: \"<% %>\"\npartials: {}\nextension: tpl\n",
            dir.path().join("parts").display()
        ))
        .unwrap();
        let mut args = args(dir.path().join("page.html"));
        args.data = Some(dir.path().join("data.yaml").display().to_string());

        let output = render(&args, &config).unwrap();
        assert_eq!(output, "Hello|Hello");
    }

    #[test]
    fn test_render_compile_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.mustache"), "{{#open}}").unwrap();
        let err = render(&args(dir.path().join("bad.mustache")), &StacheConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to compile template"));
    }

    #[test]
    fn test_render_missing_template() {
        let err = render(&args(PathBuf::from("/nonexistent/page.mustache")), &StacheConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read template"));
    }

    #[test]
    fn test_template_dir() {
        assert_eq!(template_dir(Path::new("page.mustache")), PathBuf::from("."));
        assert_eq!(template_dir(Path::new("site/page.mustache")), PathBuf::from("site"));
    }
}
