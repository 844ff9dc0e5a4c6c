/*
 * compile.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Compile command implementation
 */

//! `stache compile` prints the procedure a template compiles to.

use std::path::PathBuf;

use anyhow::{Context, Result};
use stache_template::Compiled;

use crate::config::StacheConfig;
use crate::diagnostics;

/// Arguments for the compile command
#[derive(Debug, Default)]
pub struct CompileArgs {
    pub template: PathBuf,
    pub delimiters: Option<String>,
    pub config: Option<PathBuf>,
    pub output: Option<String>,
}

/// Execute the compile command
pub fn execute(args: CompileArgs) -> Result<()> {
    let config = StacheConfig::load(args.config.as_deref())?;
    let source = compiled_source(&args, &config)?;
    super::write_output(args.output.as_deref(), &source)
}

pub fn compiled_source(args: &CompileArgs, config: &StacheConfig) -> Result<String> {
    let options = config
        .compile_options(args.delimiters.as_deref())?
        .with_compiled_source(true);
    let source = std::fs::read_to_string(&args.template)
        .with_context(|| format!("Failed to read template: {}", args.template.display()))?;

    let compiled = stache_template::compile(&source, &options).map_err(|err| {
        eprint!(
            "{}",
            diagnostics::render_report(&args.template.display().to_string(), &source, &err, true)
        );
        anyhow::anyhow!("Failed to compile template: {}", args.template.display())
    })?;

    Ok(match compiled {
        Compiled::Source(text) => text.to_string(),
        Compiled::Template(template) => template.to_compiled_source(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_compiled_source_of_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeting.mustache");
        std::fs::write(&path, "<%#who%>hi <%.%><%/who%>").unwrap();

        let args = CompileArgs {
            template: path,
            delimiters: Some("<% %>".to_string()),
            ..CompileArgs::default()
        };
        let source = compiled_source(&args, &StacheConfig::default()).unwrap();
        assert_eq!(
            source,
            "|ctx, partials, out| {\n    ctx.section(ctx.lookup(\"who\"), 8..16, \"<% %>\", |ctx| {\n        out.text(\"hi \");\n        out.escaped(ctx.top());\n    });\n}\n"
        );
    }
}
