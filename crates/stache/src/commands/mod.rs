/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Command implementations for the stache CLI
//!
//! Each command module handles the CLI interface and delegates to
//! stache-template for compilation and rendering.

use std::path::Path;

use anyhow::{Context, Result};

pub mod compile;
pub mod render;

/// Write command output to `output`, or to stdout when it is `None` or `-`.
pub(crate) fn write_output(output: Option<&str>, content: &str) -> Result<()> {
    match output {
        None | Some("-") => {
            print!("{}", content);
            Ok(())
        }
        Some(path) => {
            std::fs::write(Path::new(path), content)
                .with_context(|| format!("Failed to write output file: {}", path))?;
            tracing::info!(path, "wrote output");
            Ok(())
        }
    }
}
