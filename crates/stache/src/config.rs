/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Project configuration.
//!
//! Settings are read from `_stache.yml` in the current directory (or the file
//! given with `--config`). Command-line flags override them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use stache_template::{CompileOptions, Delimiters, RenderOptions, SectionTag};

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "_stache.yml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct StacheConfig {
    /// Initial delimiters, e.g. `"<% %>"`.
    pub delimiters: Option<Delimiters>,

    /// Custom section tag pairs.
    pub section_tags: Vec<SectionTag>,

    /// Directory partials are loaded from.
    pub partials: Option<PathBuf>,

    /// Extension of partial files.
    pub extension: Option<String>,

    pub max_partial_depth: Option<usize>,
}

impl StacheConfig {
    /// Load `explicit`, or `_stache.yml` when it exists, or the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let default_path = Path::new(CONFIG_FILE_NAME);
        if default_path.is_file() {
            Self::from_file(default_path)
        } else {
            tracing::debug!("no {} found, using defaults", CONFIG_FILE_NAME);
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config =
            Self::parse(&text).with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Compile options, with `delimiters` (a `--delimiters` value) taking precedence.
    pub fn compile_options(&self, delimiters: Option<&str>) -> Result<CompileOptions> {
        let delimiters = match delimiters {
            Some(text) => Some(
                text.parse::<Delimiters>()
                    .with_context(|| format!("Invalid --delimiters value: {:?}", text))?,
            ),
            None => self.delimiters.clone(),
        };
        Ok(CompileOptions {
            delimiters,
            section_tags: self.section_tags.clone(),
            as_compiled_source: false,
        })
    }

    pub fn render_options(&self, max_partial_depth: Option<usize>) -> RenderOptions {
        let mut options = RenderOptions::default();
        if let Some(depth) = max_partial_depth.or(self.max_partial_depth) {
            options = options.with_max_partial_depth(depth);
        }
        options
    }
}
