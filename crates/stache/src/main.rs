/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! stache CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod diagnostics;

#[derive(Parser)]
#[command(name = "stache")]
#[command(version)]
#[command(about = "Mustache template compiler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template with a data file
    Render {
        /// Template file
        template: PathBuf,

        /// Data file (JSON, or YAML with a .yml/.yaml extension; '-' reads JSON from stdin)
        #[arg(short, long)]
        data: Option<String>,

        /// Directory partials are loaded from (defaults to the template's directory)
        #[arg(short, long)]
        partials: Option<PathBuf>,

        /// File extension of partials (defaults to "mustache")
        #[arg(long)]
        extension: Option<String>,

        /// Initial delimiters, e.g. "<% %>"
        #[arg(long)]
        delimiters: Option<String>,

        /// Maximum nesting depth of partials
        #[arg(long)]
        max_partial_depth: Option<usize>,

        /// Config file (defaults to _stache.yml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the compiled procedure of a template
    Compile {
        /// Template file
        template: PathBuf,

        /// Initial delimiters, e.g. "<% %>"
        #[arg(long)]
        delimiters: Option<String>,

        /// Config file (defaults to _stache.yml in the current directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write output to FILE (use '--output -' for stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            partials,
            extension,
            delimiters,
            max_partial_depth,
            config,
            output,
        } => commands::render::execute(commands::render::RenderArgs {
            template,
            data,
            partials,
            extension,
            delimiters,
            max_partial_depth,
            config,
            output,
        }),
        Commands::Compile {
            template,
            delimiters,
            config,
            output,
        } => commands::compile::execute(commands::compile::CompileArgs {
            template,
            delimiters,
            config,
            output,
        }),
    }
}
