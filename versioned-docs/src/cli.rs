///
/// This module implements the CLI interface for versioned-docs: command parsing,
/// argument validation, and the async entrypoint shared by `main` and the tests.
///
/// All domain logic (tag resolution, fetching, transformation, page assembly)
/// lives in the [`versioned-docs-core`] crate. This module only wires the
/// configured GitHub client and page writer into it.
///
/// ## How To Use
/// - For command-line users: run the `versioned-docs` binary with `--help`.
/// - For programmatic use: call [`run`] with a constructed [`Cli`].
///
/// [`versioned-docs-core`]: ../../versioned-docs-core/
/// [`Cli`]: struct.Cli.html
/// [`run`]: fn.run.html
use crate::load_config::load_config;
use crate::sink::JsonPageWriter;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use versioned_docs_core::github::GithubClient;
use versioned_docs_core::pipeline::build;
use versioned_docs_core::versions::resolve_versions;

/// CLI for versioned-docs: build one page per markdown file per released version.
#[derive(Parser)]
#[clap(
    name = "versioned-docs",
    version,
    about = "Build versioned documentation pages from the tags of a GitHub repository"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every released version's docs and write one page file per document
    Build {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Overrides `output_dir` from the config file
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
    /// Resolve and print the versions that would be built
    Versions {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build { config, output_dir } => {
            let config = load_config(config)?;
            let output_dir = output_dir.unwrap_or(config.output_dir);
            tracing::info!(
                command = "build",
                output_dir = %output_dir.display(),
                "Starting documentation build"
            );

            let client = GithubClient::new(&config.api)?;
            let writer = JsonPageWriter::new(output_dir);
            match build(&config.docs, &client, &client, &writer).await {
                Ok(report) => {
                    tracing::info!(command = "build", ?report, "Build complete");
                    for version in &report.versions {
                        println!("{}\t{}\t{} pages", version.id, version.tag, version.pages);
                    }
                    println!(
                        "Built {} pages across {} versions into {}",
                        report.pages,
                        report.versions.len(),
                        writer.output_dir().display()
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "build", error = %e, "Build failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Versions { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "versions", "Resolving versions");

            let client = GithubClient::new(&config.api)?;
            let versions = resolve_versions(&client, &config.docs.owner, &config.docs.repo)
                .await
                .map_err(|e| {
                    tracing::error!(command = "versions", error = %e, "Version resolution failed");
                    e
                })?;
            for version in &versions {
                println!("{}\t{}\t{}", version.id, version.tag, version.base_path);
            }
            Ok(())
        }
    }
}
