//! wildmeth CLI Library
//!
//! Builds a static catalog of wildlife DNA-methylation studies.
//!
//! # Overview
//!
//! - **Project**: `wildmeth.yml` names the site, the study files and the
//!   output directory (`wildmeth init`)
//! - **Validation**: study records are checked before anything is fetched
//!   (`wildmeth validate`)
//! - **Taxonomy**: taxids are resolved through overrides, the local cache,
//!   NCBI, GBIF and a keyword fallback (`wildmeth lookup`, `wildmeth enrich`)
//! - **Citations**: BibTeX per DOI from doi.org or Crossref
//!   (`wildmeth citations`)
//! - **Site**: one filterable HTML page plus the dataset as JSON and BibTeX
//!   (`wildmeth build`)
//! - **Cache**: SQLite cache of taxonomy and citations (`wildmeth cache`)

pub mod api;
pub mod cache;
pub mod citations;
pub mod commands;
pub mod config;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod project;
pub mod site;
pub mod taxonomy;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use project::Project;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// wildmeth - catalog of wildlife DNA methylation studies
#[derive(Parser, Debug)]
#[command(name = "wildmeth")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project file
    #[arg(
        short,
        long,
        env = "WILDMETH_PROJECT",
        default_value = project::PROJECT_FILE,
        global = true
    )]
    pub project: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a starter wildmeth.yml and an example study file
    Init {
        /// Overwrite an existing project file
        #[arg(short, long)]
        force: bool,
    },

    /// Check the study records and report every problem
    Validate,

    /// Resolve one taxid and show the result
    Lookup {
        /// NCBI Taxonomy identifier
        taxid: u32,

        /// Scientific name to search when the taxid is not found
        #[arg(short, long)]
        species: Option<String>,

        /// Use overrides, cache and keywords only
        #[arg(long)]
        offline: bool,
    },

    /// Write the enriched dataset as JSON
    Enrich {
        /// Use overrides, cache and keywords only
        #[arg(long)]
        offline: bool,

        /// Output file, or '-' for stdout (defaults to <output>/data/studies.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch BibTeX for every DOI and write a .bib file
    Citations {
        /// Output file (defaults to <output>/data/references.bib)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the full pipeline and write the site
    Build {
        /// Use overrides, cache and keywords only
        #[arg(long)]
        offline: bool,

        /// Do not fetch citations
        #[arg(long)]
        skip_citations: bool,

        /// Output directory (defaults to the project's output)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the metadata cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Show cache location, size and entry counts
    Status,

    /// Remove cached entries (all of them unless a flag narrows it)
    Clean {
        /// Only taxonomy entries
        #[arg(long, conflicts_with = "citations")]
        taxonomy: bool,

        /// Only citation entries
        #[arg(long)]
        citations: bool,

        /// Only entries past their TTL
        #[arg(long, conflicts_with_all = ["taxonomy", "citations"])]
        expired: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show all configuration
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_flags() {
        let cli = Cli::try_parse_from([
            "wildmeth",
            "--project",
            "catalog/wildmeth.yml",
            "build",
            "--offline",
            "--skip-citations",
        ])
        .unwrap();

        assert_eq!(cli.project, PathBuf::from("catalog/wildmeth.yml"));
        assert!(matches!(
            cli.command,
            Commands::Build {
                offline: true,
                skip_citations: true,
                output: None
            }
        ));
    }

    #[test]
    fn test_cache_clean_flags_conflict() {
        let result = Cli::try_parse_from(["wildmeth", "cache", "clean", "--expired", "--taxonomy"]);
        assert!(result.is_err());
    }
}
