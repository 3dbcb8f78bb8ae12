//! wildmeth CLI - Main entry point

use clap::Parser;
use std::process;
use tracing::error;
use wildmeth_cli::pipeline::BuildOptions;
use wildmeth_cli::{CacheCommand, Cli, Commands, ConfigCommand};
use wildmeth_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Warnings only by default; --verbose shows debug
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("wildmeth")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().with_env_overrides().unwrap_or(log_config);

    // The CLI works without logging, so a failed init is not fatal
    let _guard = init_logging(&log_config).ok().flatten();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> wildmeth_cli::Result<()> {
    let project = cli.project.as_path();

    match &cli.command {
        Commands::Init { force } => wildmeth_cli::commands::init::run(project, *force).await,

        Commands::Validate => wildmeth_cli::commands::validate::run(project).await,

        Commands::Lookup {
            taxid,
            species,
            offline,
        } => wildmeth_cli::commands::lookup::run(project, *taxid, species.clone(), *offline).await,

        Commands::Enrich { offline, output } => {
            wildmeth_cli::commands::enrich::run(project, *offline, output.clone()).await
        },

        Commands::Citations { output } => {
            wildmeth_cli::commands::citations::run(project, output.clone()).await
        },

        Commands::Build {
            offline,
            skip_citations,
            output,
        } => {
            wildmeth_cli::commands::build::run(BuildOptions {
                project_path: project.to_path_buf(),
                offline: *offline,
                skip_citations: *skip_citations,
                output: output.clone(),
                show_progress: true,
            })
            .await
        },

        Commands::Cache { command } => match command {
            CacheCommand::Status => wildmeth_cli::commands::cache::status().await,
            CacheCommand::Clean {
                taxonomy,
                citations,
                expired,
            } => wildmeth_cli::commands::cache::clean(*taxonomy, *citations, *expired).await,
        },

        Commands::Config { command } => match command {
            ConfigCommand::Show => wildmeth_cli::commands::config::show().await,
        },
    }
}
