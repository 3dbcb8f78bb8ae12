//! `wildmeth enrich` command implementation
//!
//! Writes the enriched dataset as JSON without rendering the site or
//! fetching citations.

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{LoadedInput, Pipeline};
use colored::Colorize;
use std::path::{Path, PathBuf};
use wildmeth_common::types::{Catalog, TaxonomySource};

/// Enrich every study and write the catalog JSON to `output` (`-` for stdout)
pub async fn run(project_path: &Path, offline: bool, output: Option<PathBuf>) -> Result<()> {
    let pipeline = Pipeline::new(Config::from_env()?);
    let LoadedInput { project, studies, .. } = pipeline.load(project_path)?;

    let to_stdout = output.as_deref() == Some(Path::new("-"));
    let enriched = pipeline
        .enrich(&project, studies, offline, !to_stdout)
        .await?;
    let catalog = Catalog::new(enriched);
    let json = serde_json::to_string_pretty(&catalog)?;

    if to_stdout {
        println!("{}", json);
        return Ok(());
    }

    let path = output.unwrap_or_else(|| project.output_path().join("data").join("studies.json"));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, json)?;

    let unresolved = catalog
        .studies
        .iter()
        .filter(|s| s.taxonomy.source == TaxonomySource::Unresolved)
        .count();

    println!(
        "{} Enriched {} record(s) -> {}",
        "✓".green(),
        catalog.studies.len(),
        path.display()
    );
    if unresolved > 0 {
        println!(
            "  {} {} record(s) with unresolved taxonomy",
            "!".yellow(),
            unresolved
        );
    }

    Ok(())
}
