//! `wildmeth citations` command implementation

use crate::citations::write_bibliography;
use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{LoadedInput, Pipeline};
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Fetch BibTeX for every DOI in the catalog and write one `.bib` file
pub async fn run(project_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let pipeline = Pipeline::new(Config::from_env()?);
    let LoadedInput { project, studies, .. } = pipeline.load(project_path)?;

    let citations = pipeline
        .citations(studies.iter().map(|s| s.doi.as_str()), false, true)
        .await?;

    let path = output.unwrap_or_else(|| project.output_path().join("data").join("references.bib"));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let written = write_bibliography(&path, citations.values())?;

    let missing: BTreeSet<&str> = studies
        .iter()
        .filter(|s| !citations.contains_key(&s.doi.to_lowercase()))
        .map(|s| s.doi.as_str())
        .collect();

    println!("{} Wrote {} entries -> {}", "✓".green(), written, path.display());
    if !missing.is_empty() {
        println!("  {} No BibTeX found for:", "!".yellow());
        for doi in missing {
            println!("    {}", doi);
        }
    }

    Ok(())
}
