//! `wildmeth lookup` command implementation
//!
//! Resolves a single taxid through the same chain a build uses.

use crate::config::Config;
use crate::error::Result;
use crate::project::{Project, TaxonOverride};
use crate::taxonomy::Enricher;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use std::collections::BTreeMap;
use std::path::Path;
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

/// Resolve `taxid` and print the result
pub async fn run(project_path: &Path, taxid: u32, species: Option<String>, offline: bool) -> Result<()> {
    let config = Config::from_env()?;

    // Project overrides apply when run inside a catalog
    let overrides: BTreeMap<u32, TaxonOverride> = if project_path.exists() {
        Project::load(project_path)?.overrides
    } else {
        BTreeMap::new()
    };

    let enricher = Enricher::from_config(&config, &overrides, offline)?;
    let info = enricher.resolve(taxid, species.as_deref()).await;

    println!();
    println!("{}", render_table(&info));

    if info.source == TaxonomySource::Unresolved {
        println!(
            "{} Taxid {} could not be resolved. Add an entry under 'overrides' in {}.",
            "!".yellow(),
            taxid,
            project_path.display()
        );
    } else if !info.is_complete() {
        println!(
            "{} Missing: {}",
            "!".yellow(),
            info.missing_fields().join(", ")
        );
    }

    Ok(())
}

fn render_table(info: &TaxonomyInfo) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.add_row(vec!["Taxid".to_string(), info.taxid.to_string()]);
    table.add_row(vec!["Species".to_string(), info.species_or_unknown().to_string()]);
    table.add_row(vec!["Common name".to_string(), info.common_name_or_unknown().to_string()]);
    table.add_row(vec!["Order".to_string(), info.order_or_unknown().to_string()]);
    table.add_row(vec!["Class".to_string(), info.class_or_unknown().to_string()]);
    table.add_row(vec!["Source".to_string(), info.source.to_string()]);

    if !info.lineage.is_empty() {
        table.add_row(vec!["Lineage".to_string(), info.lineage.join(" > ")]);
    }

    table
}
