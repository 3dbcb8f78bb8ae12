//! `wildmeth build` command implementation

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{BuildOptions, BuildSummary, Pipeline};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use wildmeth_common::types::TaxonomySource;

/// Run the full pipeline and print what it did
pub async fn run(options: BuildOptions) -> Result<()> {
    let config = Config::from_env()?;
    let summary = Pipeline::new(config).run(&options).await?;

    println!("{}", "Build complete".cyan().bold());
    println!();
    println!("{}", summary_table(&summary));
    println!();

    if summary.taxa_unresolved() > 0 {
        println!(
            "{} {} taxon/taxa unresolved. Run 'wildmeth lookup <taxid>' or add overrides.",
            "!".yellow(),
            summary.taxa_unresolved()
        );
    }
    if summary.citations_missing > 0 {
        println!(
            "{} {} DOI(s) without BibTeX",
            "!".yellow(),
            summary.citations_missing
        );
    }

    println!(
        "{} Site written to {}",
        "✓".green(),
        summary.output_dir.display().to_string().bold()
    );

    Ok(())
}

fn summary_table(summary: &BuildSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS);

    table.add_row(vec!["Records".to_string(), summary.records.to_string()]);
    if summary.warnings > 0 {
        table.add_row(vec!["Warnings".to_string(), summary.warnings.to_string()]);
    }

    let by_source = summary
        .taxa_by_source
        .iter()
        .filter(|(source, _)| **source != TaxonomySource::Unresolved)
        .map(|(source, count)| format!("{} {}", count, source))
        .collect::<Vec<_>>()
        .join(", ");
    let resolved = if by_source.is_empty() {
        summary.taxa_resolved().to_string()
    } else {
        format!("{} ({})", summary.taxa_resolved(), by_source)
    };
    table.add_row(vec!["Taxa resolved".to_string(), resolved]);
    table.add_row(vec!["Taxa unresolved".to_string(), summary.taxa_unresolved().to_string()]);

    let citations = if summary.citations_skipped {
        "skipped".to_string()
    } else {
        format!(
            "{} fetched, {} missing",
            summary.citations_fetched, summary.citations_missing
        )
    };
    table.add_row(vec!["Citations".to_string(), citations]);

    if summary.static_files > 0 {
        table.add_row(vec!["Static files".to_string(), summary.static_files.to_string()]);
    }

    table
}
