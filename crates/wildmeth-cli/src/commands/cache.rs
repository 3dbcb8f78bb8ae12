//! `wildmeth cache` command implementation
//!
//! Inspects and clears the SQLite metadata cache.

use crate::cache::{CacheKind, MetadataCache, TableStats};
use crate::config::Config;
use crate::error::Result;
use crate::progress::format_bytes;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

fn open(config: &Config) -> Result<MetadataCache> {
    MetadataCache::open(config.cache_db_path(), config.cache_ttl_days)
}

/// Show entry counts and size
pub async fn status() -> Result<()> {
    let config = Config::from_env()?;
    let stats = open(&config)?.stats()?;

    println!("{}", "Metadata cache".cyan().bold());
    println!("{:<10} {}", "path:", stats.db_path.display());
    println!("{:<10} {}", "size:", format_bytes(stats.db_size));
    println!("{:<10} {} day(s)", "ttl:", config.cache_ttl_days);
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Table", "Entries", "Valid", "Expired"]);
    table.add_row(stats_row("taxonomy", stats.taxonomy));
    table.add_row(stats_row("citations", stats.citations));
    println!("{}", table);

    Ok(())
}

fn stats_row(name: &str, stats: TableStats) -> Vec<String> {
    vec![
        name.to_string(),
        stats.total_entries.to_string(),
        stats.valid_entries().to_string(),
        stats.expired_entries.to_string(),
    ]
}

/// Remove cache entries. With no flags everything is removed.
pub async fn clean(taxonomy: bool, citations: bool, expired: bool) -> Result<()> {
    let config = Config::from_env()?;
    let cache = open(&config)?;

    if expired {
        let removed = cache.purge_expired()?;
        println!("{} Removed {} expired entries", "✓".green(), removed);
        return Ok(());
    }

    let kind = match (taxonomy, citations) {
        (true, false) => CacheKind::Taxonomy,
        (false, true) => CacheKind::Citations,
        _ => CacheKind::All,
    };
    let removed = cache.clear(kind)?;

    let what = match kind {
        CacheKind::Taxonomy => "taxonomy",
        CacheKind::Citations => "citation",
        CacheKind::All => "cache",
    };
    println!("{} Removed {} {} entries", "✓".green(), removed, what);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;
    use wildmeth_common::types::CitationFormat;

    #[tokio::test]
    #[serial]
    async fn test_clean_citations_only() {
        let temp = TempDir::new().unwrap();
        std::env::set_var("WILDMETH_CACHE_DIR", temp.path());

        let config = Config::from_env().unwrap();
        let cache = open(&config).unwrap();
        cache
            .put_citation("10.1/x", "@article{x, title={X}}", CitationFormat::Bibtex)
            .unwrap();
        cache
            .put_taxonomy(&wildmeth_common::types::TaxonomyInfo::unresolved(9612))
            .unwrap();

        clean(false, true, false).await.unwrap();
        status().await.unwrap();
        let stats = cache.stats().unwrap();

        std::env::remove_var("WILDMETH_CACHE_DIR");
        assert_eq!(stats.citations.total_entries, 0);
        assert_eq!(stats.taxonomy.total_entries, 1);
    }

    #[test]
    fn test_stats_row() {
        let row = stats_row(
            "taxonomy",
            TableStats {
                total_entries: 5,
                expired_entries: 2,
            },
        );
        assert_eq!(row, vec!["taxonomy", "5", "3", "2"]);
    }
}
