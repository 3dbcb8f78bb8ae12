//! Metadata cache
//!
//! Resolved taxa and fetched BibTeX entries are kept in a SQLite database
//! (`metadata.db` in the cache directory) so rebuilding the site does not
//! hit NCBI, GBIF or doi.org again until the entries expire.

use crate::error::{CliError, Result};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wildmeth_common::types::{CitationFormat, TaxonomyInfo};

/// Which table an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Taxonomy,
    Citations,
    All,
}

impl CacheKind {
    fn tables(self) -> &'static [&'static str] {
        match self {
            CacheKind::Taxonomy => &["taxonomy_cache"],
            CacheKind::Citations => &["citation_cache"],
            CacheKind::All => &["taxonomy_cache", "citation_cache"],
        }
    }
}

/// A BibTeX entry as stored in the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedCitation {
    pub bibtex: String,
    pub format: CitationFormat,
}

/// Entry counts for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub total_entries: usize,
    pub expired_entries: usize,
}

impl TableStats {
    pub fn valid_entries(&self) -> usize {
        self.total_entries.saturating_sub(self.expired_entries)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub db_path: PathBuf,
    pub db_size: u64,
    pub taxonomy: TableStats,
    pub citations: TableStats,
}

/// SQLite-backed cache for taxonomy records and citations
pub struct MetadataCache {
    db_path: PathBuf,
    ttl_days: i64,
}

impl MetadataCache {
    /// Open (and create if needed) the cache at `db_path`
    pub fn open(db_path: impl Into<PathBuf>, ttl_days: i64) -> Result<Self> {
        let cache = Self {
            db_path: db_path.into(),
            ttl_days,
        };
        cache.init()?;
        Ok(cache)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open_connection(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Ok(Connection::open(&self.db_path)?)
    }

    fn init(&self) -> Result<()> {
        let conn = self.open_connection()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS taxonomy_cache (
                taxid INTEGER PRIMARY KEY,
                payload_json TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_taxonomy_cache_expires_at
                ON taxonomy_cache(expires_at);

            CREATE TABLE IF NOT EXISTS citation_cache (
                doi TEXT PRIMARY KEY,
                bibtex TEXT NOT NULL,
                format TEXT NOT NULL,
                fetched_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_citation_cache_expires_at
                ON citation_cache(expires_at);
            "#,
        )?;

        debug!(path = %self.db_path.display(), "Metadata cache schema initialized");
        Ok(())
    }

    /// Fixed-width RFC 3339 so timestamps compare correctly as text
    fn timestamp(at: DateTime<Utc>) -> String {
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn now_and_expiry(&self) -> (String, String) {
        let now = Utc::now();
        (Self::timestamp(now), Self::timestamp(now + Duration::days(self.ttl_days)))
    }

    fn is_expired(expires_at: &str) -> Result<bool> {
        let expires_at: DateTime<Utc> = expires_at
            .parse()
            .map_err(|e| CliError::cache(format!("Failed to parse expiration date: {}", e)))?;
        Ok(Utc::now() >= expires_at)
    }

    // ------------------------------------------------------------------------
    // Taxonomy
    // ------------------------------------------------------------------------

    pub fn get_taxonomy(&self, taxid: u32) -> Result<Option<TaxonomyInfo>> {
        let conn = self.open_connection()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT payload_json, expires_at FROM taxonomy_cache WHERE taxid = ?1",
                params![taxid],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((payload, expires_at)) = row else {
            debug!(taxid, "Taxonomy cache miss");
            return Ok(None);
        };

        if Self::is_expired(&expires_at)? {
            debug!(taxid, "Taxonomy cache entry expired");
            conn.execute("DELETE FROM taxonomy_cache WHERE taxid = ?1", params![taxid])?;
            return Ok(None);
        }

        let info: TaxonomyInfo = serde_json::from_str(&payload)?;
        debug!(taxid, "Taxonomy cache hit");
        Ok(Some(info))
    }

    pub fn put_taxonomy(&self, info: &TaxonomyInfo) -> Result<()> {
        let payload = serde_json::to_string(info)?;
        let (fetched_at, expires_at) = self.now_and_expiry();

        let conn = self.open_connection()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO taxonomy_cache (taxid, payload_json, fetched_at, expires_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![info.taxid, payload, fetched_at, expires_at],
        )?;

        debug!(taxid = info.taxid, ttl_days = self.ttl_days, "Cached taxonomy");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Citations
    // ------------------------------------------------------------------------

    pub fn get_citation(&self, doi: &str) -> Result<Option<CachedCitation>> {
        let key = doi.to_lowercase();
        let conn = self.open_connection()?;

        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT bibtex, format, expires_at FROM citation_cache WHERE doi = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((bibtex, format, expires_at)) = row else {
            debug!(doi, "Citation cache miss");
            return Ok(None);
        };

        if Self::is_expired(&expires_at)? {
            debug!(doi, "Citation cache entry expired");
            conn.execute("DELETE FROM citation_cache WHERE doi = ?1", params![key])?;
            return Ok(None);
        }

        let format: CitationFormat = format.parse()?;
        debug!(doi, "Citation cache hit");
        Ok(Some(CachedCitation { bibtex, format }))
    }

    pub fn put_citation(&self, doi: &str, bibtex: &str, format: CitationFormat) -> Result<()> {
        let (fetched_at, expires_at) = self.now_and_expiry();

        let conn = self.open_connection()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO citation_cache (doi, bibtex, format, fetched_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![doi.to_lowercase(), bibtex, format.to_string(), fetched_at, expires_at],
        )?;

        debug!(doi, %format, "Cached citation");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Maintenance
    // ------------------------------------------------------------------------

    pub fn stats(&self) -> Result<CacheStats> {
        let conn = self.open_connection()?;
        let now = Self::timestamp(Utc::now());

        let table_stats = |table: &str| -> Result<TableStats> {
            let total: i64 =
                conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            let expired: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE expires_at <= ?1", table),
                params![now],
                |row| row.get(0),
            )?;
            Ok(TableStats {
                total_entries: total as usize,
                expired_entries: expired as usize,
            })
        };

        let taxonomy = table_stats("taxonomy_cache")?;
        let citations = table_stats("citation_cache")?;
        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        Ok(CacheStats {
            db_path: self.db_path.clone(),
            db_size,
            taxonomy,
            citations,
        })
    }

    /// Delete every entry of `kind`. Returns the number of rows removed.
    pub fn clear(&self, kind: CacheKind) -> Result<usize> {
        let conn = self.open_connection()?;
        let mut count = 0;
        for table in kind.tables() {
            count += conn.execute(&format!("DELETE FROM {}", table), [])?;
        }
        info!(count, ?kind, "Cleared metadata cache");
        Ok(count)
    }

    /// Delete expired entries from both tables
    pub fn purge_expired(&self) -> Result<usize> {
        let conn = self.open_connection()?;
        let now = Self::timestamp(Utc::now());
        let mut count = 0;
        for table in CacheKind::All.tables() {
            count += conn.execute(
                &format!("DELETE FROM {} WHERE expires_at <= ?1", table),
                params![now],
            )?;
        }

        if count > 0 {
            debug!(count, "Purged expired cache entries");
        }
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wildmeth_common::types::TaxonomySource;

    fn create_test_cache(ttl_days: i64) -> (MetadataCache, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let cache = MetadataCache::open(dir.path().join("metadata.db"), ttl_days).unwrap();
        (cache, dir)
    }

    fn pig() -> TaxonomyInfo {
        let mut info = TaxonomyInfo::unresolved(9823);
        info.species = Some("Sus scrofa".to_string());
        info.order = Some("Artiodactyla".to_string());
        info.class = Some("Mammalia".to_string());
        info.common_name = Some("Wild boar".to_string());
        info.source = TaxonomySource::Ncbi;
        info
    }

    #[test]
    fn test_cache_init_creates_file() {
        let (cache, _dir) = create_test_cache(30);
        assert!(cache.db_path().exists());
        let stats = cache.stats().unwrap();
        assert_eq!(stats.taxonomy, TableStats::default());
        assert_eq!(stats.citations, TableStats::default());
    }

    #[test]
    fn test_taxonomy_round_trip() {
        let (cache, _dir) = create_test_cache(30);
        assert!(cache.get_taxonomy(9823).unwrap().is_none());

        cache.put_taxonomy(&pig()).unwrap();
        assert_eq!(cache.get_taxonomy(9823).unwrap(), Some(pig()));
    }

    #[test]
    fn test_citation_key_is_case_insensitive() {
        let (cache, _dir) = create_test_cache(30);
        cache
            .put_citation("10.1111/MEC.16000", "@article{a, title={A}}", CitationFormat::Crossref)
            .unwrap();

        let cached = cache.get_citation("10.1111/mec.16000").unwrap().unwrap();
        assert_eq!(cached.format, CitationFormat::Crossref);
        assert_eq!(cached.bibtex, "@article{a, title={A}}");
    }

    #[test]
    fn test_expired_entries_are_misses_and_deleted() {
        let (cache, _dir) = create_test_cache(-1);
        cache.put_taxonomy(&pig()).unwrap();
        cache.put_citation("10.1/x", "@misc{x,}", CitationFormat::Bibtex).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.taxonomy.expired_entries, 1);
        assert_eq!(stats.citations.valid_entries(), 0);

        assert!(cache.get_taxonomy(9823).unwrap().is_none());
        assert_eq!(cache.stats().unwrap().taxonomy.total_entries, 0);

        assert_eq!(cache.purge_expired().unwrap(), 1);
        assert_eq!(cache.stats().unwrap().citations.total_entries, 0);
    }

    #[test]
    fn test_clear_by_kind() {
        let (cache, _dir) = create_test_cache(30);
        cache.put_taxonomy(&pig()).unwrap();
        cache.put_citation("10.1/x", "@misc{x,}", CitationFormat::Bibtex).unwrap();

        assert_eq!(cache.clear(CacheKind::Citations).unwrap(), 1);
        assert!(cache.get_taxonomy(9823).unwrap().is_some());
        assert!(cache.get_citation("10.1/x").unwrap().is_none());

        cache.put_citation("10.1/x", "@misc{x,}", CitationFormat::Bibtex).unwrap();
        assert_eq!(cache.clear(CacheKind::All).unwrap(), 2);
    }
}
