//! Citation retrieval
//!
//! BibTeX for each DOI comes from the cache when possible, otherwise from
//! doi.org content negotiation (`application/x-bibtex`, then
//! `text/bibliography; style=bibtex`) and finally Crossref's transform
//! endpoint. Requests are made one at a time; the HTTP clients pace them.

pub mod bibtex;

use crate::api::DoiClient;
use crate::cache::MetadataCache;
use crate::config::Config;
use crate::error::Result;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use wildmeth_common::types::{Citation, CitationFormat};

use bibtex::BibEntry;

/// Formats tried, in order
pub const FALLBACK_ORDER: [CitationFormat; 3] = [
    CitationFormat::Bibtex,
    CitationFormat::Bibliography,
    CitationFormat::Crossref,
];

/// Build a [`Citation`] from a BibTeX response
pub fn citation_from_bibtex(doi: &str, raw: &str, format: CitationFormat) -> Citation {
    let bibtex = bibtex::normalize(raw);
    let entry = BibEntry::parse(&bibtex);

    Citation {
        doi: doi.to_string(),
        title: entry.as_ref().and_then(BibEntry::title),
        authors: entry.as_ref().and_then(BibEntry::authors),
        year: entry.as_ref().and_then(BibEntry::year),
        journal: entry.as_ref().and_then(BibEntry::journal),
        bibtex,
        format,
    }
}

/// Fetches and caches BibTeX per DOI
pub struct CitationFetcher {
    client: Option<DoiClient>,
    cache: Option<MetadataCache>,
}

impl CitationFetcher {
    /// `client: None` means cache-only
    pub fn new(client: Option<DoiClient>, cache: Option<MetadataCache>) -> Self {
        Self { client, cache }
    }

    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let cache = MetadataCache::open(config.cache_db_path(), config.cache_ttl_days)?;
        let client = if offline {
            None
        } else {
            Some(DoiClient::new(config)?)
        };
        Ok(Self::new(client, Some(cache)))
    }

    /// Citation for one DOI, or `None` if every source failed
    pub async fn fetch(&self, doi: &str) -> Option<Citation> {
        if let Some(ref cache) = self.cache {
            match cache.get_citation(doi) {
                Ok(Some(cached)) => {
                    return Some(citation_from_bibtex(doi, &cached.bibtex, cached.format));
                },
                Ok(None) => {},
                Err(e) => warn!(doi, error = %e, "Citation cache read failed"),
            }
        }

        let client = self.client.as_ref()?;

        for format in FALLBACK_ORDER {
            match client.bibtex(doi, format).await {
                Ok(Some(raw)) => {
                    debug!(doi, %format, "Fetched BibTeX");
                    let citation = citation_from_bibtex(doi, &raw, format);
                    if let Some(ref cache) = self.cache {
                        if let Err(e) = cache.put_citation(doi, &citation.bibtex, format) {
                            warn!(doi, error = %e, "Failed to cache citation");
                        }
                    }
                    return Some(citation);
                },
                Ok(None) => debug!(doi, %format, "No BibTeX in this format"),
                Err(e) => warn!(doi, %format, error = %e, "BibTeX request failed"),
            }
        }

        warn!(doi, "No citation found");
        None
    }

    /// Citations keyed by lowercased DOI. Each distinct DOI is fetched once.
    pub async fn fetch_all<'a, I>(&self, dois: I, progress: &ProgressBar) -> BTreeMap<String, Citation>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = std::collections::BTreeSet::new();
        let mut citations = BTreeMap::new();

        for doi in dois {
            let key = doi.to_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }
            progress.set_prefix(doi.to_string());
            if let Some(citation) = self.fetch(doi).await {
                citations.insert(key, citation);
            }
            progress.inc(1);
        }

        citations
    }
}

/// Write every entry, sorted by DOI, separated by blank lines. Returns the count.
pub fn write_bibliography<'a, I>(path: &Path, citations: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a Citation>,
{
    let mut entries: Vec<&Citation> = citations.into_iter().collect();
    entries.sort_by_key(|c| c.doi.to_lowercase());
    entries.dedup_by_key(|c| c.doi.to_lowercase());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut content = entries
        .iter()
        .map(|c| c.bibtex.trim())
        .collect::<Vec<_>>()
        .join("\n\n");
    if !content.is_empty() {
        content.push('\n');
    }
    std::fs::write(path, content)?;

    Ok(entries.len())
}
