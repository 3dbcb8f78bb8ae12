//! Taxonomy enrichment
//!
//! Each study carries an NCBI taxid; the catalog needs the species, order,
//! class and a common name. The [`Enricher`] runs a fixed chain of
//! resolvers and merges their answers field by field:
//!
//! 1. curated overrides (built-in table plus the project file)
//! 2. the metadata cache
//! 3. NCBI Datasets, including a lineage walk for order and class
//! 4. GBIF name matching and vernacular names
//! 5. keyword rules over the names found so far
//!
//! A later resolver only fills fields that are still empty. Network failures
//! are logged and the chain moves on, so one bad record never aborts a build.

pub mod gbif;
pub mod keywords;
pub mod lineage;
pub mod ncbi;
pub mod overrides;

use crate::cache::MetadataCache;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::project::TaxonOverride;
use async_trait::async_trait;
use indicatif::ProgressBar;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

pub use gbif::GbifResolver;
pub use keywords::KeywordResolver;
pub use ncbi::NcbiResolver;
pub use overrides::OverrideResolver;

/// What is known about a taxon when a resolver is asked about it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxonQuery {
    pub taxid: u32,
    /// Scientific name from an earlier resolver
    pub species: Option<String>,
    /// Scientific name supplied with the study record
    pub species_hint: Option<String>,
    pub common_name: Option<String>,
    /// Ancestor names, root first
    pub lineage: Vec<String>,
}

impl TaxonQuery {
    pub fn new(taxid: u32, species_hint: Option<String>) -> Self {
        Self {
            taxid,
            species_hint,
            ..Self::default()
        }
    }

    /// Name to search by: the resolved species, else the hint
    pub fn search_name(&self) -> Option<&str> {
        self.species
            .as_deref()
            .or(self.species_hint.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Carry forward what has been resolved so far
    fn update(&mut self, info: &TaxonomyInfo) {
        self.species = info.species.clone();
        self.common_name = info.common_name.clone();
        if !info.lineage.is_empty() {
            self.lineage = info.lineage.clone();
        }
    }
}

/// One source of taxonomy
#[async_trait]
pub trait TaxonomyResolver: Send + Sync {
    /// Rule this resolver implements; recorded on what it returns
    fn source(&self) -> TaxonomySource;

    /// Look the taxon up. `Ok(None)` means this source has no answer.
    /// `CliError::Incomplete` carries fields found before a later request failed.
    async fn lookup(&self, query: &TaxonQuery) -> Result<Option<TaxonomyInfo>>;
}

/// Upper-case the first character, leave the rest alone
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Runs the resolver chain for one taxid at a time
pub struct Enricher {
    overrides: OverrideResolver,
    cache: Option<MetadataCache>,
    remote: Vec<Box<dyn TaxonomyResolver>>,
    keywords: KeywordResolver,
}

impl Enricher {
    /// Overrides, optional cache and keyword rules; no network resolvers
    pub fn new(overrides: OverrideResolver, cache: Option<MetadataCache>) -> Self {
        Self {
            overrides,
            cache,
            remote: Vec::new(),
            keywords: KeywordResolver::new(),
        }
    }

    /// Append a network resolver; they run in the order added
    pub fn with_resolver(mut self, resolver: impl TaxonomyResolver + 'static) -> Self {
        self.remote.push(Box::new(resolver));
        self
    }

    /// The standard chain. Offline mode leaves out NCBI and GBIF.
    pub fn from_config(
        config: &Config,
        project_overrides: &BTreeMap<u32, TaxonOverride>,
        offline: bool,
    ) -> Result<Self> {
        let cache = MetadataCache::open(config.cache_db_path(), config.cache_ttl_days)?;
        let enricher = Self::new(OverrideResolver::with_project(project_overrides), Some(cache));

        if offline {
            debug!("Offline: NCBI and GBIF lookups disabled");
            return Ok(enricher);
        }

        Ok(enricher
            .with_resolver(NcbiResolver::new(config)?)
            .with_resolver(GbifResolver::new(config)?))
    }

    pub fn is_offline(&self) -> bool {
        self.remote.is_empty()
    }

    /// Resolve one taxid. Never fails: unresolved fields stay `None`.
    pub async fn resolve(&self, taxid: u32, species_hint: Option<&str>) -> TaxonomyInfo {
        let mut query = TaxonQuery::new(taxid, species_hint.map(str::to_string));

        let mut result = TaxonomyInfo::unresolved(taxid);
        if let Ok(Some(curated)) = self.overrides.lookup(&query).await {
            result.fill_from(&curated);
            if result.is_complete() {
                debug!(taxid, "Resolved from overrides");
                return result;
            }
        }

        if let Some(cached) = self.cached(taxid) {
            result.fill_from(&cached);
            return Self::finish(result);
        }

        // Everything learned from the chain below, without the curated fields
        let mut fetched = TaxonomyInfo::unresolved(taxid);
        let mut had_error = false;

        for resolver in self.chain() {
            if result.is_complete() {
                break;
            }
            query.update(&result);

            match resolver.lookup(&query).await {
                Ok(Some(found)) => {
                    debug!(taxid, source = %resolver.source(), "Resolver answered");
                    result.fill_from(&found);
                    fetched.fill_from(&found);
                },
                Ok(None) => {},
                Err(CliError::Incomplete { found, cause }) => {
                    had_error = true;
                    warn!(taxid, source = %resolver.source(), error = %cause, "Taxonomy lookup incomplete");
                    result.fill_from(&found);
                    fetched.fill_from(&found);
                },
                Err(e) => {
                    had_error = true;
                    warn!(taxid, source = %resolver.source(), error = %e, "Taxonomy lookup failed");
                },
            }
        }

        fetched.common_name = fetched.common_name.as_deref().map(capitalize_first);
        if !had_error && !self.is_offline() && fetched.source != TaxonomySource::Unresolved {
            if let Some(ref cache) = self.cache {
                if let Err(e) = cache.put_taxonomy(&fetched) {
                    warn!(taxid, error = %e, "Failed to cache taxonomy");
                }
            }
        }

        Self::finish(result)
    }

    /// Resolve many taxids, one after another. Repeated taxids are resolved once.
    pub async fn resolve_all<'a, I>(&self, taxa: I, progress: &ProgressBar) -> BTreeMap<u32, TaxonomyInfo>
    where
        I: IntoIterator<Item = (u32, Option<&'a str>)>,
    {
        let mut resolved = BTreeMap::new();
        for (taxid, hint) in taxa {
            if !resolved.contains_key(&taxid) {
                progress.set_prefix(format!("taxid {}", taxid));
                resolved.insert(taxid, self.resolve(taxid, hint).await);
                progress.inc(1);
            }
        }
        resolved
    }

    /// Network resolvers in order, then the keyword rules
    fn chain(&self) -> Vec<&dyn TaxonomyResolver> {
        let mut chain: Vec<&dyn TaxonomyResolver> = Vec::with_capacity(self.remote.len() + 1);
        for resolver in &self.remote {
            chain.push(resolver.as_ref());
        }
        chain.push(&self.keywords);
        chain
    }

    fn cached(&self, taxid: u32) -> Option<TaxonomyInfo> {
        let cache = self.cache.as_ref()?;
        match cache.get_taxonomy(taxid) {
            Ok(Some(mut info)) => {
                info.source = TaxonomySource::Cache;
                Some(info)
            },
            Ok(None) => None,
            Err(e) => {
                warn!(taxid, error = %e, "Taxonomy cache read failed");
                None
            },
        }
    }

    fn finish(mut result: TaxonomyInfo) -> TaxonomyInfo {
        result.common_name = result.common_name.as_deref().map(capitalize_first);

        if result.source == TaxonomySource::Unresolved {
            warn!(taxid = result.taxid, "Taxon could not be resolved");
        } else if !result.is_complete() {
            info!(
                taxid = result.taxid,
                missing = ?result.missing_fields(),
                "Taxon partially resolved"
            );
        }
        result
    }
}
