//! Common types used across wildmeth

use crate::error::{Result, WildmethError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown wherever a taxonomic field could not be resolved.
pub const UNKNOWN: &str = "Unknown";

/// Prefixes stripped from DOIs before validation.
const DOI_PREFIXES: &[&str] = &[
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "doi:",
];

// ============================================================================
// Study records
// ============================================================================

/// One published methylation study, as written by a curator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    /// DOI of the publication, normalized by [`Study::normalize`]
    pub doi: String,

    /// NCBI Taxonomy identifier of the studied species
    #[serde(alias = "tax_id", alias = "ncbi_taxid", deserialize_with = "deserialize_taxid")]
    pub taxid: u32,

    /// Number of individuals sampled
    #[serde(default, alias = "n", skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<u32>,

    /// Profiling method (RRBS, WGBS, array, ...)
    #[serde(default)]
    pub method: String,

    /// Where the raw data lives (GEO, SRA, Dryad, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tissue: Option<String>,

    /// Scientific name used when NCBI has nothing for the taxid
    #[serde(default, alias = "species", skip_serializing_if = "Option::is_none")]
    pub species_hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Study {
    /// Normalize curator input in place: DOI prefixes, blank strings, method.
    pub fn normalize(&mut self) {
        self.doi = strip_doi_prefix(&self.doi);
        self.method = match self.method.trim() {
            "" => UNKNOWN.to_string(),
            m => m.to_string(),
        };
        for field in [
            &mut self.data_url,
            &mut self.tissue,
            &mut self.species_hint,
            &mut self.notes,
        ] {
            if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *field = None;
            } else if let Some(v) = field {
                *v = v.trim().to_string();
            }
        }
    }

    /// Check the record, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        normalize_doi(&self.doi)?;

        if self.taxid == 0 {
            return Err(WildmethError::InvalidTaxId(format!(
                "taxid must be positive for {}",
                self.doi
            )));
        }

        if let Some(ref data_url) = self.data_url {
            let parsed = url::Url::parse(data_url)
                .map_err(|e| WildmethError::InvalidUrl(format!("{}: {}", data_url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(WildmethError::InvalidUrl(format!(
                    "{}: only http(s) links are allowed",
                    data_url
                )));
            }
        }

        Ok(())
    }
}

fn strip_doi_prefix(raw: &str) -> String {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    for prefix in DOI_PREFIXES {
        if lower.starts_with(prefix) {
            return trimmed[prefix.len()..].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Strip resolver prefixes from a DOI and check its basic shape.
///
/// DOIs are matched case-insensitively by registries, but the original casing
/// is preserved here because BibTeX keys and links read better that way.
pub fn normalize_doi(raw: &str) -> Result<String> {
    let doi = strip_doi_prefix(raw);
    let Some((prefix, suffix)) = doi.split_once('/') else {
        return Err(WildmethError::InvalidDoi(raw.to_string()));
    };
    if !prefix.starts_with("10.") || prefix.len() < 4 || suffix.is_empty() {
        return Err(WildmethError::InvalidDoi(raw.to_string()));
    }
    if doi.chars().any(char::is_whitespace) {
        return Err(WildmethError::InvalidDoi(raw.to_string()));
    }
    Ok(doi)
}

fn deserialize_taxid<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .trim_start_matches("txid")
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid taxid '{}'", s))),
    }
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Which resolution rule produced a taxonomy record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomySource {
    Override,
    Cache,
    Ncbi,
    Gbif,
    Keyword,
    Unresolved,
}

impl std::fmt::Display for TaxonomySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaxonomySource::Override => "override",
            TaxonomySource::Cache => "cache",
            TaxonomySource::Ncbi => "ncbi",
            TaxonomySource::Gbif => "gbif",
            TaxonomySource::Keyword => "keyword",
            TaxonomySource::Unresolved => "unresolved",
        };
        f.write_str(s)
    }
}

/// Taxonomic metadata attached to a study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyInfo {
    pub taxid: u32,
    pub species: Option<String>,
    pub order: Option<String>,
    pub class: Option<String>,
    pub common_name: Option<String>,
    pub source: TaxonomySource,

    /// Ancestor names, root first, when a lineage was available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lineage: Vec<String>,
}

impl TaxonomyInfo {
    /// An empty record for `taxid`; every field still to be resolved.
    pub fn unresolved(taxid: u32) -> Self {
        Self {
            taxid,
            species: None,
            order: None,
            class: None,
            common_name: None,
            source: TaxonomySource::Unresolved,
            lineage: Vec::new(),
        }
    }

    /// True once every displayed field has a value.
    pub fn is_complete(&self) -> bool {
        self.species.is_some()
            && self.order.is_some()
            && self.class.is_some()
            && self.common_name.is_some()
    }

    /// Fields still missing, by name.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.species.is_none() {
            missing.push("species");
        }
        if self.order.is_none() {
            missing.push("order");
        }
        if self.class.is_none() {
            missing.push("class");
        }
        if self.common_name.is_none() {
            missing.push("common_name");
        }
        missing
    }

    /// Fill empty fields from `other`. Returns true if anything was filled.
    ///
    /// The source is taken from `other` the first time it contributes.
    pub fn fill_from(&mut self, other: &TaxonomyInfo) -> bool {
        let mut filled = false;
        for (mine, theirs) in [
            (&mut self.species, &other.species),
            (&mut self.order, &other.order),
            (&mut self.class, &other.class),
            (&mut self.common_name, &other.common_name),
        ] {
            if mine.is_none() {
                if let Some(value) = theirs.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                    *mine = Some(value.to_string());
                    filled = true;
                }
            }
        }
        if filled && self.source == TaxonomySource::Unresolved {
            self.source = other.source;
        }
        if self.lineage.is_empty() && !other.lineage.is_empty() {
            self.lineage = other.lineage.clone();
        }
        filled
    }

    pub fn species_or_unknown(&self) -> &str {
        self.species.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn order_or_unknown(&self) -> &str {
        self.order.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn class_or_unknown(&self) -> &str {
        self.class.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn common_name_or_unknown(&self) -> &str {
        self.common_name.as_deref().unwrap_or(UNKNOWN)
    }
}

// ============================================================================
// Citations
// ============================================================================

/// How a BibTeX entry was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CitationFormat {
    /// `Accept: application/x-bibtex` against the DOI resolver
    Bibtex,
    /// `Accept: text/bibliography; style=bibtex` against the DOI resolver
    Bibliography,
    /// Crossref's transform endpoint
    Crossref,
}

impl std::fmt::Display for CitationFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CitationFormat::Bibtex => "bibtex",
            CitationFormat::Bibliography => "bibliography",
            CitationFormat::Crossref => "crossref",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for CitationFormat {
    type Err = WildmethError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bibtex" => Ok(CitationFormat::Bibtex),
            "bibliography" => Ok(CitationFormat::Bibliography),
            "crossref" => Ok(CitationFormat::Crossref),
            other => Err(WildmethError::Parse(format!("unknown citation format '{}'", other))),
        }
    }
}

/// A BibTeX citation plus the fields shown on the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub doi: String,
    pub bibtex: String,
    pub title: Option<String>,
    pub authors: Option<String>,
    pub year: Option<String>,
    pub journal: Option<String>,
    pub format: CitationFormat,
}

// ============================================================================
// Enriched catalog
// ============================================================================

/// A study joined with its taxonomy and citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedStudy {
    #[serde(flatten)]
    pub study: Study,
    pub taxonomy: TaxonomyInfo,
    pub citation: Option<Citation>,
}

impl EnrichedStudy {
    /// Sort key: class, order, species, DOI. Unknown values sort last.
    pub fn sort_key(&self) -> (bool, &str, bool, &str, bool, &str, &str) {
        let t = &self.taxonomy;
        (
            t.class.is_none(),
            t.class_or_unknown(),
            t.order.is_none(),
            t.order_or_unknown(),
            t.species.is_none(),
            t.species_or_unknown(),
            &self.study.doi,
        )
    }
}

/// The full enriched dataset embedded in the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub generated_at: DateTime<Utc>,
    pub studies: Vec<EnrichedStudy>,
}

impl Catalog {
    pub fn new(mut studies: Vec<EnrichedStudy>) -> Self {
        studies.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            generated_at: Utc::now(),
            studies,
        }
    }

    /// Number of distinct resolved species
    pub fn species_count(&self) -> usize {
        self.distinct(|s| s.taxonomy.species.as_deref()).len()
    }

    /// Number of distinct resolved orders
    pub fn order_count(&self) -> usize {
        self.distinct(|s| s.taxonomy.order.as_deref()).len()
    }

    /// Sum of all known sample sizes
    pub fn total_samples(&self) -> u64 {
        self.studies
            .iter()
            .filter_map(|s| s.study.sample_size)
            .map(u64::from)
            .sum()
    }

    /// Sorted distinct non-empty values of a field
    pub fn distinct<'a, F>(&'a self, field: F) -> Vec<&'a str>
    where
        F: Fn(&'a EnrichedStudy) -> Option<&'a str>,
    {
        let set: std::collections::BTreeSet<&str> =
            self.studies.iter().filter_map(field).collect();
        set.into_iter().collect()
    }
}
