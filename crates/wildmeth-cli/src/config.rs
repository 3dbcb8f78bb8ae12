//! Runtime configuration for the wildmeth CLI
//!
//! Settings that differ per machine rather than per catalog: cache location,
//! service base URLs, API keys and request pacing. Everything can be set from
//! the environment (or a `.env` file); the per-catalog settings live in
//! [`crate::project::Project`].

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// CLI Configuration Constants
// ============================================================================

/// NCBI Datasets v2 API root
pub const DEFAULT_NCBI_URL: &str = "https://api.ncbi.nlm.nih.gov/datasets/v2";

/// GBIF API root
pub const DEFAULT_GBIF_URL: &str = "https://api.gbif.org/v1";

/// DOI resolver used for content negotiation
pub const DEFAULT_DOI_URL: &str = "https://doi.org";

/// Crossref REST API root
pub const DEFAULT_CROSSREF_URL: &str = "https://api.crossref.org";

/// Days before a cached taxon or citation is refetched
pub const DEFAULT_CACHE_TTL_DAYS: i64 = 30;

/// Per-request timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Pause between outbound requests. NCBI allows 3 req/s without a key.
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 350;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cache_dir: PathBuf,
    pub cache_ttl_days: i64,
    pub http_timeout_secs: u64,
    pub request_delay_ms: u64,
    pub ncbi_url: String,
    pub gbif_url: String,
    pub doi_url: String,
    pub crossref_url: String,

    /// Sent as the `api-key` header; raises NCBI's rate limit to 10 req/s
    #[serde(skip_serializing)]
    pub ncbi_api_key: Option<String>,

    /// Added to the User-Agent so Crossref routes us to its polite pool
    pub contact_email: Option<String>,
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| CliError::config("Could not determine cache directory"))?
            .join("wildmeth");

        Ok(Self {
            cache_dir,
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            ncbi_url: DEFAULT_NCBI_URL.to_string(),
            gbif_url: DEFAULT_GBIF_URL.to_string(),
            doi_url: DEFAULT_DOI_URL.to_string(),
            crossref_url: DEFAULT_CROSSREF_URL.to_string(),
            ncbi_api_key: None,
            contact_email: None,
        })
    }

    /// Load config from environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::new().or_else(|_| Self::new_local())?;

        if let Ok(dir) = std::env::var("WILDMETH_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Some(days) = parse_env("WILDMETH_CACHE_TTL_DAYS")? {
            config.cache_ttl_days = days;
        }

        if let Some(secs) = parse_env("WILDMETH_HTTP_TIMEOUT_SECS")? {
            config.http_timeout_secs = secs;
        }

        if let Some(ms) = parse_env("WILDMETH_REQUEST_DELAY_MS")? {
            config.request_delay_ms = ms;
        }

        for (var, slot) in [
            ("WILDMETH_NCBI_URL", &mut config.ncbi_url),
            ("WILDMETH_GBIF_URL", &mut config.gbif_url),
            ("WILDMETH_DOI_URL", &mut config.doi_url),
            ("WILDMETH_CROSSREF_URL", &mut config.crossref_url),
        ] {
            if let Ok(url) = std::env::var(var) {
                *slot = url.trim_end_matches('/').to_string();
            }
        }

        config.ncbi_api_key = non_empty_env("WILDMETH_NCBI_API_KEY");
        config.contact_email = non_empty_env("WILDMETH_CONTACT_EMAIL");

        Ok(config)
    }

    /// Fallback when the platform has no cache directory
    fn new_local() -> Result<Self> {
        Ok(Self {
            cache_dir: PathBuf::from(".wildmeth-cache"),
            cache_ttl_days: DEFAULT_CACHE_TTL_DAYS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            request_delay_ms: DEFAULT_REQUEST_DELAY_MS,
            ncbi_url: DEFAULT_NCBI_URL.to_string(),
            gbif_url: DEFAULT_GBIF_URL.to_string(),
            doi_url: DEFAULT_DOI_URL.to_string(),
            crossref_url: DEFAULT_CROSSREF_URL.to_string(),
            ncbi_api_key: None,
            contact_email: None,
        })
    }

    /// Path of the SQLite metadata cache
    pub fn cache_db_path(&self) -> PathBuf {
        self.cache_dir.join("metadata.db")
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// User-Agent for all outbound requests
    pub fn user_agent(&self) -> String {
        match self.contact_email {
            Some(ref email) => format!(
                "wildmeth/{} (mailto:{})",
                env!("CARGO_PKG_VERSION"),
                email
            ),
            None => format!("wildmeth/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CliError::config(format!("{} has an invalid value '{}'", var, raw))),
        Err(_) => Ok(None),
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
