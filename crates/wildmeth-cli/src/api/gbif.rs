//! GBIF species client

use crate::api::endpoints;
use crate::api::http::HttpClient;
use crate::api::types::{GbifMatch, GbifVernacularPage};
use crate::config::Config;
use crate::error::Result;

/// Client for the GBIF species API
pub struct GbifClient {
    http: HttpClient,
    base_url: String,
}

impl GbifClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new("GBIF", config)?,
            base_url: config.gbif_url.clone(),
        })
    }

    /// Match a scientific name against the GBIF backbone.
    ///
    /// Returns `None` when GBIF reports `matchType: NONE`.
    pub async fn match_name(&self, name: &str) -> Result<Option<GbifMatch>> {
        let url = endpoints::gbif_match_url(&self.base_url, name);
        let matched: Option<GbifMatch> = self.http.get_json_optional(&url).await?;
        Ok(matched.filter(GbifMatch::is_match))
    }

    /// Best English vernacular name for a usage key, if any
    pub async fn english_name(&self, usage_key: u64) -> Result<Option<String>> {
        let url = endpoints::gbif_vernacular_url(&self.base_url, usage_key);
        let page: Option<GbifVernacularPage> = self.http.get_json_optional(&url).await?;

        Ok(page.and_then(|page| {
            page.results
                .into_iter()
                .filter(|v| !v.vernacular_name.trim().is_empty())
                .find(|v| matches!(v.language.as_deref(), Some("eng") | Some("en")))
                .map(|v| v.vernacular_name.trim().to_string())
        }))
    }
}
