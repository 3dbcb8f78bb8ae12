//! NCBI Datasets taxonomy client

use crate::api::endpoints;
use crate::api::http::HttpClient;
use crate::api::types::{NcbiTaxon, NcbiTaxonomyResponse};
use crate::config::Config;
use crate::error::{CliError, Result};
use reqwest::header::{HeaderMap, HeaderValue};

/// Maximum taxids per bulk request
const MAX_IDS_PER_REQUEST: usize = 100;

/// Client for NCBI Datasets v2 taxonomy endpoints
pub struct NcbiClient {
    http: HttpClient,
    base_url: String,
}

impl NcbiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(ref key) = config.ncbi_api_key {
            headers.insert(
                "api-key",
                HeaderValue::from_str(key)
                    .map_err(|_| CliError::config("WILDMETH_NCBI_API_KEY contains invalid characters"))?,
            );
        }

        Ok(Self {
            http: HttpClient::with_headers("NCBI", config, headers)?,
            base_url: config.ncbi_url.clone(),
        })
    }

    /// Look up one taxon. `None` when NCBI does not know the taxid.
    pub async fn taxon(&self, taxid: u32) -> Result<Option<NcbiTaxon>> {
        let url = endpoints::ncbi_taxon_url(&self.base_url, &[taxid]);
        let response: Option<NcbiTaxonomyResponse> = self.http.get_json_optional(&url).await?;

        Ok(response.and_then(|r| {
            r.taxonomy_nodes
                .into_iter()
                .filter_map(|node| node.taxonomy)
                .find(|t| t.tax_id.is_none() || t.tax_id == Some(u64::from(taxid)))
        }))
    }

    /// Look up many taxa at once; unknown ids are silently skipped.
    pub async fn taxa(&self, taxids: &[u64]) -> Result<Vec<NcbiTaxon>> {
        let mut found = Vec::new();
        let ids: Vec<u32> = taxids.iter().filter_map(|id| u32::try_from(*id).ok()).collect();

        for chunk in ids.chunks(MAX_IDS_PER_REQUEST) {
            let url = endpoints::ncbi_taxon_url(&self.base_url, chunk);
            if let Some(response) = self.http.get_json_optional::<NcbiTaxonomyResponse>(&url).await? {
                found.extend(response.taxonomy_nodes.into_iter().filter_map(|n| n.taxonomy));
            }
        }

        Ok(found)
    }
}
