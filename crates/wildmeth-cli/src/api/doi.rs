//! BibTeX retrieval through DOI content negotiation and Crossref

use crate::api::endpoints;
use crate::api::http::HttpClient;
use crate::config::Config;
use crate::error::Result;
use wildmeth_common::types::CitationFormat;

/// Client for doi.org content negotiation and the Crossref transform endpoint
pub struct DoiClient {
    resolver: HttpClient,
    crossref: HttpClient,
    doi_url: String,
    crossref_url: String,
}

impl DoiClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            resolver: HttpClient::new("DOI resolver", config)?,
            crossref: HttpClient::new("Crossref", config)?,
            doi_url: config.doi_url.clone(),
            crossref_url: config.crossref_url.clone(),
        })
    }

    /// Request BibTeX for `doi` in one specific way.
    ///
    /// Returns `None` unless the service answered 2xx with something that
    /// looks like a BibTeX entry.
    pub async fn bibtex(&self, doi: &str, format: CitationFormat) -> Result<Option<String>> {
        let body = match format {
            CitationFormat::Bibtex => {
                let url = endpoints::doi_url(&self.doi_url, doi);
                self.resolver.get_text_optional(&url, "application/x-bibtex").await?
            },
            CitationFormat::Bibliography => {
                let url = endpoints::doi_url(&self.doi_url, doi);
                self.resolver
                    .get_text_optional(&url, "text/bibliography; style=bibtex")
                    .await?
            },
            CitationFormat::Crossref => {
                let url = endpoints::crossref_bibtex_url(&self.crossref_url, doi);
                self.crossref.get_text_optional(&url, "application/x-bibtex").await?
            },
        };

        Ok(body.filter(|text| looks_like_bibtex(text)))
    }
}

/// A BibTeX entry starts with `@type{`
pub fn looks_like_bibtex(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('@') && trimmed.contains('{')
}
