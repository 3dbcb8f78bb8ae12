//! GBIF backbone resolver

use super::{TaxonQuery, TaxonomyResolver};
use crate::api::GbifClient;
use crate::config::Config;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

/// Matches the species name against GBIF for order, class and a vernacular name
pub struct GbifResolver {
    client: GbifClient,
}

impl GbifResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: GbifClient::new(config)?,
        })
    }
}

#[async_trait]
impl TaxonomyResolver for GbifResolver {
    fn source(&self) -> TaxonomySource {
        TaxonomySource::Gbif
    }

    async fn lookup(&self, query: &TaxonQuery) -> Result<Option<TaxonomyInfo>> {
        let Some(name) = query.search_name() else {
            debug!(taxid = query.taxid, "No name to match against GBIF");
            return Ok(None);
        };

        let Some(matched) = self.client.match_name(name).await? else {
            debug!(taxid = query.taxid, name, "GBIF found no match");
            return Ok(None);
        };

        let mut info = TaxonomyInfo::unresolved(query.taxid);
        info.source = TaxonomySource::Gbif;
        info.order = matched.order.clone();
        info.class = matched.class_name.clone();
        if matched.is_species_match() {
            info.species = matched.canonical_name.clone().or(matched.species.clone());
        }

        if query.common_name.is_none() {
            if let Some(key) = matched.usage_key {
                match self.client.english_name(key).await {
                    Ok(name) => info.common_name = name,
                    Err(e) => {
                        warn!(taxid = query.taxid, usage_key = key, error = %e, "Vernacular names unavailable, keeping match");
                        return Err(CliError::incomplete(info, e));
                    }
                }
            }
        }

        Ok(Some(info))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> GbifResolver {
        let mut config = Config::new().unwrap();
        config.gbif_url = server.uri();
        config.request_delay_ms = 0;
        GbifResolver::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_match_with_vernacular_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/species/match"))
            .and(query_param("name", "Myotis myotis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "usageKey": 2432582, "matchType": "EXACT", "rank": "SPECIES",
                "canonicalName": "Myotis myotis", "order": "Chiroptera", "class": "Mammalia"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/species/2432582/vernacularNames"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"vernacularName": "Greater mouse-eared bat", "language": "eng"}]
            })))
            .mount(&server)
            .await;

        let query = TaxonQuery::new(51298, Some("Myotis myotis".to_string()));
        let info = resolver_for(&server).lookup(&query).await.unwrap().unwrap();
        assert_eq!(info.species.as_deref(), Some("Myotis myotis"));
        assert_eq!(info.order.as_deref(), Some("Chiroptera"));
        assert_eq!(info.common_name.as_deref(), Some("Greater mouse-eared bat"));
    }

    #[tokio::test]
    async fn test_higher_rank_match_keeps_species_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/species/match"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "usageKey": 2432416, "matchType": "HIGHERRANK", "rank": "GENUS",
                "canonicalName": "Myotis", "order": "Chiroptera", "class": "Mammalia"
            })))
            .mount(&server)
            .await;

        let mut query = TaxonQuery::new(1, Some("Myotis novus".to_string()));
        query.common_name = Some("New bat".to_string());
        let info = resolver_for(&server).lookup(&query).await.unwrap().unwrap();
        assert_eq!(info.species, None);
        assert_eq!(info.class.as_deref(), Some("Mammalia"));
        assert_eq!(info.common_name, None);
    }

    #[tokio::test]
    async fn test_failed_vernacular_fetch_keeps_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/species/match"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "usageKey": 2432582, "matchType": "EXACT", "rank": "SPECIES",
                "canonicalName": "Myotis myotis", "order": "Chiroptera", "class": "Mammalia"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/species/2432582/vernacularNames"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let query = TaxonQuery::new(51298, Some("Myotis myotis".to_string()));
        let err = resolver_for(&server).lookup(&query).await.unwrap_err();
        let CliError::Incomplete { found, .. } = err else {
            panic!("expected an incomplete answer");
        };
        assert_eq!(found.species.as_deref(), Some("Myotis myotis"));
        assert_eq!(found.order.as_deref(), Some("Chiroptera"));
        assert_eq!(found.class.as_deref(), Some("Mammalia"));
        assert_eq!(found.common_name, None);
    }

    #[tokio::test]
    async fn test_no_name_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let result = resolver_for(&server).lookup(&TaxonQuery::new(1, None)).await.unwrap();
        assert!(result.is_none());
    }
}
