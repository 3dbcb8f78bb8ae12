//! NCBI Datasets resolver

use super::lineage;
use super::{TaxonQuery, TaxonomyResolver};
use crate::api::NcbiClient;
use crate::config::Config;
use crate::error::{CliError, Result};
use async_trait::async_trait;
use tracing::{debug, warn};
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

/// Resolves species, common name, order and class from NCBI Taxonomy
pub struct NcbiResolver {
    client: NcbiClient,
}

impl NcbiResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: NcbiClient::new(config)?,
        })
    }
}

#[async_trait]
impl TaxonomyResolver for NcbiResolver {
    fn source(&self) -> TaxonomySource {
        TaxonomySource::Ncbi
    }

    async fn lookup(&self, query: &TaxonQuery) -> Result<Option<TaxonomyInfo>> {
        let Some(taxon) = self.client.taxon(query.taxid).await? else {
            debug!(taxid = query.taxid, "NCBI has no record");
            return Ok(None);
        };

        let mut info = TaxonomyInfo::unresolved(query.taxid);
        info.source = TaxonomySource::Ncbi;
        info.species = taxon.organism_name.clone();
        info.common_name = taxon.common_name.clone();

        if let Some(ref classification) = taxon.classification {
            info.order = lineage::classified(classification, "order").map(str::to_string);
            info.class = lineage::classified(classification, "class").map(str::to_string);
        }

        let needs_walk = info.order.is_none() || info.class.is_none();
        let unlabeled = lineage::unlabeled_ids(&taxon.lineage);

        let mut walk_error = None;
        let fetched = if needs_walk && !unlabeled.is_empty() {
            debug!(taxid = query.taxid, ancestors = unlabeled.len(), "Fetching lineage ranks");
            match self.client.taxa(&unlabeled).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(taxid = query.taxid, error = %e, "Lineage ranks unavailable, keeping taxon record");
                    walk_error = Some(e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let walk = lineage::walk(&lineage::label(&taxon.lineage, &fetched));
        if info.order.is_none() {
            info.order = walk.order;
        }
        if info.class.is_none() {
            info.class = walk.class;
        }
        info.lineage = walk.names;

        match walk_error {
            Some(e) => Err(CliError::incomplete(info, e)),
            None => Ok(Some(info)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolver_for(server: &MockServer) -> NcbiResolver {
        let mut config = Config::new().unwrap();
        config.ncbi_url = server.uri();
        config.request_delay_ms = 0;
        NcbiResolver::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_classification_map_skips_walk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taxonomy/taxon/9627"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taxonomy_nodes": [{"taxonomy": {
                    "tax_id": 9627,
                    "organism_name": "Vulpes vulpes",
                    "common_name": "red fox",
                    "lineage": [1, 40674, 33554],
                    "classification": {
                        "order": {"name": "Carnivora", "id": 33554},
                        "class": {"name": "Mammalia", "id": 40674}
                    }
                }}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = resolver_for(&server)
            .lookup(&TaxonQuery::new(9627, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.order.as_deref(), Some("Carnivora"));
        assert_eq!(info.class.as_deref(), Some("Mammalia"));
        assert_eq!(info.common_name.as_deref(), Some("red fox"));
        assert_eq!(info.source, TaxonomySource::Ncbi);
    }

    #[tokio::test]
    async fn test_lineage_walk_fetches_ancestors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taxonomy/taxon/9407"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taxonomy_nodes": [{"taxonomy": {
                    "tax_id": 9407,
                    "organism_name": "Rhinolophus ferrumequinum",
                    "lineage": [40674, 9397]
                }}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/taxonomy/taxon/40674,9397"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taxonomy_nodes": [
                    {"taxonomy": {"tax_id": 40674, "organism_name": "Mammalia", "rank": "CLASS"}},
                    {"taxonomy": {"tax_id": 9397, "organism_name": "Chiroptera", "rank": "ORDER"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info = resolver_for(&server)
            .lookup(&TaxonQuery::new(9407, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.order.as_deref(), Some("Chiroptera"));
        assert_eq!(info.class.as_deref(), Some("Mammalia"));
        assert_eq!(info.lineage, vec!["Mammalia", "Chiroptera"]);
        assert_eq!(info.common_name, None);
    }

    #[tokio::test]
    async fn test_failed_ancestor_fetch_keeps_taxon_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/taxonomy/taxon/9407"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "taxonomy_nodes": [{"taxonomy": {
                    "tax_id": 9407,
                    "organism_name": "Rhinolophus ferrumequinum",
                    "common_name": "greater horseshoe bat",
                    "lineage": [40674, 9397]
                }}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/taxonomy/taxon/40674,9397"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = resolver_for(&server)
            .lookup(&TaxonQuery::new(9407, None))
            .await
            .unwrap_err();
        let CliError::Incomplete { found, cause } = err else {
            panic!("expected an incomplete answer");
        };
        assert_eq!(found.species.as_deref(), Some("Rhinolophus ferrumequinum"));
        assert_eq!(found.common_name.as_deref(), Some("greater horseshoe bat"));
        assert_eq!(found.source, TaxonomySource::Ncbi);
        assert_eq!(found.order, None);
        assert!(matches!(*cause, CliError::Api { service: "NCBI", .. }));
    }

    #[tokio::test]
    async fn test_not_found_is_no_answer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = resolver_for(&server).lookup(&TaxonQuery::new(1, None)).await.unwrap();
        assert!(result.is_none());
    }
}
