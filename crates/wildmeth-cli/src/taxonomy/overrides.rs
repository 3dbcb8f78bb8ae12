//! Curated taxonomy overrides
//!
//! A short built-in table for taxa the services get wrong or leave empty,
//! merged with the `overrides:` section of the project file. Project entries
//! replace built-in ones for the same taxid.

use super::{TaxonQuery, TaxonomyResolver};
use crate::error::Result;
use crate::project::TaxonOverride;
use async_trait::async_trait;
use std::collections::BTreeMap;
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

/// taxid, species, order, class, common name
const BUILT_IN: &[(u32, &str, &str, &str, &str)] = &[
    (9612, "Canis lupus", "Carnivora", "Mammalia", "Gray wolf"),
    (9823, "Sus scrofa", "Artiodactyla", "Mammalia", "Wild boar"),
    (9739, "Tursiops truncatus", "Artiodactyla", "Mammalia", "Common bottlenose dolphin"),
    (59463, "Myotis lucifugus", "Chiroptera", "Mammalia", "Little brown bat"),
    (9407, "Rhinolophus ferrumequinum", "Chiroptera", "Mammalia", "Greater horseshoe bat"),
    (8030, "Salmo salar", "Salmoniformes", "Actinopteri", "Atlantic salmon"),
    (9031, "Gallus gallus", "Galliformes", "Aves", "Red junglefowl"),
];

/// Override table as a resolver
#[derive(Debug, Clone, Default)]
pub struct OverrideResolver {
    table: BTreeMap<u32, TaxonOverride>,
}

impl OverrideResolver {
    /// Built-in table only
    pub fn built_in() -> Self {
        let table = BUILT_IN
            .iter()
            .map(|(taxid, species, order, class, common_name)| {
                (
                    *taxid,
                    TaxonOverride {
                        species: Some(species.to_string()),
                        order: Some(order.to_string()),
                        class: Some(class.to_string()),
                        common_name: Some(common_name.to_string()),
                    },
                )
            })
            .collect();
        Self { table }
    }

    /// Built-in table with the project's entries on top
    pub fn with_project(project: &BTreeMap<u32, TaxonOverride>) -> Self {
        let mut resolver = Self::built_in();
        for (taxid, entry) in project {
            resolver.table.insert(*taxid, entry.clone());
        }
        resolver
    }

    /// An empty table, for callers that want no curation at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, taxid: u32) -> Option<TaxonomyInfo> {
        self.table.get(&taxid).map(|entry| {
            let mut info = TaxonomyInfo::unresolved(taxid);
            info.fill_from(&TaxonomyInfo {
                taxid,
                species: entry.species.clone(),
                order: entry.order.clone(),
                class: entry.class.clone(),
                common_name: entry.common_name.clone(),
                source: TaxonomySource::Override,
                lineage: Vec::new(),
            });
            info
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait]
impl TaxonomyResolver for OverrideResolver {
    fn source(&self) -> TaxonomySource {
        TaxonomySource::Override
    }

    async fn lookup(&self, query: &TaxonQuery) -> Result<Option<TaxonomyInfo>> {
        Ok(self.get(query.taxid).filter(|info| info.source == TaxonomySource::Override))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_built_in_entries_are_complete() {
        let resolver = OverrideResolver::built_in();
        assert_eq!(resolver.len(), BUILT_IN.len());
        let boar = resolver.get(9823).unwrap();
        assert!(boar.is_complete());
        assert_eq!(boar.source, TaxonomySource::Override);
    }

    #[test]
    fn test_project_entry_replaces_built_in() {
        let mut project = BTreeMap::new();
        project.insert(
            9823,
            TaxonOverride {
                common_name: Some("Eurasian wild pig".to_string()),
                ..Default::default()
            },
        );
        let resolver = OverrideResolver::with_project(&project);

        let pig = resolver.get(9823).unwrap();
        assert_eq!(pig.common_name.as_deref(), Some("Eurasian wild pig"));
        assert_eq!(pig.species, None);
        assert!(!pig.is_complete());
    }

    #[tokio::test]
    async fn test_blank_override_yields_nothing() {
        let mut project = BTreeMap::new();
        project.insert(
            42,
            TaxonOverride {
                order: Some("  ".to_string()),
                ..Default::default()
            },
        );
        let resolver = OverrideResolver::with_project(&project);
        let query = TaxonQuery::new(42, None);
        assert!(resolver.lookup(&query).await.unwrap().is_none());
        assert!(resolver.lookup(&TaxonQuery::new(7, None)).await.unwrap().is_none());
    }
}
