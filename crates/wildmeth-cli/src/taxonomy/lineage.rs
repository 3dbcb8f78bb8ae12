//! Lineage walk
//!
//! Finds the order and class of a taxon from its ancestor list. NCBI returns
//! the lineage either as bare taxids or as labeled nodes; bare ids are
//! labeled from a bulk lookup of the ancestors before walking.

use crate::api::types::{LineageEntry, NcbiTaxon, RankedName};
use std::collections::HashMap;

/// One ancestor with whatever labels are known for it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ancestor {
    pub taxid: Option<u64>,
    pub name: Option<String>,
    pub rank: Option<String>,
}

/// Result of walking a lineage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineageWalk {
    pub order: Option<String>,
    pub class: Option<String>,
    /// Ancestor names, root first
    pub names: Vec<String>,
}

/// Taxids in `lineage` that carry no name or rank yet
pub fn unlabeled_ids(lineage: &[LineageEntry]) -> Vec<u64> {
    lineage
        .iter()
        .filter(|entry| !matches!(entry, LineageEntry::Node(node) if node.rank.is_some()))
        .filter_map(LineageEntry::taxid)
        .collect()
}

/// Label every lineage entry, using `fetched` for the bare ids
pub fn label(lineage: &[LineageEntry], fetched: &[NcbiTaxon]) -> Vec<Ancestor> {
    let by_id: HashMap<u64, &NcbiTaxon> = fetched
        .iter()
        .filter_map(|taxon| taxon.tax_id.map(|id| (id, taxon)))
        .collect();

    lineage
        .iter()
        .map(|entry| {
            let mut ancestor = match entry {
                LineageEntry::Node(node) => Ancestor {
                    taxid: node.tax_id,
                    name: node.name.clone(),
                    rank: node.rank.clone(),
                },
                other => Ancestor {
                    taxid: other.taxid(),
                    ..Ancestor::default()
                },
            };

            if let Some(taxon) = ancestor.taxid.and_then(|id| by_id.get(&id)) {
                if ancestor.name.is_none() {
                    ancestor.name = taxon.organism_name.clone();
                }
                if ancestor.rank.is_none() {
                    ancestor.rank = taxon.rank.clone();
                }
            }
            ancestor
        })
        .collect()
}

/// Nearest ancestor with the given rank, scanning from the taxon toward the root
pub fn find_rank<'a>(ancestors: &'a [Ancestor], rank: &str) -> Option<&'a str> {
    ancestors
        .iter()
        .rev()
        .find(|a| a.rank.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(rank)))
        .and_then(|a| a.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Walk labeled ancestors for order and class
pub fn walk(ancestors: &[Ancestor]) -> LineageWalk {
    LineageWalk {
        order: find_rank(ancestors, "order").map(str::to_string),
        class: find_rank(ancestors, "class").map(str::to_string),
        names: ancestors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty() && *name != "root")
            .map(str::to_string)
            .collect(),
    }
}

/// Look up a rank in NCBI's `classification` map, ignoring key case
pub fn classified<'a>(
    classification: &'a HashMap<String, RankedName>,
    rank: &str,
) -> Option<&'a str> {
    classification
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(rank))
        .and_then(|(_, ranked)| ranked.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::api::types::LineageNode;
    use pretty_assertions::assert_eq;

    fn taxon(id: u64, name: &str, rank: &str) -> NcbiTaxon {
        NcbiTaxon {
            tax_id: Some(id),
            organism_name: Some(name.to_string()),
            rank: Some(rank.to_string()),
            ..NcbiTaxon::default()
        }
    }

    #[test]
    fn test_walk_bare_ids_with_fetched_ranks() {
        let lineage = vec![
            LineageEntry::Id(1),
            LineageEntry::Id(40674),
            LineageEntry::IdText("9397".to_string()),
            LineageEntry::Id(9431),
        ];
        assert_eq!(unlabeled_ids(&lineage), vec![1, 40674, 9397, 9431]);

        let fetched = vec![
            taxon(1, "root", "NO_RANK"),
            taxon(40674, "Mammalia", "CLASS"),
            taxon(9397, "Chiroptera", "ORDER"),
            taxon(9431, "Vespertilionidae", "FAMILY"),
        ];
        let walk = walk(&label(&lineage, &fetched));

        assert_eq!(walk.order.as_deref(), Some("Chiroptera"));
        assert_eq!(walk.class.as_deref(), Some("Mammalia"));
        assert_eq!(walk.names, vec!["Mammalia", "Chiroptera", "Vespertilionidae"]);
    }

    #[test]
    fn test_labeled_nodes_need_no_fetch() {
        let lineage = vec![
            LineageEntry::Node(LineageNode {
                tax_id: Some(8782),
                name: Some("Aves".to_string()),
                rank: Some("class".to_string()),
            }),
            LineageEntry::Node(LineageNode {
                tax_id: Some(8976),
                name: Some("Galliformes".to_string()),
                rank: Some("order".to_string()),
            }),
        ];
        assert!(unlabeled_ids(&lineage).is_empty());

        let walk = walk(&label(&lineage, &[]));
        assert_eq!(walk.order.as_deref(), Some("Galliformes"));
        assert_eq!(walk.class.as_deref(), Some("Aves"));
    }

    #[test]
    fn test_nearest_rank_wins() {
        let ancestors = vec![
            Ancestor { taxid: None, name: Some("Sarcopterygii".into()), rank: Some("CLASS".into()) },
            Ancestor { taxid: None, name: Some("Mammalia".into()), rank: Some("CLASS".into()) },
        ];
        assert_eq!(find_rank(&ancestors, "class"), Some("Mammalia"));
        assert_eq!(find_rank(&ancestors, "order"), None);
    }

    #[test]
    fn test_unfetched_ids_stay_unlabeled() {
        let lineage = vec![LineageEntry::Id(7742), LineageEntry::Id(40674)];
        let walk = walk(&label(&lineage, &[taxon(40674, "Mammalia", "CLASS")]));
        assert_eq!(walk.class.as_deref(), Some("Mammalia"));
        assert_eq!(walk.order, None);
        assert_eq!(walk.names, vec!["Mammalia"]);
    }

    #[test]
    fn test_classified_ignores_key_case() {
        let mut map = HashMap::new();
        map.insert(
            "ORDER".to_string(),
            RankedName { name: Some("Carnivora".to_string()), id: Some(33554) },
        );
        assert_eq!(classified(&map, "order"), Some("Carnivora"));
        assert_eq!(classified(&map, "class"), None);
    }
}
