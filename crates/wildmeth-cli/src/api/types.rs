//! Response types of the external services
//!
//! The services are not consistent about number encoding or which optional
//! blocks they include, so most fields are optional and ids accept either a
//! JSON number or a numeric string.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Deserialize an id that may arrive as `9606` or `"9606"`
fn flex_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => Ok(s.trim().parse().ok()),
    }
}

// ============================================================================
// NCBI Datasets
// ============================================================================

/// Body of `GET /taxonomy/taxon/{ids}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NcbiTaxonomyResponse {
    #[serde(default)]
    pub taxonomy_nodes: Vec<NcbiTaxonomyNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NcbiTaxonomyNode {
    pub taxonomy: Option<NcbiTaxon>,
}

/// One taxon as reported by NCBI Datasets
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NcbiTaxon {
    #[serde(default, deserialize_with = "flex_id")]
    pub tax_id: Option<u64>,

    pub organism_name: Option<String>,

    pub common_name: Option<String>,

    /// Upper-case rank label, e.g. "SPECIES", "ORDER"
    pub rank: Option<String>,

    /// Ancestors, root first. Usually bare taxids, sometimes labeled nodes.
    #[serde(default)]
    pub lineage: Vec<LineageEntry>,

    /// Rank name -> ancestor, when the service includes it
    #[serde(default)]
    pub classification: Option<HashMap<String, RankedName>>,
}

/// One element of a lineage array
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LineageEntry {
    Id(u64),
    IdText(String),
    Node(LineageNode),
}

impl LineageEntry {
    /// The ancestor's taxid, if the entry carries one
    pub fn taxid(&self) -> Option<u64> {
        match self {
            LineageEntry::Id(id) => Some(*id),
            LineageEntry::IdText(s) => s.trim().parse().ok(),
            LineageEntry::Node(node) => node.tax_id,
        }
    }
}

/// A lineage element that already carries its name and rank
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineageNode {
    #[serde(default, alias = "id", deserialize_with = "flex_id")]
    pub tax_id: Option<u64>,

    #[serde(alias = "organism_name", alias = "scientific_name")]
    pub name: Option<String>,

    pub rank: Option<String>,
}

/// `{ "name": ..., "id": ... }` inside `classification`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RankedName {
    pub name: Option<String>,

    #[serde(default, deserialize_with = "flex_id")]
    pub id: Option<u64>,
}

// ============================================================================
// GBIF
// ============================================================================

/// Body of `GET /species/match`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GbifMatch {
    pub usage_key: Option<u64>,
    pub scientific_name: Option<String>,
    pub canonical_name: Option<String>,
    pub rank: Option<String>,
    pub match_type: Option<String>,
    pub confidence: Option<u32>,
    pub kingdom: Option<String>,
    pub phylum: Option<String>,
    #[serde(rename = "class")]
    pub class_name: Option<String>,
    pub order: Option<String>,
    pub family: Option<String>,
    pub genus: Option<String>,
    pub species: Option<String>,
}

impl GbifMatch {
    /// GBIF answers 200 with `matchType: NONE` when nothing matched
    pub fn is_match(&self) -> bool {
        !matches!(self.match_type.as_deref(), None | Some("NONE"))
    }

    /// Only species-level matches carry a usable species name
    pub fn is_species_match(&self) -> bool {
        self.is_match()
            && self.match_type.as_deref() != Some("HIGHERRANK")
            && matches!(self.rank.as_deref(), Some("SPECIES") | Some("SUBSPECIES"))
    }
}

/// Body of `GET /species/{key}/vernacularNames`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GbifVernacularPage {
    #[serde(default)]
    pub results: Vec<GbifVernacularName>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GbifVernacularName {
    pub vernacular_name: String,
    pub language: Option<String>,
}
