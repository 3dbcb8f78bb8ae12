//! Keyword rules
//!
//! Last-resort classification from names alone: ancestor names ending in
//! `-formes` are orders, and common-name words such as "bat" or "salmon"
//! map to a known order and class.

use super::{TaxonQuery, TaxonomyResolver};
use crate::error::Result;
use async_trait::async_trait;
use wildmeth_common::types::{TaxonomyInfo, TaxonomySource};

/// Common-name word -> (order, class). Checked in table order.
const COMMON_NAME_KEYWORDS: &[(&str, Option<&str>, &str)] = &[
    ("bat", Some("Chiroptera"), "Mammalia"),
    ("whale", Some("Artiodactyla"), "Mammalia"),
    ("dolphin", Some("Artiodactyla"), "Mammalia"),
    ("porpoise", Some("Artiodactyla"), "Mammalia"),
    ("deer", Some("Artiodactyla"), "Mammalia"),
    ("boar", Some("Artiodactyla"), "Mammalia"),
    ("pig", Some("Artiodactyla"), "Mammalia"),
    ("sheep", Some("Artiodactyla"), "Mammalia"),
    ("goat", Some("Artiodactyla"), "Mammalia"),
    ("wolf", Some("Carnivora"), "Mammalia"),
    ("fox", Some("Carnivora"), "Mammalia"),
    ("bear", Some("Carnivora"), "Mammalia"),
    ("seal", Some("Carnivora"), "Mammalia"),
    ("otter", Some("Carnivora"), "Mammalia"),
    ("mouse", Some("Rodentia"), "Mammalia"),
    ("rat", Some("Rodentia"), "Mammalia"),
    ("vole", Some("Rodentia"), "Mammalia"),
    ("squirrel", Some("Rodentia"), "Mammalia"),
    ("macaque", Some("Primates"), "Mammalia"),
    ("monkey", Some("Primates"), "Mammalia"),
    ("chimpanzee", Some("Primates"), "Mammalia"),
    ("lemur", Some("Primates"), "Mammalia"),
    ("salmon", Some("Salmoniformes"), "Actinopteri"),
    ("trout", Some("Salmoniformes"), "Actinopteri"),
    ("chicken", Some("Galliformes"), "Aves"),
    ("grouse", Some("Galliformes"), "Aves"),
    ("junglefowl", Some("Galliformes"), "Aves"),
    ("duck", Some("Anseriformes"), "Aves"),
    ("goose", Some("Anseriformes"), "Aves"),
    ("sparrow", Some("Passeriformes"), "Aves"),
    ("finch", Some("Passeriformes"), "Aves"),
    ("tit", Some("Passeriformes"), "Aves"),
    ("frog", Some("Anura"), "Amphibia"),
    ("toad", Some("Anura"), "Amphibia"),
    ("turtle", Some("Testudines"), "Reptilia"),
    ("tortoise", Some("Testudines"), "Reptilia"),
    ("shark", None, "Chondrichthyes"),
    ("bird", None, "Aves"),
];

/// Pattern-based resolver over species, common name and lineage names
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordResolver;

impl KeywordResolver {
    pub fn new() -> Self {
        Self
    }

    /// Classify from the names known so far
    pub fn classify(&self, query: &TaxonQuery) -> Option<TaxonomyInfo> {
        let mut info = TaxonomyInfo::unresolved(query.taxid);
        info.source = TaxonomySource::Keyword;

        info.order = query
            .lineage
            .iter()
            .rev()
            .map(|name| name.trim())
            .find(|name| is_order_name(name))
            .map(str::to_string);

        let words: Vec<String> = [query.common_name.as_deref(), query.species.as_deref()]
            .into_iter()
            .flatten()
            .flat_map(words)
            .collect();

        if let Some((_, order, class)) = COMMON_NAME_KEYWORDS
            .iter()
            .find(|(keyword, _, _)| words.iter().any(|w| w == keyword))
        {
            if info.order.is_none() {
                info.order = order.map(str::to_string);
            }
            info.class = Some(class.to_string());
        }

        (info.order.is_some() || info.class.is_some()).then_some(info)
    }
}

#[async_trait]
impl TaxonomyResolver for KeywordResolver {
    fn source(&self) -> TaxonomySource {
        TaxonomySource::Keyword
    }

    async fn lookup(&self, query: &TaxonQuery) -> Result<Option<TaxonomyInfo>> {
        Ok(self.classify(query))
    }
}

/// Zoological orders of birds and fish end in "-formes"
fn is_order_name(name: &str) -> bool {
    name.len() > "formes".len()
        && !name.contains(' ')
        && name.ends_with("formes")
        && name.starts_with(|c: char| c.is_ascii_uppercase())
}

/// Lowercased words with a plural "s" dropped
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let lower = w.to_lowercase();
            match lower.strip_suffix('s') {
                Some(stem) if stem.len() > 2 && !lower.ends_with("ss") => stem.to_string(),
                _ => lower,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn query(common_name: Option<&str>, lineage: &[&str]) -> TaxonQuery {
        let mut q = TaxonQuery::new(1, None);
        q.common_name = common_name.map(str::to_string);
        q.lineage = lineage.iter().map(|s| s.to_string()).collect();
        q
    }

    #[test]
    fn test_formes_suffix_is_order() {
        let info = KeywordResolver::new()
            .classify(&query(None, &["Aves", "Neognathae", "Passeriformes", "Paridae"]))
            .unwrap();
        assert_eq!(info.order.as_deref(), Some("Passeriformes"));
        assert_eq!(info.class, None);
        assert_eq!(info.source, TaxonomySource::Keyword);
    }

    #[test]
    fn test_common_name_keyword() {
        let info = KeywordResolver::new()
            .classify(&query(Some("Greater Horseshoe Bat"), &[]))
            .unwrap();
        assert_eq!(info.order.as_deref(), Some("Chiroptera"));
        assert_eq!(info.class.as_deref(), Some("Mammalia"));
    }

    #[test]
    fn test_lineage_order_beats_keyword_order() {
        let info = KeywordResolver::new()
            .classify(&query(Some("Atlantic salmon"), &["Salmoniformes"]))
            .unwrap();
        assert_eq!(info.order.as_deref(), Some("Salmoniformes"));
        assert_eq!(info.class.as_deref(), Some("Actinopteri"));
    }

    #[test]
    fn test_plurals_and_partial_words() {
        assert_eq!(words("Fruit bats"), vec!["fruit", "bat"]);
        assert_eq!(words("grass"), vec!["grass"]);
        assert!(KeywordResolver::new().classify(&query(Some("Batfish"), &[])).is_none());
    }

    #[test]
    fn test_nothing_known() {
        assert!(KeywordResolver::new().classify(&query(None, &[])).is_none());
    }
}
