//! API endpoint URL builders
//!
//! Helper functions to construct the URLs of the external services.

/// Percent-encode a DOI path-segment by segment, keeping the `/` separators.
pub fn encode_doi(doi: &str) -> String {
    doi.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// NCBI Datasets taxonomy lookup for one or more taxids
pub fn ncbi_taxon_url(base_url: &str, taxids: &[u32]) -> String {
    let ids = taxids
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{}/taxonomy/taxon/{}", base_url, ids)
}

/// GBIF backbone name match
pub fn gbif_match_url(base_url: &str, name: &str) -> String {
    format!(
        "{}/species/match?name={}&verbose=false",
        base_url,
        urlencoding::encode(name)
    )
}

/// GBIF vernacular names for a usage key
pub fn gbif_vernacular_url(base_url: &str, usage_key: u64) -> String {
    format!("{}/species/{}/vernacularNames?limit=100", base_url, usage_key)
}

/// DOI resolver URL, used with content negotiation
pub fn doi_url(base_url: &str, doi: &str) -> String {
    format!("{}/{}", base_url, encode_doi(doi))
}

/// Crossref BibTeX transform
pub fn crossref_bibtex_url(base_url: &str, doi: &str) -> String {
    format!(
        "{}/works/{}/transform/application/x-bibtex",
        base_url,
        encode_doi(doi)
    )
}

/// Public link for a DOI, as shown on the site
pub fn doi_link(doi: &str) -> String {
    doi_url("https://doi.org", doi)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ncbi_taxon_url() {
        let url = ncbi_taxon_url("https://api.ncbi.nlm.nih.gov/datasets/v2", &[9823]);
        assert_eq!(url, "https://api.ncbi.nlm.nih.gov/datasets/v2/taxonomy/taxon/9823");

        let bulk = ncbi_taxon_url("http://localhost", &[1, 131567, 2759]);
        assert_eq!(bulk, "http://localhost/taxonomy/taxon/1,131567,2759");
    }

    #[test]
    fn test_gbif_match_url_encodes_name() {
        let url = gbif_match_url("https://api.gbif.org/v1", "Myotis myotis");
        assert_eq!(
            url,
            "https://api.gbif.org/v1/species/match?name=Myotis%20myotis&verbose=false"
        );
    }

    #[test]
    fn test_gbif_vernacular_url() {
        let url = gbif_vernacular_url("https://api.gbif.org/v1", 2432582);
        assert_eq!(
            url,
            "https://api.gbif.org/v1/species/2432582/vernacularNames?limit=100"
        );
    }

    #[test]
    fn test_doi_urls_keep_slashes() {
        assert_eq!(
            doi_url("https://doi.org", "10.1111/mec.16000"),
            "https://doi.org/10.1111/mec.16000"
        );
        assert_eq!(
            doi_link("10.1002/(SICI)1097-4636"),
            "https://doi.org/10.1002/%28SICI%291097-4636"
        );
        assert_eq!(
            crossref_bibtex_url("https://api.crossref.org", "10.1186/s13072-020-0343-3"),
            "https://api.crossref.org/works/10.1186/s13072-020-0343-3/transform/application/x-bibtex"
        );
    }
}
