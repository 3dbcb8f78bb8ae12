//! Static site output
//!
//! Renders `index.html` from an embedded Handlebars template and writes the
//! dataset next to it:
//!
//! ```text
//! public/
//! ├── index.html
//! ├── data/
//! │   ├── studies.json
//! │   └── references.bib
//! └── ...            (contents of static_dir)
//! ```

use crate::api::endpoints;
use crate::citations::write_bibliography;
use crate::error::Result;
use crate::project::{Project, SiteMetadata};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use wildmeth_common::types::{Catalog, EnrichedStudy, UNKNOWN};

const INDEX_TEMPLATE: &str = include_str!("templates/index.hbs");
const STYLE: &str = include_str!("assets/style.css");
const SCRIPT: &str = include_str!("assets/filter.js");

/// Files written by [`render_site`]
#[derive(Debug, Clone)]
pub struct SiteOutput {
    pub index: PathBuf,
    pub studies_json: PathBuf,
    pub references: PathBuf,
    pub citations_written: usize,
    pub static_files: usize,
}

#[derive(Serialize)]
struct Summary {
    studies: usize,
    species: usize,
    orders: usize,
    samples: u64,
}

#[derive(Serialize)]
struct Row<'a> {
    doi: &'a str,
    doi_url: String,
    species: &'a str,
    common_name: &'a str,
    order: &'a str,
    class: &'a str,
    method: &'a str,
    sample_size: Option<u32>,
    tissue: Option<&'a str>,
    data_url: Option<&'a str>,
    citation_title: Option<&'a str>,
    reference: Option<String>,
    has_bibtex: bool,
    search: String,
}

impl<'a> Row<'a> {
    fn new(entry: &'a EnrichedStudy) -> Self {
        let study = &entry.study;
        let taxonomy = &entry.taxonomy;
        let citation = entry.citation.as_ref();

        let reference = citation.and_then(|c| {
            let parts: Vec<&str> = [c.authors.as_deref(), c.year.as_deref(), c.journal.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            (!parts.is_empty()).then(|| parts.join(" · "))
        });

        let search = [
            Some(taxonomy.species_or_unknown()),
            Some(taxonomy.common_name_or_unknown()),
            Some(study.doi.as_str()),
            study.tissue.as_deref(),
            citation.and_then(|c| c.title.as_deref()),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

        Self {
            doi: &study.doi,
            doi_url: endpoints::doi_link(&study.doi),
            species: taxonomy.species_or_unknown(),
            common_name: taxonomy.common_name_or_unknown(),
            order: taxonomy.order_or_unknown(),
            class: taxonomy.class_or_unknown(),
            method: &study.method,
            sample_size: study.sample_size,
            tissue: study.tissue.as_deref(),
            data_url: study.data_url.as_deref(),
            citation_title: citation.and_then(|c| c.title.as_deref()),
            reference,
            has_bibtex: citation.is_some(),
            search,
        }
    }
}

#[derive(Serialize)]
struct Page<'a> {
    title: &'a str,
    description: Option<&'a str>,
    canonical_url: Option<&'a str>,
    generated_at: String,
    summary: Summary,
    classes: Vec<&'a str>,
    orders: Vec<&'a str>,
    methods: Vec<&'a str>,
    rows: Vec<Row<'a>>,
    has_references: bool,
    catalog_json: String,
    style: &'static str,
    script: &'static str,
}

/// Sorted distinct values, with "Unknown" last when any entry lacks one
fn filter_options<'a, F>(catalog: &'a Catalog, field: F) -> Vec<&'a str>
where
    F: Fn(&'a EnrichedStudy) -> Option<&'a str> + Copy,
{
    let mut values = catalog.distinct(field);
    if catalog.studies.iter().any(|s| field(s).is_none()) {
        values.push(UNKNOWN);
    }
    values
}

/// Catalog JSON safe to place inside a `<script>` element
pub fn embed_json(catalog: &Catalog) -> Result<String> {
    let json = serde_json::to_string(catalog)?;
    Ok(json.replace("</", "<\\/"))
}

/// Renders the index page
pub struct SiteRenderer {
    handlebars: Handlebars<'static>,
}

impl SiteRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_template_string("index", INDEX_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn render_index(&self, catalog: &Catalog, site: &SiteMetadata) -> Result<String> {
        let page = Page {
            title: &site.title,
            description: site.description.as_deref(),
            canonical_url: site.base_url.as_deref(),
            generated_at: catalog.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            summary: Summary {
                studies: catalog.studies.len(),
                species: catalog.species_count(),
                orders: catalog.order_count(),
                samples: catalog.total_samples(),
            },
            classes: filter_options(catalog, |s| s.taxonomy.class.as_deref()),
            orders: filter_options(catalog, |s| s.taxonomy.order.as_deref()),
            methods: catalog.distinct(|s| Some(s.study.method.as_str())),
            rows: catalog.studies.iter().map(Row::new).collect(),
            has_references: catalog.studies.iter().any(|s| s.citation.is_some()),
            catalog_json: embed_json(catalog)?,
            style: STYLE,
            script: SCRIPT,
        };

        Ok(self.handlebars.render("index", &page)?)
    }
}

/// Write the full site for `catalog` into `output_dir`
pub fn render_site(catalog: &Catalog, project: &Project, output_dir: &Path) -> Result<SiteOutput> {
    let data_dir = output_dir.join("data");
    std::fs::create_dir_all(&data_dir)?;

    let static_files = match project.static_path() {
        Some(dir) if dir.is_dir() => copy_static(&dir, output_dir)?,
        Some(dir) => {
            debug!(path = %dir.display(), "static_dir does not exist, skipping");
            0
        },
        None => 0,
    };

    let index = output_dir.join("index.html");
    let html = SiteRenderer::new()?.render_index(catalog, &project.site)?;
    std::fs::write(&index, html)?;

    let studies_json = data_dir.join("studies.json");
    std::fs::write(&studies_json, serde_json::to_string_pretty(catalog)?)?;

    let references = data_dir.join("references.bib");
    let citations_written =
        write_bibliography(&references, catalog.studies.iter().filter_map(|s| s.citation.as_ref()))?;

    info!(
        path = %output_dir.display(),
        studies = catalog.studies.len(),
        citations = citations_written,
        static_files,
        "Site written"
    );

    Ok(SiteOutput {
        index,
        studies_json,
        references,
        citations_written,
        static_files,
    })
}

/// Copy a directory tree into `dest`. Returns the number of files copied.
pub fn copy_static(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(rel) if !rel.as_os_str().is_empty() => rel,
            _ => continue,
        };
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            copied += 1;
        }
    }

    debug!(from = %src.display(), files = copied, "Copied static files");
    Ok(copied)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::citations::citation_from_bibtex;
    use tempfile::TempDir;
    use wildmeth_common::types::{CitationFormat, Study, TaxonomyInfo, TaxonomySource};

    fn entry(doi: &str, taxid: u32, species: Option<&str>, order: Option<&str>) -> EnrichedStudy {
        let mut taxonomy = TaxonomyInfo::unresolved(taxid);
        taxonomy.species = species.map(str::to_string);
        taxonomy.order = order.map(str::to_string);
        taxonomy.class = order.map(|_| "Mammalia".to_string());
        taxonomy.source = TaxonomySource::Ncbi;

        EnrichedStudy {
            study: Study {
                doi: doi.to_string(),
                taxid,
                sample_size: Some(12),
                method: "RRBS".to_string(),
                data_url: Some("https://example.org/data".to_string()),
                tissue: Some("blood".to_string()),
                species_hint: None,
                notes: None,
            },
            taxonomy,
            citation: None,
        }
    }

    fn sample_catalog() -> Catalog {
        let mut bat = entry("10.1/bat", 9407, Some("Rhinolophus ferrumequinum"), Some("Chiroptera"));
        bat.citation = Some(citation_from_bibtex(
            "10.1/bat",
            "@article{bat, title={Bats </script><script>alert(1)</script>}, year={2020}}",
            CitationFormat::Bibtex,
        ));
        let unknown = entry("10.1/unknown", 4242, None, None);
        Catalog::new(vec![unknown, bat])
    }

    #[test]
    fn test_embed_json_escapes_closing_tags() {
        let json = embed_json(&sample_catalog()).unwrap();
        assert!(!json.contains("</script>"));
        assert!(json.contains("<\\/script>"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["studies"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_render_index_contents() {
        let catalog = sample_catalog();
        let html = SiteRenderer::new()
            .unwrap()
            .render_index(&catalog, &Project::new("Bat clocks").site)
            .unwrap();

        assert!(html.contains("<title>Bat clocks</title>"));
        assert!(html.contains("<em>Rhinolophus ferrumequinum</em>"));
        assert!(html.contains(r#"href="https://doi.org/10.1/bat""#));
        assert!(html.contains(r#"<option value="Chiroptera">Chiroptera</option>"#));
        assert!(html.contains(r#"<option value="Unknown">Unknown</option>"#));
        assert!(html.contains(r#"id="catalog-data""#));
        assert!(html.contains(r#"class="copy-bibtex" data-doi="10.1/bat""#));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_render_site_writes_files_and_static_assets() {
        let temp = TempDir::new().unwrap();
        let project_path = temp.path().join("wildmeth.yml");
        let mut project = Project::new("Site");
        project.static_dir = Some(PathBuf::from("static"));
        project.save(&project_path).unwrap();
        std::fs::create_dir_all(temp.path().join("static/img")).unwrap();
        std::fs::write(temp.path().join("static/CNAME"), "meth.example.org").unwrap();
        std::fs::write(temp.path().join("static/img/logo.svg"), "<svg/>").unwrap();

        let project = Project::load(&project_path).unwrap();
        let output = project.output_path();
        let result = render_site(&sample_catalog(), &project, &output).unwrap();

        assert!(result.index.exists());
        assert_eq!(result.citations_written, 1);
        assert_eq!(result.static_files, 2);
        assert!(output.join("img/logo.svg").exists());

        let studies: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(result.studies_json).unwrap()).unwrap();
        assert_eq!(studies["studies"][0]["doi"], "10.1/bat");

        let bib = std::fs::read_to_string(result.references).unwrap();
        assert!(bib.starts_with("@article{bat,"));
    }

    #[test]
    fn test_empty_catalog_renders() {
        let html = SiteRenderer::new()
            .unwrap()
            .render_index(&Catalog::new(Vec::new()), &Project::default().site)
            .unwrap();
        assert!(html.contains("No studies yet."));
    }
}
