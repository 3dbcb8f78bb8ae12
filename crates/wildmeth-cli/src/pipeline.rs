//! Build orchestration
//!
//! Project file -> study records -> taxonomy -> citations -> site. Every
//! command that needs part of this chain goes through [`Pipeline`] so the
//! steps behave the same whether run alone or as a full build.

use crate::citations::CitationFetcher;
use crate::config::Config;
use crate::dataset::{load_studies, validate_studies, ValidationReport};
use crate::error::{CliError, Result};
use crate::progress;
use crate::project::Project;
use crate::site::{render_site, SiteOutput};
use crate::taxonomy::Enricher;
use indicatif::ProgressBar;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wildmeth_common::types::{Catalog, Citation, EnrichedStudy, Study, TaxonomyInfo, TaxonomySource};

/// Options for [`Pipeline::run`]
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub project_path: PathBuf,
    /// Skip NCBI, GBIF and DOI requests; use overrides, cache and keywords only
    pub offline: bool,
    pub skip_citations: bool,
    /// Overrides the project's output directory
    pub output: Option<PathBuf>,
    pub show_progress: bool,
}

/// Outcome of a build
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub records: usize,
    pub warnings: usize,
    /// Distinct taxa by the source that resolved them
    pub taxa_by_source: BTreeMap<TaxonomySource, usize>,
    pub citations_fetched: usize,
    pub citations_missing: usize,
    pub citations_skipped: bool,
    pub output_dir: PathBuf,
    pub static_files: usize,
}

impl BuildSummary {
    pub fn taxa_resolved(&self) -> usize {
        self.taxa_by_source
            .iter()
            .filter(|(source, _)| **source != TaxonomySource::Unresolved)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn taxa_unresolved(&self) -> usize {
        self.taxa_by_source
            .get(&TaxonomySource::Unresolved)
            .copied()
            .unwrap_or(0)
    }
}

/// Validated input for the later steps
#[derive(Debug)]
pub struct LoadedInput {
    pub project: Project,
    pub studies: Vec<Study>,
    pub report: ValidationReport,
}

pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load the project and its studies. Validation errors abort.
    pub fn load(&self, project_path: &Path) -> Result<LoadedInput> {
        let project = Project::load(project_path)?;
        let studies = load_studies(project.input_path())?;
        let report = validate_studies(&studies);

        for finding in report.warnings() {
            warn!(record = finding.index + 1, doi = %finding.doi, "{}", finding.message);
        }

        if !report.is_ok() {
            let failed: BTreeSet<usize> = report.errors().map(|f| f.index).collect();
            return Err(CliError::InvalidStudies(failed.len()));
        }

        info!(records = studies.len(), "Loaded study records");
        Ok(LoadedInput {
            project,
            studies,
            report,
        })
    }

    /// Attach taxonomy to every study. Citations are left empty.
    pub async fn enrich(
        &self,
        project: &Project,
        studies: Vec<Study>,
        offline: bool,
        show_progress: bool,
    ) -> Result<Vec<EnrichedStudy>> {
        let enricher = Enricher::from_config(&self.config, &project.overrides, offline)?;

        let distinct: BTreeSet<u32> = studies.iter().map(|s| s.taxid).collect();
        let pb = bar(show_progress, distinct.len(), "Taxonomy");
        let taxa = enricher
            .resolve_all(studies.iter().map(|s| (s.taxid, s.species_hint.as_deref())), &pb)
            .await;
        pb.finish_and_clear();

        Ok(studies
            .into_iter()
            .map(|study| {
                let taxonomy = taxa
                    .get(&study.taxid)
                    .cloned()
                    .unwrap_or_else(|| TaxonomyInfo::unresolved(study.taxid));
                EnrichedStudy {
                    study,
                    taxonomy,
                    citation: None,
                }
            })
            .collect())
    }

    /// Fetch citations for the given DOIs, keyed by lowercased DOI
    pub async fn citations<'a, I>(
        &self,
        dois: I,
        offline: bool,
        show_progress: bool,
    ) -> Result<BTreeMap<String, Citation>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let dois: Vec<&str> = dois.into_iter().collect();
        let distinct: BTreeSet<String> = dois.iter().map(|d| d.to_lowercase()).collect();

        let fetcher = CitationFetcher::from_config(&self.config, offline)?;
        let pb = bar(show_progress, distinct.len(), "Citations");
        let citations = fetcher.fetch_all(dois, &pb).await;
        pb.finish_and_clear();

        Ok(citations)
    }

    /// Run every step and write the site
    pub async fn run(&self, options: &BuildOptions) -> Result<BuildSummary> {
        let LoadedInput {
            project,
            studies,
            report,
        } = self.load(&options.project_path)?;

        let mut summary = BuildSummary {
            records: studies.len(),
            warnings: report.warnings().count(),
            citations_skipped: options.skip_citations,
            ..BuildSummary::default()
        };

        let mut enriched = self
            .enrich(&project, studies, options.offline, options.show_progress)
            .await?;

        let mut counted = BTreeSet::new();
        for entry in &enriched {
            if counted.insert(entry.study.taxid) {
                *summary.taxa_by_source.entry(entry.taxonomy.source).or_default() += 1;
            }
        }

        if !options.skip_citations {
            let citations = self
                .citations(
                    enriched.iter().map(|e| e.study.doi.as_str()),
                    options.offline,
                    options.show_progress,
                )
                .await?;

            let distinct: BTreeSet<String> =
                enriched.iter().map(|e| e.study.doi.to_lowercase()).collect();
            summary.citations_fetched = citations.len();
            summary.citations_missing = distinct.len().saturating_sub(citations.len());

            for entry in &mut enriched {
                entry.citation = citations.get(&entry.study.doi.to_lowercase()).cloned();
            }
        }

        let catalog = Catalog::new(enriched);
        let output_dir = options
            .output
            .clone()
            .unwrap_or_else(|| project.output_path());
        let SiteOutput { static_files, .. } = render_site(&catalog, &project, &output_dir)?;

        summary.output_dir = output_dir;
        summary.static_files = static_files;

        info!(
            records = summary.records,
            resolved = summary.taxa_resolved(),
            unresolved = summary.taxa_unresolved(),
            citations = summary.citations_fetched,
            "Build complete"
        );
        Ok(summary)
    }
}

fn bar(show: bool, total: usize, message: &str) -> ProgressBar {
    if show {
        progress::create_progress_bar(total as u64, message)
    } else {
        progress::hidden()
    }
}
