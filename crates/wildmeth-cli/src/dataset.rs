//! Loading and validating study records
//!
//! Curators keep one YAML/JSON file per study (or a few lists); this module
//! gathers them in a stable order and checks them before anything hits the
//! network.

use crate::error::{CliError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use wildmeth_common::types::Study;

/// A study file holds either one record or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum StudyFile {
    Many(Vec<Study>),
    One(Box<Study>),
}

impl StudyFile {
    fn into_vec(self) -> Vec<Study> {
        match self {
            StudyFile::Many(v) => v,
            StudyFile::One(s) => vec![*s],
        }
    }
}

/// Load every study record under `path`.
///
/// `path` may be a single file or a directory, which is walked recursively in
/// sorted order. Only `.yml`, `.yaml` and `.json` files are read.
pub fn load_studies(path: impl AsRef<Path>) -> Result<Vec<Study>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }

    let files: Vec<PathBuf> = if path.is_dir() {
        WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| study_format(p).is_some())
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    let mut studies = Vec::new();
    for file in files {
        let loaded = load_file(&file)?;
        debug!(file = %file.display(), records = loaded.len(), "Loaded study file");
        studies.extend(loaded);
    }

    for study in &mut studies {
        study.normalize();
    }

    Ok(studies)
}

#[derive(Clone, Copy)]
enum Format {
    Yaml,
    Json,
}

fn study_format(path: &Path) -> Option<Format> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "yml" | "yaml" => Some(Format::Yaml),
        "json" => Some(Format::Json),
        _ => None,
    }
}

fn load_file(path: &Path) -> Result<Vec<Study>> {
    let display = path.display().to_string();
    let format = study_format(path)
        .ok_or_else(|| CliError::study_file(&display, "expected a .yml, .yaml or .json file"))?;

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: StudyFile = match format {
        Format::Yaml => {
            serde_yaml::from_str(&content).map_err(|e| CliError::study_file(&display, e.to_string()))?
        },
        Format::Json => {
            serde_json::from_str(&content).map_err(|e| CliError::study_file(&display, e.to_string()))?
        },
    };

    Ok(parsed.into_vec())
}

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// One problem found in one record
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    /// Zero-based position in the loaded record list
    pub index: usize,
    pub doi: String,
    pub severity: Severity,
    pub message: String,
}

/// Everything wrong with a batch of records
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }
}

/// Check every record; does not stop at the first problem.
///
/// Duplicate DOIs are warnings because the same paper may legitimately cover
/// several species. A DOI shared across taxa is flagged once, on its second
/// taxon. Everything else is an error.
pub fn validate_studies(studies: &[Study]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashMap<(String, u32), usize> = HashMap::new();
    let mut first_by_doi: HashMap<String, (usize, u32)> = HashMap::new();
    let mut shared_dois: HashSet<String> = HashSet::new();

    for (index, study) in studies.iter().enumerate() {
        if let Err(e) = study.validate() {
            report.findings.push(Finding {
                index,
                doi: study.doi.clone(),
                severity: Severity::Error,
                message: e.to_string(),
            });
        }

        let doi = study.doi.to_ascii_lowercase();
        let key = (doi.clone(), study.taxid);
        if let Some(first) = seen.get(&key) {
            report.findings.push(Finding {
                index,
                doi: study.doi.clone(),
                severity: Severity::Warning,
                message: format!("duplicate of record #{} (same DOI and taxid)", first + 1),
            });
        } else {
            seen.insert(key, index);
            match first_by_doi.get(&doi) {
                Some(&(first, taxid)) if !shared_dois.contains(&doi) => {
                    report.findings.push(Finding {
                        index,
                        doi: study.doi.clone(),
                        severity: Severity::Warning,
                        message: format!(
                            "DOI also used by record #{} (taxid {}); check this is a multi-species paper",
                            first + 1,
                            taxid
                        ),
                    });
                    shared_dois.insert(doi);
                },
                Some(_) => {},
                None => {
                    first_by_doi.insert(doi, (index, study.taxid));
                },
            }
        }

        if study.sample_size == Some(0) {
            report.findings.push(Finding {
                index,
                doi: study.doi.clone(),
                severity: Severity::Warning,
                message: "sample_size is 0".to_string(),
            });
        }
    }

    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_directory_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        fs::create_dir_all(dir.join("bats")).unwrap();

        fs::write(
            dir.join("b_pig.yml"),
            "doi: doi:10.1111/mec.1\ntaxid: 9823\nmethod: RRBS\n",
        )
        .unwrap();
        fs::write(
            dir.join("a_list.json"),
            r#"[{"doi": "10.1/a", "taxid": 9606}, {"doi": "10.1/b", "taxid": "9913"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join("bats").join("myotis.yaml"),
            "doi: https://doi.org/10.1/bat\ntaxid: 109478\nn: 12\n",
        )
        .unwrap();
        fs::write(dir.join("README.md"), "not a study").unwrap();
        fs::write(dir.join("empty.yml"), "\n").unwrap();

        let studies = load_studies(dir).unwrap();
        let dois: Vec<_> = studies.iter().map(|s| s.doi.as_str()).collect();
        assert_eq!(dois, vec!["10.1/a", "10.1/b", "10.1111/mec.1", "10.1/bat"]);
        assert_eq!(studies[1].taxid, 9913);
        assert_eq!(studies[3].sample_size, Some(12));
        assert_eq!(studies[0].method, "Unknown");
    }

    #[test]
    fn test_load_single_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("studies.yaml");
        fs::write(
            &file,
            "- doi: 10.1/a\n  taxid: 9606\n- doi: 10.1/b\n  taxid: 10090\n",
        )
        .unwrap();

        assert_eq!(load_studies(&file).unwrap().len(), 2);
    }

    #[test]
    fn test_load_reports_bad_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("broken.yml");
        fs::write(&file, "doi: 10.1/a\ntaxid: [not, a, number]\n").unwrap();

        let err = load_studies(&file).unwrap_err();
        assert!(matches!(err, CliError::StudyFile { .. }));
        assert!(err.to_string().contains("broken.yml"));
    }

    #[test]
    fn test_load_missing_path() {
        assert!(matches!(
            load_studies("/nonexistent/studies"),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_validate_collects_all_findings() {
        let studies: Vec<Study> = serde_json::from_value(serde_json::json!([
            {"doi": "10.1/a", "taxid": 9606, "method": "WGBS"},
            {"doi": "nonsense", "taxid": 9606},
            {"doi": "10.1/c", "taxid": 0},
            {"doi": "10.1/A", "taxid": 9606, "sample_size": 0},
            {"doi": "10.1/d", "taxid": 9606, "data_url": "file:///tmp/x"}
        ]))
        .unwrap();

        let report = validate_studies(&studies);
        assert_eq!(report.error_count(), 3);
        assert_eq!(report.warnings().count(), 2);
        assert!(!report.is_ok());

        let dup = report.warnings().find(|f| f.index == 3).unwrap();
        assert!(dup.message.contains("#1"));
    }

    #[test]
    fn test_shared_doi_across_taxa_warns_once() {
        let studies: Vec<Study> = serde_json::from_value(serde_json::json!([
            {"doi": "10.1/multi", "taxid": 9627},
            {"doi": "10.1/MULTI", "taxid": 9615},
            {"doi": "10.1/multi", "taxid": 9612},
            {"doi": "10.1/other", "taxid": 9627}
        ]))
        .unwrap();

        let report = validate_studies(&studies);
        assert!(report.is_ok());
        let warnings: Vec<_> = report.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].index, 1);
        assert!(warnings[0].message.contains("#1 (taxid 9627)"));
    }

    #[test]
    fn test_validate_empty_is_ok() {
        assert!(validate_studies(&[]).is_ok());
    }
}
