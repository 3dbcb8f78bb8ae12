//! Project file handling (wildmeth.yml)
//!
//! The project file describes one catalog: its title, where the study records
//! live, where the site is written, and curator-supplied taxonomy overrides.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default project file name
pub const PROJECT_FILE: &str = "wildmeth.yml";

/// wildmeth project file (wildmeth.yml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Site metadata
    pub site: SiteMetadata,

    /// Study records: one file, or a directory of YAML/JSON files
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Output directory for the generated site
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Extra files copied verbatim into the output (images, CNAME, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,

    /// Curator corrections keyed by NCBI taxid
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<u32, TaxonOverride>,

    /// Directory the project file was loaded from
    #[serde(skip)]
    root: PathBuf,
}

/// Site metadata section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteMetadata {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Public URL of the deployed site, used for canonical links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Fields a curator can force for one taxid
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaxonOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
}

fn default_input() -> PathBuf {
    PathBuf::from("studies")
}

fn default_output() -> PathBuf {
    PathBuf::from("public")
}

impl Project {
    /// Create a new project with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            site: SiteMetadata {
                title: title.into(),
                description: None,
                base_url: None,
            },
            input: default_input(),
            output: default_output(),
            static_dir: None,
            overrides: BTreeMap::new(),
            root: PathBuf::from("."),
        }
    }

    /// Load a project from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CliError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let mut project: Project = serde_yaml::from_str(&content)
            .map_err(|e| CliError::invalid_project(format!("Failed to parse YAML: {}", e)))?;

        project.root = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        project.validate()?;

        Ok(project)
    }

    /// Save the project to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the project structure
    pub fn validate(&self) -> Result<()> {
        if self.site.title.trim().is_empty() {
            return Err(CliError::invalid_project("site.title cannot be empty"));
        }

        if self.input.as_os_str().is_empty() {
            return Err(CliError::invalid_project("input cannot be empty"));
        }

        if self.output.as_os_str().is_empty() {
            return Err(CliError::invalid_project("output cannot be empty"));
        }

        if let Some(taxid) = self.overrides.keys().find(|t| **t == 0) {
            return Err(CliError::invalid_project(format!(
                "override key {} is not a valid taxid",
                taxid
            )));
        }

        Ok(())
    }

    /// Study input path, resolved against the project directory
    pub fn input_path(&self) -> PathBuf {
        self.root.join(&self.input)
    }

    /// Output path, resolved against the project directory
    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output)
    }

    /// Static asset directory, resolved against the project directory
    pub fn static_path(&self) -> Option<PathBuf> {
        self.static_dir.as_ref().map(|dir| self.root.join(dir))
    }
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Wildlife DNA Methylation Studies")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_defaults() {
        let project = Project::default();
        assert_eq!(project.input, PathBuf::from("studies"));
        assert_eq!(project.output, PathBuf::from("public"));
        assert!(project.overrides.is_empty());
        assert!(project.validate().is_ok());
    }

    #[test]
    fn test_project_save_load_resolves_paths() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(PROJECT_FILE);

        let mut project = Project::new("Bats and friends");
        project.static_dir = Some(PathBuf::from("static"));
        project.overrides.insert(
            9407,
            TaxonOverride {
                common_name: Some("Greater horseshoe bat".to_string()),
                ..Default::default()
            },
        );
        project.save(&path).unwrap();

        let loaded = Project::load(&path).unwrap();
        assert_eq!(loaded.site, project.site);
        assert_eq!(loaded.overrides, project.overrides);
        assert_eq!(loaded.input_path(), temp.path().join("studies"));
        assert_eq!(loaded.output_path(), temp.path().join("public"));
        assert_eq!(loaded.static_path(), Some(temp.path().join("static")));
    }

    #[test]
    fn test_project_parses_integer_override_keys() {
        let yaml = r#"
site:
  title: Catalog
overrides:
  9823:
    common_name: Wild boar
"#;
        let project: Project = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            project.overrides[&9823].common_name.as_deref(),
            Some("Wild boar")
        );
    }

    #[test]
    fn test_project_validate_rejects_empty_title() {
        let project = Project::new("   ");
        assert!(matches!(project.validate(), Err(CliError::InvalidProject(_))));
    }

    #[test]
    fn test_project_load_missing_file() {
        let result = Project::load("/nonexistent/wildmeth.yml");
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}
