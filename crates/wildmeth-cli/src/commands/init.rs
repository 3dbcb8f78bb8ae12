//! `wildmeth init` command implementation
//!
//! Writes a starter `wildmeth.yml` and one example study file.

use crate::error::{CliError, Result};
use crate::project::Project;
use colored::Colorize;
use std::fs;
use std::path::Path;

const EXAMPLE_STUDIES: &str = r#"# One record per study. Required: doi, taxid.
- doi: 10.1111/mec.16000
  taxid: 9407
  sample_size: 40
  method: RRBS
  tissue: wing punch
  data_url: https://www.ncbi.nlm.nih.gov/geo/
"#;

/// Initialize a catalog at `project_path`
pub async fn run(project_path: &Path, force: bool) -> Result<()> {
    if project_path.exists() && !force {
        return Err(CliError::AlreadyInitialized(format!(
            "{} already exists",
            project_path.display()
        )));
    }

    let root = project_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root)?;

    let title = root
        .canonicalize()
        .ok()
        .and_then(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .unwrap_or_else(|| "Wildlife methylation studies".to_string());

    let project = Project::new(title.clone());
    project.save(project_path)?;

    let studies_dir = root.join(&project.input);
    fs::create_dir_all(&studies_dir)?;
    let example = studies_dir.join("example.yml");
    let wrote_example = !example.exists();
    if wrote_example {
        fs::write(&example, EXAMPLE_STUDIES)?;
    }

    println!("{} Initialized catalog: {}", "✓".green(), title.bold());
    println!("  Created: {}", project_path.display());
    if wrote_example {
        println!("  Created: {}", example.display());
    }
    println!();
    println!("Next: add study records, then run 'wildmeth build'.");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::dataset::{load_studies, validate_studies};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_valid_project() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wildmeth.yml");

        run(&path, false).await.unwrap();

        let project = Project::load(&path).unwrap();
        let studies = load_studies(project.input_path()).unwrap();
        assert_eq!(studies.len(), 1);
        assert!(validate_studies(&studies).is_ok());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wildmeth.yml");
        run(&path, false).await.unwrap();

        let err = run(&path, false).await.unwrap_err();
        assert!(matches!(err, CliError::AlreadyInitialized(_)));

        run(&path, true).await.unwrap();
    }

    #[tokio::test]
    async fn test_force_keeps_existing_studies() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wildmeth.yml");
        run(&path, false).await.unwrap();

        let example = temp.path().join("studies/example.yml");
        fs::write(&example, "- doi: 10.1/mine\n  taxid: 9612\n").unwrap();
        run(&path, true).await.unwrap();

        assert!(fs::read_to_string(&example).unwrap().contains("10.1/mine"));
    }
}
