//! `wildmeth validate` command implementation

use crate::dataset::{load_studies, validate_studies, Finding, Severity, ValidationReport};
use crate::error::{CliError, Result};
use crate::project::Project;
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::Path;

/// Load the study records and print every finding
pub async fn run(project_path: &Path) -> Result<()> {
    let project = Project::load(project_path)?;
    let input = project.input_path();
    let studies = load_studies(&input)?;
    let report = validate_studies(&studies);

    println!(
        "{} {} record(s) from {}",
        "Checked".cyan().bold(),
        studies.len(),
        input.display()
    );
    println!();

    print_report(&report);

    let failed = failed_records(&report);
    if failed > 0 {
        return Err(CliError::InvalidStudies(failed));
    }

    let warnings = report.warnings().count();
    if warnings == 0 {
        println!("{} All records are valid", "✓".green());
    } else {
        println!("{} All records are valid ({} warning(s))", "✓".green(), warnings);
    }

    Ok(())
}

fn print_report(report: &ValidationReport) {
    if report.findings.is_empty() {
        return;
    }

    for finding in &report.findings {
        println!("{}", format_finding(finding));
    }
    println!();
}

fn format_finding(finding: &Finding) -> String {
    let label = match finding.severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    let doi = if finding.doi.is_empty() {
        "(no doi)"
    } else {
        finding.doi.as_str()
    };
    format!(
        "{} record {} [{}]: {}",
        label,
        finding.index + 1,
        doi,
        finding.message
    )
}

/// Number of distinct records with at least one error
fn failed_records(report: &ValidationReport) -> usize {
    report
        .errors()
        .map(|f| f.index)
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn project(studies: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        Project::new("Validate")
            .save(temp.path().join("wildmeth.yml"))
            .unwrap();
        fs::create_dir_all(temp.path().join("studies")).unwrap();
        fs::write(temp.path().join("studies/a.yml"), studies).unwrap();
        temp
    }

    #[tokio::test]
    async fn test_valid_records_pass() {
        let temp = project("- doi: 10.1/a\n  taxid: 9612\n  method: RRBS\n");
        run(&temp.path().join("wildmeth.yml")).await.unwrap();
    }

    #[tokio::test]
    async fn test_errors_counted_per_record() {
        let temp = project("- doi: nope\n  taxid: 0\n- doi: 10.1/b\n  taxid: 9612\n");
        let err = run(&temp.path().join("wildmeth.yml")).await.unwrap_err();
        assert!(matches!(err, CliError::InvalidStudies(1)));
    }

    #[test]
    fn test_format_finding() {
        colored::control::set_override(false);
        let line = format_finding(&Finding {
            index: 2,
            doi: String::new(),
            severity: Severity::Error,
            message: "taxid must be positive".to_string(),
        });
        assert_eq!(line, "error record 3 [(no doi)]: taxid must be positive");
    }
}
