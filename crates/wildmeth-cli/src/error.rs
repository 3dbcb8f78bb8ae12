//! Error types for the wildmeth CLI
//!
//! Messages are user-facing: they say what went wrong and, where there is one,
//! what to run next.

use thiserror::Error;
use wildmeth_common::types::TaxonomyInfo;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// A remote service answered with something we could not use
    #[error("{service} error: {message}")]
    Api { service: &'static str, message: String },

    /// A lookup answered with some fields before a follow-up request failed
    #[error("Incomplete answer: {cause}")]
    Incomplete {
        found: Box<TaxonomyInfo>,
        #[source]
        cause: Box<CliError>,
    },

    /// Required file is missing
    #[error("File not found: '{0}'. Verify the path exists and you have read permissions.")]
    FileNotFound(String),

    /// Project file (wildmeth.yml) has invalid format or content
    #[error("Invalid project file (wildmeth.yml): {0}. Run 'wildmeth init' to create a valid one.")]
    InvalidProject(String),

    /// One or more study records failed validation
    #[error("{0} study record(s) failed validation. Run 'wildmeth validate' for details.")]
    InvalidStudies(usize),

    /// A study file could not be parsed
    #[error("Failed to read study file '{path}': {message}")]
    StudyFile { path: String, message: String },

    /// Cache operation failed
    #[error("Cache error: {0}. Try 'wildmeth cache clean' to reset the cache.")]
    Cache(String),

    /// Cache database operation failed
    #[error("Cache database error: {0}")]
    CacheDb(#[from] rusqlite::Error),

    /// Project directory already has a wildmeth.yml
    #[error("Project already initialized: {0}. Use --force to reinitialize.")]
    AlreadyInitialized(String),

    /// Site template failed to render
    #[error("Failed to render site: {0}")]
    Render(#[from] handlebars::RenderError),

    /// Site template failed to compile
    #[error("Invalid site template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("Network request failed: {0}. Check your internet connection.")]
    Http(#[from] reqwest::Error),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or wildmeth.yml.")]
    Config(String),

    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}. Check the file syntax at the indicated line/column.")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing failed
    #[error("Failed to parse JSON: {0}. Check the file syntax.")]
    JsonParse(#[from] serde_json::Error),

    /// Domain error from the common crate
    #[error(transparent)]
    Common(#[from] wildmeth_common::WildmethError),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create an API error for a named service
    pub fn api(service: &'static str, msg: impl Into<String>) -> Self {
        Self::Api {
            service,
            message: msg.into(),
        }
    }

    /// Wrap the fields already known with the error that cut the lookup short
    pub fn incomplete(found: TaxonomyInfo, cause: CliError) -> Self {
        Self::Incomplete {
            found: Box::new(found),
            cause: Box::new(cause),
        }
    }

    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid project error
    pub fn invalid_project(msg: impl Into<String>) -> Self {
        Self::InvalidProject(msg.into())
    }

    /// Create a study file error
    pub fn study_file(path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StudyFile {
            path: path.into(),
            message: msg.into(),
        }
    }
}

impl From<handlebars::TemplateError> for CliError {
    fn from(err: handlebars::TemplateError) -> Self {
        Self::Template(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_names_service() {
        let err = CliError::api("NCBI", "HTTP 500");
        assert_eq!(err.to_string(), "NCBI error: HTTP 500");
    }

    #[test]
    fn test_incomplete_reports_cause() {
        let err = CliError::incomplete(
            TaxonomyInfo::unresolved(9407),
            CliError::api("NCBI", "HTTP 503"),
        );
        assert_eq!(err.to_string(), "Incomplete answer: NCBI error: HTTP 503");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_studies_suggests_validate() {
        let err = CliError::InvalidStudies(3);
        assert!(err.to_string().contains("wildmeth validate"));
    }
}
