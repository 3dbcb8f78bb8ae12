//! API client module
//!
//! HTTP clients for the external services the catalog is enriched from:
//! NCBI Datasets (taxonomy), GBIF (taxonomy fallback, vernacular names),
//! doi.org and Crossref (BibTeX).

pub mod doi;
pub mod endpoints;
pub mod gbif;
pub mod http;
pub mod ncbi;
pub mod types;

pub use doi::DoiClient;
pub use gbif::GbifClient;
pub use http::HttpClient;
pub use ncbi::NcbiClient;
pub use types::*;
