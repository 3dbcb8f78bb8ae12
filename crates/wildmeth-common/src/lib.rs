//! wildmeth Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the wildmeth catalog generator.
//!
//! # Overview
//!
//! This crate provides functionality used by every wildmeth workspace member:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Types**: Study records, taxonomy records, citations and the enriched catalog
//! - **Logging**: Tracing subscriber bootstrap shared by all binaries
//!
//! # Example
//!
//! ```no_run
//! use wildmeth_common::types::normalize_doi;
//!
//! let doi = normalize_doi("https://doi.org/10.1111/mec.16000")?;
//! assert_eq!(doi, "10.1111/mec.16000");
//! # Ok::<(), wildmeth_common::WildmethError>(())
//! ```

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{Result, WildmethError};
