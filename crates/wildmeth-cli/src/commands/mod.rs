//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod build;
pub mod cache;
pub mod citations;
pub mod config;
pub mod enrich;
pub mod init;
pub mod lookup;
pub mod validate;
