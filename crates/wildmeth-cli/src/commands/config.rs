//! `wildmeth config` command implementation

use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// Show the effective runtime configuration
pub async fn show() -> Result<()> {
    let config = Config::from_env()?;

    println!("{}", "wildmeth configuration:".cyan().bold());
    println!();
    for (key, value) in entries(&config) {
        println!("{:<18} {}", format!("{}:", key), value);
    }
    println!();
    println!("{}", "Environment Variables:".cyan());
    println!("  WILDMETH_CACHE_DIR          - Cache directory");
    println!("  WILDMETH_CACHE_TTL_DAYS     - Days before cached entries are refetched");
    println!("  WILDMETH_HTTP_TIMEOUT_SECS  - Per-request timeout");
    println!("  WILDMETH_REQUEST_DELAY_MS   - Pause between requests to one service");
    println!("  WILDMETH_NCBI_API_KEY       - NCBI API key");
    println!("  WILDMETH_CONTACT_EMAIL      - Contact address sent in the User-Agent");
    println!("  WILDMETH_NCBI_URL, WILDMETH_GBIF_URL, WILDMETH_DOI_URL, WILDMETH_CROSSREF_URL");

    Ok(())
}

fn entries(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("cache_dir", config.cache_dir.display().to_string()),
        ("cache_ttl_days", config.cache_ttl_days.to_string()),
        ("http_timeout_secs", config.http_timeout_secs.to_string()),
        ("request_delay_ms", config.request_delay_ms.to_string()),
        ("ncbi_url", config.ncbi_url.clone()),
        ("gbif_url", config.gbif_url.clone()),
        ("doi_url", config.doi_url.clone()),
        ("crossref_url", config.crossref_url.clone()),
        (
            "ncbi_api_key",
            if config.ncbi_api_key.is_some() { "(set)" } else { "(not set)" }.to_string(),
        ),
        (
            "contact_email",
            config.contact_email.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ]
}
