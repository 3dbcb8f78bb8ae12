//! Shared HTTP plumbing for the external services
//!
//! Every service client owns one [`HttpClient`]. It carries the configured
//! timeout and User-Agent, and spaces requests out by the configured delay so a
//! sequential enrichment run stays under the services' rate limits.

use crate::config::Config;
use crate::error::{CliError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace};

/// HTTP client with pacing, shared by one service
pub struct HttpClient {
    client: Client,
    service: &'static str,
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpClient {
    /// Create a client for `service` using the timeout, User-Agent and delay from `config`
    pub fn new(service: &'static str, config: &Config) -> Result<Self> {
        Self::with_headers(service, config, HeaderMap::new())
    }

    /// Create a client that sends `headers` on every request
    pub fn with_headers(service: &'static str, config: &Config, headers: HeaderMap) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(config.user_agent())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            service,
            delay: config.request_delay(),
            last_request: Mutex::new(None),
        })
    }

    /// Wait until `delay` has passed since the previous request
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.delay {
                tokio::time::sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET `url`, returning the raw response whatever its status
    pub async fn get(&self, url: &str, accept: Option<&str>) -> Result<Response> {
        self.throttle().await;
        trace!(service = self.service, url, "GET");

        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, HeaderValue::from_str(accept).map_err(|e| {
                CliError::config(format!("invalid Accept header '{}': {}", accept, e))
            })?);
        }

        Ok(request.send().await?)
    }

    /// GET and decode JSON. A 404 is "no such record" and yields `None`.
    pub async fn get_json_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.get(url, Some("application/json")).await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            debug!(service = self.service, url, "Not found");
            return Ok(None);
        }

        if !status.is_success() {
            return Err(CliError::api(
                self.service,
                format!("HTTP {} for {}", status.as_u16(), url),
            ));
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str(&body).map_err(|e| {
            CliError::api(self.service, format!("unexpected response shape from {}: {}", url, e))
        })?;
        Ok(Some(parsed))
    }

    /// GET as text. Non-2xx statuses yield `None` so callers can fall back.
    pub async fn get_text_optional(&self, url: &str, accept: &str) -> Result<Option<String>> {
        let response = self.get(url, Some(accept)).await?;
        let status = response.status();

        if !status.is_success() {
            debug!(service = self.service, url, accept, status = status.as_u16(), "No content");
            return Ok(None);
        }

        Ok(Some(response.text().await?))
    }
}
