//! Reputation API client.
//!
//! Fetches the domain report from the reputation service
//! (`GET {base}/api/v3/domains/{domain}`). The body is opaque to this client;
//! the classifier looks for signals in it.

use crate::error::ScreenError;
use crate::protocols::LookupClient;
use crate::types::{ApiKey, LookupKind, LookupResponse, DEFAULT_REPUTATION_BASE_URL};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-apikey";

/// HTTP client for the reputation service.
#[derive(Clone, Debug)]
pub struct ReputationClient {
    /// HTTP client for making API requests
    http_client: reqwest::Client,
    /// Service base URL, without trailing slash
    base_url: String,
    /// Credential sent with every request
    api_key: ApiKey,
}

impl ReputationClient {
    /// Create a client for the default service.
    pub fn new(api_key: ApiKey, timeout: Duration) -> Result<Self, ScreenError> {
        Self::with_base_url(api_key, timeout, DEFAULT_REPUTATION_BASE_URL)
    }

    /// Create a client for a specific base URL.
    pub fn with_base_url<U: Into<String>>(
        api_key: ApiKey,
        timeout: Duration,
        base_url: U,
    ) -> Result<Self, ScreenError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ScreenError::config(format!("Failed to create reputation HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// URL of the domain report.
    pub fn report_url(&self, domain: &str) -> String {
        format!("{}/api/v3/domains/{}", self.base_url, domain)
    }

    /// Fetch the report body for `domain`.
    ///
    /// 200 and 404 bodies are both returned: the service answers unknown
    /// domains with a 404 whose body says so.
    pub async fn fetch(&self, domain: &str) -> Result<String, ScreenError> {
        let url = self.report_url(domain);

        let response = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(|e| ScreenError::lookup(LookupKind::Reputation, domain, format!("request failed: {}", e)))?;

        let status = response.status();
        tracing::debug!(domain, %status, "reputation response");

        match status {
            StatusCode::OK | StatusCode::NOT_FOUND => response.text().await.map_err(|e| {
                ScreenError::lookup(
                    LookupKind::Reputation,
                    domain,
                    format!("failed to read response body: {}", e),
                )
            }),
            code => Err(ScreenError::lookup(
                LookupKind::Reputation,
                domain,
                format!("service returned HTTP {}", code.as_u16()),
            )),
        }
    }
}

#[async_trait]
impl LookupClient for ReputationClient {
    fn kind(&self) -> LookupKind {
        LookupKind::Reputation
    }

    async fn lookup(&self, domain: &str) -> Result<LookupResponse, ScreenError> {
        self.fetch(domain).await.map(LookupResponse::Text)
    }
}
