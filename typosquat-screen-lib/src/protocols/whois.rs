//! WHOIS protocol implementation for registration screening.
//!
//! Queries are plain RFC 3912 exchanges: open TCP port 43, send the query
//! line, read until the server closes the connection. The authoritative
//! server for a domain is discovered through the IANA referral for its TLD
//! unless a fixed server is configured.

use crate::error::ScreenError;
use crate::protocols::LookupClient;
use crate::types::{LookupKind, LookupResponse};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// IANA root WHOIS server, used for TLD referrals.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Standard WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Upper bound on a WHOIS response; registries never send more than a few KB.
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

/// WHOIS client for fetching registration records.
#[derive(Clone, Debug)]
pub struct WhoisClient {
    /// Timeout for each WHOIS exchange
    timeout: Duration,
    /// Fixed server; None means follow the IANA referral
    server: Option<String>,
    /// Port used for every exchange
    port: u16,
}

impl WhoisClient {
    /// Create a new WHOIS client with default settings.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            server: None,
            port: WHOIS_PORT,
        }
    }

    /// Create a new WHOIS client with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::new()
        }
    }

    /// Always query `server` instead of following IANA referrals.
    pub fn with_server<S: Into<String>>(mut self, server: S) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Use a non-standard port (test servers).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Fetch the raw WHOIS record for `domain`.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Lookup` when a server cannot be reached or the
    /// exchange fails, and `ScreenError::Timeout` when it takes too long.
    pub async fn fetch(&self, domain: &str) -> Result<String, ScreenError> {
        let server = match &self.server {
            Some(server) => server.clone(),
            None => self.discover_server(domain).await?,
        };

        tracing::debug!(domain, server = %server, "querying WHOIS");
        self.query(&server, domain, domain).await
    }

    /// Ask IANA which server is authoritative for the domain's TLD.
    ///
    /// Falls back to IANA itself when no referral is given.
    async fn discover_server(&self, domain: &str) -> Result<String, ScreenError> {
        let tld = extract_tld(domain)
            .ok_or_else(|| ScreenError::lookup(LookupKind::Whois, domain, "domain has no TLD"))?;

        let response = self.query(IANA_WHOIS_SERVER, tld, domain).await?;
        Ok(parse_iana_refer_response(&response).unwrap_or_else(|| IANA_WHOIS_SERVER.to_string()))
    }

    /// One query/response exchange with `server`.
    ///
    /// `domain` is the domain being screened, which differs from `query`
    /// during TLD referral discovery.
    async fn query(&self, server: &str, query: &str, domain: &str) -> Result<String, ScreenError> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{}\r\n", query).as_bytes()).await?;

            let mut body = Vec::new();
            stream.take(MAX_RESPONSE_BYTES).read_to_end(&mut body).await?;
            Ok::<_, std::io::Error>(body)
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(body)) => Ok(String::from_utf8_lossy(&body).into_owned()),
            Ok(Err(e)) => Err(ScreenError::lookup(
                LookupKind::Whois,
                domain,
                format!("query '{}' to {} failed: {}", query, server, e),
            )),
            Err(_) => Err(ScreenError::timeout(
                format!("WHOIS query to {}", server),
                self.timeout,
            )),
        }
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LookupClient for WhoisClient {
    fn kind(&self) -> LookupKind {
        LookupKind::Whois
    }

    async fn lookup(&self, domain: &str) -> Result<LookupResponse, ScreenError> {
        self.fetch(domain).await.map(LookupResponse::Text)
    }
}

/// Last label of a domain, without any trailing dot.
fn extract_tld(domain: &str) -> Option<&str> {
    domain
        .trim_end_matches('.')
        .rsplit('.')
        .next()
        .filter(|tld| !tld.is_empty())
}

/// Parse an IANA WHOIS response for the authoritative WHOIS server.
///
/// IANA uses either `refer:` or `whois:` for the server; `refer:` wins when
/// both are present.
///
/// ```text
/// whois:        whois.verisign-grs.com
/// refer:        whois.verisign-grs.com
/// ```
fn parse_iana_refer_response(response: &str) -> Option<String> {
    let mut whois_server = None;

    for line in response.lines() {
        let line_trimmed = line.trim();
        if let Some(server) = line_trimmed.strip_prefix("refer:") {
            let server = server.trim();
            if !server.is_empty() {
                return Some(server.to_string());
            }
        } else if let Some(server) = line_trimmed.strip_prefix("whois:") {
            let server = server.trim();
            if !server.is_empty() {
                whois_server = Some(server.to_string());
            }
        }
    }

    whois_server
}
