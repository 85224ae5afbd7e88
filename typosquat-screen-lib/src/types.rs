//! Core data types for typosquat screening.
//!
//! This module defines the candidate input records, lookup kinds, the status
//! a lookup is classified into, and the configuration of a screening run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Upstream resolver used for DNS lookups unless configured otherwise.
pub const DEFAULT_DNS_SERVER: &str = "8.8.8.8:53";

/// Base URL of the reputation service API.
pub const DEFAULT_REPUTATION_BASE_URL: &str = "https://www.virustotal.com";

/// A domain permutation produced by the external permutation tool.
///
/// Only the fields screening cares about are kept; everything else the tool
/// emits is ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateDomain {
    /// Permutation algorithm that produced this domain (e.g. "homoglyph")
    #[serde(default)]
    pub fuzzer: String,

    /// The fully qualified domain name to screen
    pub domain: String,

    /// A records already observed by the permutation tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_a: Option<Vec<String>>,

    /// AAAA records already observed by the permutation tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_aaaa: Option<Vec<String>>,
}

impl CandidateDomain {
    /// Build a candidate with only a domain name set.
    pub fn new<D: Into<String>>(domain: D) -> Self {
        Self {
            fuzzer: String::new(),
            domain: domain.into(),
            dns_a: None,
            dns_aaaa: None,
        }
    }
}

/// Which lookup source produced an outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LookupKind {
    /// A-record query against the upstream resolver
    Dns,
    /// WHOIS registration record
    Whois,
    /// Reputation service report
    Reputation,
}

impl LookupKind {
    /// All lookup kinds, in the order they are dispatched by default.
    pub const ALL: [LookupKind; 3] = [LookupKind::Dns, LookupKind::Whois, LookupKind::Reputation];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::Dns => "dns",
            LookupKind::Whois => "whois",
            LookupKind::Reputation => "reputation",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dns" => Ok(LookupKind::Dns),
            "whois" => Ok(LookupKind::Whois),
            "reputation" | "virustotal" | "vt" => Ok(LookupKind::Reputation),
            other => Err(format!(
                "unknown lookup kind '{}' (expected dns, whois or reputation)",
                other
            )),
        }
    }
}

/// Parse a comma-separated list of lookup kinds, dropping duplicates.
pub fn parse_lookup_kinds(input: &str) -> Result<Vec<LookupKind>, String> {
    let mut kinds = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind = part.parse::<LookupKind>()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Classification of a single lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    /// The domain exists (also the default when no signal matched)
    Registered,
    /// The lookup reported the domain as not registered
    Unregistered,
    /// The lookup carried a malicious or phishing signal
    Suspicious,
    /// The lookup itself failed
    Error,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Registered => "registered",
            DomainStatus::Unregistered => "unregistered",
            DomainStatus::Suspicious => "suspicious",
            DomainStatus::Error => "error",
        }
    }
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw successful response of a lookup client, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupResponse {
    /// Free text body (WHOIS record, reputation API response)
    Text(String),
    /// Resolved address records (DNS)
    Records(Vec<String>),
}

/// Classified result of one (domain, lookup kind) pair.
///
/// Created once by the classifier (or by the orchestrator for failed
/// lookups) and never modified afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LookupOutcome {
    /// The screened domain
    pub domain: String,

    /// Lookup source that produced this outcome
    pub kind: LookupKind,

    /// Classified status
    pub status: DomainStatus,

    /// Raw or sanitized response text backing the status
    pub evidence: String,
}

impl LookupOutcome {
    pub fn new<D: Into<String>, E: Into<String>>(
        domain: D,
        kind: LookupKind,
        status: DomainStatus,
        evidence: E,
    ) -> Self {
        Self {
            domain: domain.into(),
            kind,
            status,
            evidence: evidence.into(),
        }
    }
}

/// Reputation API credential.
///
/// `Debug` is redacted so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<K: Into<String>>(key: K) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Configuration for a screening run.
///
/// Passed explicitly into [`crate::Screener`]; nothing is read from global
/// state once a screener has been built.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    /// Lookup kinds dispatched for every candidate
    /// Default: dns, whois, reputation
    pub lookups: Vec<LookupKind>,

    /// Per-lookup timeout
    /// Default: 10 seconds
    pub timeout: Duration,

    /// Optional cap on in-flight lookups
    /// Default: None (one task per pair, unbounded)
    pub max_concurrency: Option<usize>,

    /// Upstream DNS resolver
    /// Default: 8.8.8.8:53
    pub dns_server: SocketAddr,

    /// Fixed WHOIS server; None follows the IANA referral per TLD
    pub whois_server: Option<String>,

    /// Base URL of the reputation API
    pub reputation_base_url: String,

    /// Reputation API key, required when the reputation lookup is enabled
    pub api_key: Option<ApiKey>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            lookups: LookupKind::ALL.to_vec(),
            timeout: Duration::from_secs(10),
            max_concurrency: None,
            dns_server: SocketAddr::from(([8, 8, 8, 8], 53)),
            whois_server: None,
            reputation_base_url: DEFAULT_REPUTATION_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

impl ScreenConfig {
    /// Set the lookup kinds to dispatch.
    pub fn with_lookups(mut self, lookups: Vec<LookupKind>) -> Self {
        self.lookups = lookups;
        self
    }

    /// Set the per-lookup timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Cap the number of in-flight lookups. Zero is treated as one.
    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit.max(1));
        self
    }

    pub fn with_dns_server(mut self, server: SocketAddr) -> Self {
        self.dns_server = server;
        self
    }

    pub fn with_whois_server<S: Into<String>>(mut self, server: S) -> Self {
        self.whois_server = Some(server.into());
        self
    }

    pub fn with_reputation_base_url<U: Into<String>>(mut self, url: U) -> Self {
        self.reputation_base_url = url.into();
        self
    }

    pub fn with_api_key<K: Into<String>>(mut self, key: K) -> Self {
        self.api_key = Some(ApiKey::new(key));
        self
    }
}
