//! Lookup clients for screening domains.
//!
//! Each client wraps one network source (DNS, WHOIS, reputation API) and
//! returns the raw response for the classifier. Clients never classify and
//! never retry.

/// DNS A-record lookups against a fixed resolver
pub mod dns;

/// WHOIS protocol implementation (RFC 3912, TCP port 43)
pub mod whois;

/// Reputation API client
pub mod reputation;

use crate::error::ScreenError;
use crate::types::{LookupKind, LookupResponse};
use async_trait::async_trait;

pub use dns::DnsClient;
pub use reputation::ReputationClient;
pub use whois::WhoisClient;

/// A single lookup source.
///
/// Implementations are shared across all screening tasks, so they must be
/// cheap to call concurrently.
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Which lookup kind this client serves.
    fn kind(&self) -> LookupKind;

    /// Fetch the raw response for `domain`.
    async fn lookup(&self, domain: &str) -> Result<LookupResponse, ScreenError>;
}
