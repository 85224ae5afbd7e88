//! DNS lookups for registration screening.
//!
//! A single A-record query is sent to one fixed upstream resolver. An answer
//! with no records (NXDOMAIN or NODATA) is a successful, empty response. Any
//! other failure, including SERVFAIL and REFUSED answers, is an error.

use crate::error::ScreenError;
use crate::protocols::LookupClient;
use crate::types::{LookupKind, LookupResponse};
use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::net::SocketAddr;
use std::time::Duration;

/// DNS client bound to a single upstream resolver.
#[derive(Clone)]
pub struct DnsClient {
    resolver: TokioAsyncResolver,
    server: SocketAddr,
}

impl DnsClient {
    /// Create a client that queries only `server`, with one attempt per lookup.
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        let name_servers = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], name_servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            server,
        }
    }

    /// The resolver this client queries.
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

/// Make the query name absolute so no search domain is ever appended.
fn absolute_name(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}

#[async_trait]
impl LookupClient for DnsClient {
    fn kind(&self) -> LookupKind {
        LookupKind::Dns
    }

    async fn lookup(&self, domain: &str) -> Result<LookupResponse, ScreenError> {
        match self.resolver.ipv4_lookup(absolute_name(domain)).await {
            Ok(lookup) => {
                let records = lookup.iter().map(|a| a.to_string()).collect();
                Ok(LookupResponse::Records(records))
            }
            Err(e) => match e.kind() {
                ResolveErrorKind::NoRecordsFound {
                    response_code: ResponseCode::NXDomain | ResponseCode::NoError,
                    ..
                } => Ok(LookupResponse::Records(Vec::new())),
                _ => Err(ScreenError::lookup(
                    LookupKind::Dns,
                    domain,
                    format!("query to {} failed: {}", self.server, e),
                )),
            },
        }
    }
}
