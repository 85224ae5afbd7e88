//! Main screening orchestrator.
//!
//! `Screener` owns one client per configured lookup kind and fans every
//! candidate out to all of them.

use crate::concurrent::ConcurrentProcessor;
use crate::error::ScreenError;
use crate::protocols::{DnsClient, LookupClient, ReputationClient, WhoisClient};
use crate::types::{CandidateDomain, LookupKind, LookupOutcome, ScreenConfig};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Screens candidate domains against the configured lookup sources.
///
/// # Example
///
/// ```rust,no_run
/// use typosquat_screen_lib::{CandidateDomain, LookupKind, ScreenConfig, Screener};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ScreenConfig::default().with_lookups(vec![LookupKind::Dns]);
///     let screener = Screener::new(config)?;
///
///     let candidates = vec![CandidateDomain::new("examp1e.com")];
///     let mut outcomes = screener.screen(&candidates);
///     while let Some(outcome) = outcomes.recv().await {
///         println!("{} [{}]: {}", outcome.domain, outcome.kind, outcome.status);
///     }
///     Ok(())
/// }
/// ```
pub struct Screener {
    /// Configuration this screener was built from
    config: ScreenConfig,
    /// One client per lookup kind, in dispatch order
    clients: Vec<Arc<dyn LookupClient>>,
    /// Task fan-out and result collection
    processor: ConcurrentProcessor,
}

impl Screener {
    /// Build a screener and its lookup clients from `config`.
    ///
    /// # Errors
    ///
    /// Returns `ScreenError::Config` if no lookup kinds are configured, or if
    /// the reputation lookup is enabled without an API key.
    pub fn new(config: ScreenConfig) -> Result<Self, ScreenError> {
        let mut clients: Vec<Arc<dyn LookupClient>> = Vec::with_capacity(config.lookups.len());

        for kind in &config.lookups {
            let client: Arc<dyn LookupClient> = match kind {
                LookupKind::Dns => Arc::new(DnsClient::new(config.dns_server, config.timeout)),
                LookupKind::Whois => {
                    let mut whois = WhoisClient::with_timeout(config.timeout);
                    if let Some(server) = &config.whois_server {
                        whois = whois.with_server(server.clone());
                    }
                    Arc::new(whois)
                }
                LookupKind::Reputation => {
                    let api_key = config.api_key.clone().ok_or_else(|| {
                        ScreenError::config(
                            "VIRUSTOTAL_API_KEY is required when the reputation lookup is enabled",
                        )
                    })?;
                    Arc::new(ReputationClient::with_base_url(
                        api_key,
                        config.timeout,
                        config.reputation_base_url.clone(),
                    )?)
                }
            };
            clients.push(client);
        }

        Self::with_clients(config, clients)
    }

    /// Build a screener around pre-built clients.
    ///
    /// The lookup kinds in `config` are replaced by the kinds of `clients`.
    pub fn with_clients(
        mut config: ScreenConfig,
        clients: Vec<Arc<dyn LookupClient>>,
    ) -> Result<Self, ScreenError> {
        if clients.is_empty() {
            return Err(ScreenError::config("at least one lookup kind must be enabled"));
        }

        let mut kinds: Vec<LookupKind> = Vec::with_capacity(clients.len());
        for client in &clients {
            if kinds.contains(&client.kind()) {
                return Err(ScreenError::config(format!(
                    "lookup kind '{}' configured more than once",
                    client.kind()
                )));
            }
            kinds.push(client.kind());
        }
        config.lookups = kinds;

        let processor = ConcurrentProcessor::new(config.max_concurrency, config.timeout);
        Ok(Self {
            config,
            clients,
            processor,
        })
    }

    /// Dispatch every (candidate, lookup kind) pair and return the outcome stream.
    ///
    /// Outcomes arrive in completion order. The receiver closes once all
    /// `candidates.len() * lookups().len()` outcomes have been delivered.
    /// Must be called from within a tokio runtime.
    pub fn screen(&self, candidates: &[CandidateDomain]) -> mpsc::Receiver<LookupOutcome> {
        let domains = candidates.iter().map(|c| c.domain.clone()).collect();
        self.processor.dispatch(domains, &self.clients)
    }

    /// Screen all candidates and collect every outcome.
    pub async fn screen_all(&self, candidates: &[CandidateDomain]) -> Vec<LookupOutcome> {
        let mut rx = self.screen(candidates);
        let mut outcomes = Vec::with_capacity(self.expected_outcomes(candidates.len()));
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Number of outcomes a run over `candidate_count` candidates produces.
    pub fn expected_outcomes(&self, candidate_count: usize) -> usize {
        candidate_count * self.clients.len()
    }

    /// Lookup kinds dispatched for each candidate.
    pub fn lookups(&self) -> &[LookupKind] {
        &self.config.lookups
    }

    /// The configuration for this screener.
    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DomainStatus, LookupResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fake client answering from a fixed function of the domain.
    struct FakeClient {
        kind: LookupKind,
        delay: Duration,
        respond: fn(&str) -> Result<LookupResponse, ScreenError>,
    }

    #[async_trait]
    impl LookupClient for FakeClient {
        fn kind(&self) -> LookupKind {
            self.kind
        }

        async fn lookup(&self, domain: &str) -> Result<LookupResponse, ScreenError> {
            tokio::time::sleep(self.delay).await;
            (self.respond)(domain)
        }
    }

    fn fake(kind: LookupKind, respond: fn(&str) -> Result<LookupResponse, ScreenError>) -> Arc<dyn LookupClient> {
        Arc::new(FakeClient {
            kind,
            delay: Duration::ZERO,
            respond,
        })
    }

    fn candidates(n: usize) -> Vec<CandidateDomain> {
        (0..n).map(|i| CandidateDomain::new(format!("examp{}e.com", i))).collect()
    }

    #[tokio::test]
    async fn test_emits_one_outcome_per_pair() {
        let screener = Screener::with_clients(
            ScreenConfig::default(),
            vec![
                fake(LookupKind::Dns, |_| Ok(LookupResponse::Records(vec!["1.2.3.4".into()]))),
                fake(LookupKind::Whois, |_| Ok(LookupResponse::Text("No match for domain".into()))),
                fake(LookupKind::Reputation, |_| Ok(LookupResponse::Text("{}".into()))),
            ],
        )
        .unwrap();

        let input = candidates(25);
        let outcomes = screener.screen_all(&input).await;
        assert_eq!(outcomes.len(), 75);
        assert_eq!(screener.expected_outcomes(input.len()), 75);

        let mut per_pair: HashMap<(String, LookupKind), usize> = HashMap::new();
        for outcome in &outcomes {
            *per_pair.entry((outcome.domain.clone(), outcome.kind)).or_default() += 1;
        }
        assert_eq!(per_pair.len(), 75);
        assert!(per_pair.values().all(|&count| count == 1));

        assert!(outcomes
            .iter()
            .filter(|o| o.kind == LookupKind::Whois)
            .all(|o| o.status == DomainStatus::Unregistered));
    }

    #[tokio::test]
    async fn test_empty_candidate_list_closes_channel() {
        let screener = Screener::with_clients(
            ScreenConfig::default(),
            vec![fake(LookupKind::Dns, |_| Ok(LookupResponse::Records(vec![])))],
        )
        .unwrap();

        let mut rx = screener.screen(&[]);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_lookup_becomes_error_outcome() {
        let screener = Screener::with_clients(
            ScreenConfig::default(),
            vec![fake(LookupKind::Reputation, |d| {
                Err(ScreenError::lookup(LookupKind::Reputation, d, "connection refused"))
            })],
        )
        .unwrap();

        let outcomes = screener.screen_all(&candidates(2)).await;
        assert_eq!(outcomes.len(), 2);
        for outcome in outcomes {
            assert_eq!(outcome.status, DomainStatus::Error);
            assert!(outcome.evidence.contains("connection refused"));
        }
    }

    #[tokio::test]
    async fn test_hung_lookup_times_out() {
        let slow: Arc<dyn LookupClient> = Arc::new(FakeClient {
            kind: LookupKind::Whois,
            delay: Duration::from_secs(60),
            respond: |_| Ok(LookupResponse::Text(String::new())),
        });
        let config = ScreenConfig::default().with_timeout(Duration::from_millis(50));
        let screener = Screener::with_clients(config, vec![slow]).unwrap();

        let outcomes = tokio::time::timeout(Duration::from_secs(5), screener.screen_all(&candidates(3)))
            .await
            .expect("screening must not hang");
        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.status == DomainStatus::Error));
        assert!(outcomes[0].evidence.contains("Timeout"));
    }

    #[tokio::test]
    async fn test_panicking_lookup_still_reports() {
        let screener = Screener::with_clients(
            ScreenConfig::default(),
            vec![
                fake(LookupKind::Dns, |d| {
                    if d == "examp0e.com" {
                        panic!("resolver bug");
                    }
                    Ok(LookupResponse::Records(vec![]))
                }),
            ],
        )
        .unwrap();

        let outcomes = screener.screen_all(&candidates(3)).await;
        assert_eq!(outcomes.len(), 3);
        let panicked = outcomes.iter().find(|o| o.domain == "examp0e.com").unwrap();
        assert_eq!(panicked.status, DomainStatus::Error);
        assert!(panicked.evidence.contains("panicked"));
    }

    static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);
    static MAX_IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);

    struct CountingClient;

    #[async_trait]
    impl LookupClient for CountingClient {
        fn kind(&self) -> LookupKind {
            LookupKind::Dns
        }

        async fn lookup(&self, _domain: &str) -> Result<LookupResponse, ScreenError> {
            let current = IN_FLIGHT.fetch_add(1, Ordering::SeqCst) + 1;
            MAX_IN_FLIGHT.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
            Ok(LookupResponse::Records(vec![]))
        }
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_honored() {
        let config = ScreenConfig::default().with_max_concurrency(4);
        let screener = Screener::with_clients(config, vec![Arc::new(CountingClient)]).unwrap();

        let outcomes = screener.screen_all(&candidates(20)).await;
        assert_eq!(outcomes.len(), 20);
        assert!(MAX_IN_FLIGHT.load(Ordering::SeqCst) <= 4);
    }

    #[test]
    fn test_requires_at_least_one_lookup() {
        let result = Screener::with_clients(ScreenConfig::default(), vec![]);
        assert!(matches!(result, Err(ScreenError::Config { .. })));
    }

    #[test]
    fn test_rejects_duplicate_lookup_kinds() {
        let result = Screener::with_clients(
            ScreenConfig::default(),
            vec![
                fake(LookupKind::Dns, |_| Ok(LookupResponse::Records(vec![]))),
                fake(LookupKind::Dns, |_| Ok(LookupResponse::Records(vec![]))),
            ],
        );
        assert!(matches!(result, Err(ScreenError::Config { .. })));
    }

    #[tokio::test]
    async fn test_reputation_requires_api_key() {
        let config = ScreenConfig::default().with_lookups(vec![LookupKind::Reputation]);
        assert!(matches!(Screener::new(config), Err(ScreenError::Config { .. })));

        let config = ScreenConfig::default()
            .with_lookups(vec![LookupKind::Reputation])
            .with_api_key("test-key");
        let screener = Screener::new(config).unwrap();
        assert_eq!(screener.lookups(), &[LookupKind::Reputation]);
    }

    #[tokio::test]
    async fn test_new_without_lookups_fails() {
        let config = ScreenConfig::default().with_lookups(vec![]);
        assert!(matches!(Screener::new(config), Err(ScreenError::Config { .. })));
    }
}
