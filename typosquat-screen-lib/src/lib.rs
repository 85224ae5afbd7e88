//! # Typosquat Screen Library
//!
//! Screens domain-name permutations for registration and abuse signals.
//!
//! Every candidate domain is looked up against DNS, WHOIS and a reputation
//! service concurrently, each response is classified as registered,
//! unregistered, suspicious or error, and the outcomes are written to
//! per-category report files.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use typosquat_screen_lib::{load_candidates, write_reports, OutputPaths, ScreenConfig, Screener};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let candidates = load_candidates("candidates.json").await?;
//!
//!     let config = ScreenConfig::default().with_api_key("my-api-key");
//!     let screener = Screener::new(config)?;
//!
//!     let summary = write_reports(screener.screen(&candidates), OutputPaths::default()).await?;
//!     println!("{} suspicious domains", summary.suspicious);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Fan-out/fan-in**: one task per (domain, lookup) pair, results collected
//!   over a single channel that closes once every lookup has reported
//! - **Rule-table classifier**: ordered keyword rules per lookup source
//! - **Report files**: full and condensed records, ready for delivery
//! - **Configurable**: TOML files, environment overrides, builder API

// Re-export main public API types and functions
pub use classifier::{classify, evaluate, sanitize_whois};
pub use config::{
    load_env_config, load_env_config_from, merge_configs, parse_dns_server, parse_timeout_string,
    ConfigManager, DefaultsConfig, DeliveryConfig, EnvConfig, FileConfig, ResolversConfig,
    MAX_CONCURRENCY,
};
pub use delivery::deliver_report;
pub use error::ScreenError;
pub use input::{
    collect_seed_candidates, load_candidates, merge_candidates, parse_candidates, run_permutation_tool,
    DEFAULT_PERMUTATION_TOOL,
};
pub use protocols::{DnsClient, LookupClient, ReputationClient, WhoisClient};
pub use report::{
    format_condensed, format_record, virustotal_link, write_reports, OutputPaths, ReportSummary,
    ReportWriter, DEFAULT_OUTPUT_DIR,
};
pub use screener::Screener;
pub use types::{
    parse_lookup_kinds, ApiKey, CandidateDomain, DomainStatus, LookupKind, LookupOutcome,
    LookupResponse, ScreenConfig, DEFAULT_DNS_SERVER, DEFAULT_REPUTATION_BASE_URL,
};

// Public modules
pub mod classifier;

// Internal modules - these are not part of the public API
mod concurrent;
mod config;
mod delivery;
mod error;
mod input;
mod protocols;
mod report;
mod screener;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScreenError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
