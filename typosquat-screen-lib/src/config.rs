//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files, reading the
//! environment overrides, and merging configurations with proper precedence
//! rules.

use crate::error::ScreenError;
use crate::types::{parse_lookup_kinds, LookupKind};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Upper bound accepted for the concurrency limit.
pub const MAX_CONCURRENCY: usize = 10_000;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for run options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Upstream lookup servers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<ResolversConfig>,

    /// Where the condensed report is sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Lookup kinds to run, e.g. `["dns", "whois"]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookups: Option<Vec<String>>,

    /// Per-lookup timeout ("10s", "2m" or bare seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Cap on in-flight lookups; absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Directory for the report files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResolversConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reputation_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DeliveryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, ScreenError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ScreenError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ScreenError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            ScreenError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// XDG config is lowest, then the home directory file, then the file in
    /// the working directory. A file that exists but fails to load is an error.
    pub fn discover_and_load(&self) -> Result<FileConfig, ScreenError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            let config = self.load_file(&path)?;
            merged_config = merge_configs(merged_config, config);
            loaded_files.push(path);
        }

        for path in &loaded_files {
            if self.verbose {
                tracing::info!(path = %path.display(), "loaded config file");
            } else {
                tracing::debug!(path = %path.display(), "loaded config file");
            }
        }

        Ok(merged_config)
    }

    /// Configuration file in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./typosquat-screen.toml");
        path.exists().then(|| path.to_path_buf())
    }

    /// Configuration file in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let path = Path::new(&home).join(".typosquat-screen.toml");
        path.exists().then_some(path)
    }

    /// Configuration file under the XDG config directory.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("typosquat-screen").join("config.toml");
        path.exists().then_some(path)
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), ScreenError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(ScreenError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.timeout {
                if parse_timeout_string(timeout_str).is_none() {
                    return Err(ScreenError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }

            if let Some(lookups) = &defaults.lookups {
                parse_lookup_list(lookups).map_err(ScreenError::config)?;
            }
        }

        if let Some(resolvers) = &config.resolvers {
            if let Some(dns_server) = &resolvers.dns_server {
                parse_dns_server(dns_server)?;
            }
            if let Some(url) = &resolvers.reputation_url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(ScreenError::config(format!(
                        "Invalid reputation_url '{}': must be an http(s) URL",
                        url
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Merge two configurations. Values from `higher` take precedence.
pub fn merge_configs(lower: FileConfig, higher: FileConfig) -> FileConfig {
    FileConfig {
        defaults: match (lower.defaults, higher.defaults) {
            (Some(mut lower_defaults), Some(higher_defaults)) => {
                if higher_defaults.lookups.is_some() {
                    lower_defaults.lookups = higher_defaults.lookups;
                }
                if higher_defaults.timeout.is_some() {
                    lower_defaults.timeout = higher_defaults.timeout;
                }
                if higher_defaults.concurrency.is_some() {
                    lower_defaults.concurrency = higher_defaults.concurrency;
                }
                if higher_defaults.output_dir.is_some() {
                    lower_defaults.output_dir = higher_defaults.output_dir;
                }
                Some(lower_defaults)
            }
            (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
        },
        resolvers: match (lower.resolvers, higher.resolvers) {
            (Some(mut lower_resolvers), Some(higher_resolvers)) => {
                if higher_resolvers.dns_server.is_some() {
                    lower_resolvers.dns_server = higher_resolvers.dns_server;
                }
                if higher_resolvers.whois_server.is_some() {
                    lower_resolvers.whois_server = higher_resolvers.whois_server;
                }
                if higher_resolvers.reputation_url.is_some() {
                    lower_resolvers.reputation_url = higher_resolvers.reputation_url;
                }
                Some(lower_resolvers)
            }
            (lower_resolvers, higher_resolvers) => higher_resolvers.or(lower_resolvers),
        },
        delivery: match (lower.delivery, higher.delivery) {
            (Some(lower_delivery), Some(higher_delivery)) => Some(DeliveryConfig {
                endpoint: higher_delivery.endpoint.or(lower_delivery.endpoint),
            }),
            (lower_delivery, higher_delivery) => higher_delivery.or(lower_delivery),
        },
    }
}

/// Environment configuration that mirrors CLI options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    /// `VIRUSTOTAL_API_KEY`
    pub api_key: Option<String>,
    /// `HTTP_ENDPOINT`
    pub endpoint: Option<String>,
    /// `TS_LOOKUPS`, comma separated
    pub lookups: Option<Vec<LookupKind>>,
    /// `TS_TIMEOUT`, already validated
    pub timeout: Option<String>,
    /// `TS_CONCURRENCY`
    pub concurrency: Option<usize>,
    /// `TS_OUTPUT_DIR`
    pub output_dir: Option<String>,
}

/// Load configuration from the process environment.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Load environment configuration through an arbitrary variable lookup.
pub fn load_env_config_from<F>(get: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();
    let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    env_config.api_key = non_empty("VIRUSTOTAL_API_KEY").map(|v| v.trim().to_string());
    env_config.endpoint = non_empty("HTTP_ENDPOINT").map(|v| v.trim().to_string());

    if let Some(val) = non_empty("TS_LOOKUPS") {
        match parse_lookup_kinds(&val) {
            Ok(kinds) if !kinds.is_empty() => {
                tracing::debug!("Using TS_LOOKUPS={}", val);
                env_config.lookups = Some(kinds);
            }
            Ok(_) => tracing::warn!("Ignoring empty TS_LOOKUPS"),
            Err(e) => tracing::warn!("Invalid TS_LOOKUPS='{}': {}", val, e),
        }
    }

    if let Some(val) = non_empty("TS_TIMEOUT") {
        if parse_timeout_string(&val).is_some() {
            tracing::debug!("Using TS_TIMEOUT={}", val);
            env_config.timeout = Some(val);
        } else {
            tracing::warn!("Invalid TS_TIMEOUT='{}', use format like '5s', '30s', '2m'", val);
        }
    }

    if let Some(val) = non_empty("TS_CONCURRENCY") {
        match val.trim().parse::<usize>() {
            Ok(concurrency) if concurrency > 0 && concurrency <= MAX_CONCURRENCY => {
                tracing::debug!("Using TS_CONCURRENCY={}", concurrency);
                env_config.concurrency = Some(concurrency);
            }
            _ => tracing::warn!(
                "Invalid TS_CONCURRENCY='{}', must be 1-{}",
                val,
                MAX_CONCURRENCY
            ),
        }
    }

    env_config.output_dir = non_empty("TS_OUTPUT_DIR");

    env_config
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds. Zero is rejected.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    let secs = if let Some(s) = timeout_str.strip_suffix('s') {
        s.parse::<u64>().ok()
    } else if let Some(m) = timeout_str.strip_suffix('m') {
        m.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    };

    secs.filter(|&s| s > 0)
}

/// Parse a resolver address; a bare IP gets port 53.
pub fn parse_dns_server(value: &str) -> Result<SocketAddr, ScreenError> {
    let value = value.trim();
    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Ok(addr);
    }
    value
        .parse::<std::net::IpAddr>()
        .map(|ip| SocketAddr::new(ip, 53))
        .map_err(|_| ScreenError::config(format!("Invalid DNS server '{}'", value)))
}

fn parse_lookup_list(lookups: &[String]) -> Result<Vec<LookupKind>, String> {
    let kinds = parse_lookup_kinds(&lookups.join(","))?;
    if kinds.is_empty() {
        return Err("at least one lookup kind must be enabled".to_string());
    }
    Ok(kinds)
}

impl DefaultsConfig {
    /// Lookup kinds, if set. Only valid after `ConfigManager` validation.
    pub fn lookup_kinds(&self) -> Option<Vec<LookupKind>> {
        self.lookups
            .as_ref()
            .and_then(|lookups| parse_lookup_list(lookups).ok())
    }
}
