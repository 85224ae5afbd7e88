//! Typosquat Screen CLI Application
//!
//! Screens typosquat permutations of a domain against DNS, WHOIS and a
//! reputation service, writes categorised reports and delivers the
//! suspicious findings to a results endpoint.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use std::time::{Duration, Instant};
use typosquat_screen_lib::{
    collect_seed_candidates, deliver_report, load_candidates, load_env_config, merge_candidates,
    parse_dns_server, parse_lookup_kinds, parse_timeout_string, write_reports, CandidateDomain, ConfigManager,
    EnvConfig, FileConfig, OutputPaths, ReportSummary, ScreenConfig, ScreenError, Screener,
    DEFAULT_OUTPUT_DIR, DEFAULT_PERMUTATION_TOOL, MAX_CONCURRENCY,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for typosquat-screen
#[derive(Parser, Debug)]
#[command(name = "typosquat-screen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Screen typosquat domain permutations for registration and malicious intent")]
#[command(
    long_about = "Screen typosquat domain permutations against DNS, WHOIS and the VirusTotal reputation API.\n\nEvery candidate is looked up concurrently, classified as registered, unregistered, suspicious or error, and written to report files. The condensed suspicious report is then POSTed to a results endpoint."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Candidate list as JSON (dnstwist -f json format)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        help_heading = "Candidates"
    )]
    pub input: Option<PathBuf>,

    /// Seed domain to generate permutations for (repeatable)
    #[arg(
        long = "seed",
        value_name = "DOMAIN",
        action = clap::ArgAction::Append,
        help_heading = "Candidates"
    )]
    pub seeds: Vec<String>,

    /// Permutation tool invoked as `<PROG> -f json <seed>`
    #[arg(
        long = "permutation-tool",
        value_name = "PROG",
        default_value = DEFAULT_PERMUTATION_TOOL,
        help_heading = "Candidates"
    )]
    pub permutation_tool: String,

    /// Lookups to run (comma-separated: dns, whois, reputation)
    #[arg(short = 'l', long = "lookups", value_name = "KINDS", help_heading = "Lookups")]
    pub lookups: Option<String>,

    /// Per-lookup timeout, e.g. "10s" or "2m" (default: 10s)
    #[arg(short = 't', long = "timeout", value_name = "DURATION", help_heading = "Lookups")]
    pub timeout: Option<String>,

    /// Max in-flight lookups (default: unbounded)
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Lookups")]
    pub concurrency: Option<usize>,

    /// DNS resolver address (default: 8.8.8.8:53)
    #[arg(long = "dns-server", value_name = "ADDR", help_heading = "Lookups")]
    pub dns_server: Option<String>,

    /// Fixed WHOIS server instead of IANA referral
    #[arg(long = "whois-server", value_name = "HOST", help_heading = "Lookups")]
    pub whois_server: Option<String>,

    /// Reputation API base URL (default: https://www.virustotal.com)
    #[arg(long = "reputation-url", value_name = "URL", help_heading = "Lookups")]
    pub reputation_url: Option<String>,

    /// Directory for report files (default: output)
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", help_heading = "Output")]
    pub output_dir: Option<PathBuf>,

    /// Endpoint receiving the condensed report (overrides HTTP_ENDPOINT)
    #[arg(long = "endpoint", value_name = "URL", help_heading = "Output")]
    pub endpoint: Option<String>,

    /// Skip delivering the condensed report
    #[arg(long = "no-deliver", help_heading = "Output")]
    pub no_deliver: bool,

    /// Print the run summary as JSON
    #[arg(short = 'j', long = "json", help_heading = "Output")]
    pub json: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Fully resolved run settings.
#[derive(Debug)]
struct Settings {
    screen: ScreenConfig,
    output_dir: PathBuf,
    endpoint: Option<String>,
}

/// Machine-readable run result for `--json`.
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    candidates: usize,
    summary: &'a ReportSummary,
    outputs: &'a OutputPaths,
    delivered_to: Option<&'a str>,
    duration_ms: u128,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // A missing .env is fine; credentials may come from the environment
    let dotenv_result = dotenvy::dotenv();

    init_tracing(args.verbose);

    if let Err(e) = dotenv_result {
        if !e.not_found() {
            tracing::warn!("Failed to load .env file: {}", e);
        }
    }

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run_screen(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to stderr; RUST_LOG wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "warn,typosquat_screen=debug,typosquat_screen_lib=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Validate command line arguments
fn validate_args(args: &Args) -> Result<(), String> {
    if args.input.is_none() && args.seeds.is_empty() {
        return Err(
            "You must specify a candidate file with --input or seed domains with --seed"
                .to_string(),
        );
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            ));
        }
    }

    if args.endpoint.is_some() && args.no_deliver {
        return Err("Cannot specify both --endpoint and --no-deliver".to_string());
    }

    Ok(())
}

async fn run_screen(args: Args) -> Result<(), ScreenError> {
    let settings = build_settings(&args)?;
    let started = Instant::now();

    let screener = Screener::new(settings.screen)?;
    let candidates = get_candidates(&args).await?;

    tracing::info!(
        candidates = candidates.len(),
        lookups = screener.expected_outcomes(candidates.len()),
        "starting screen"
    );

    if !args.json {
        ui::print_header(
            candidates.len(),
            screener.lookups(),
            screener.config().max_concurrency,
        );
    }
    let spinner = if args.json {
        None
    } else {
        ui::Spinner::start(ui::screening_message(candidates.len(), screener.lookups()))
    };

    let paths = OutputPaths::in_dir(&settings.output_dir);
    let result = write_reports(screener.screen(&candidates), paths.clone()).await;

    if let Some(spinner) = spinner {
        spinner.stop().await;
    }
    let summary = result?;
    let duration = started.elapsed();
    tracing::info!("{}", ui::summary_line(&summary, duration));

    if let Some(endpoint) = &settings.endpoint {
        deliver_report(endpoint, &paths.condensed).await?;
    }

    if args.json {
        let report = RunReport {
            candidates: candidates.len(),
            summary: &summary,
            outputs: &paths,
            delivered_to: settings.endpoint.as_deref(),
            duration_ms: duration.as_millis(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        ui::print_summary(&summary, &paths, duration);
        if let Some(endpoint) = &settings.endpoint {
            ui::print_delivered(endpoint);
        }
        println!("Results categorised and saved to files.");
    }

    Ok(())
}

/// Collect candidates from the input file and any seed domains.
async fn get_candidates(args: &Args) -> Result<Vec<CandidateDomain>, ScreenError> {
    let mut candidates = match &args.input {
        Some(path) => load_candidates(path).await?,
        None => Vec::new(),
    };

    if !args.seeds.is_empty() {
        let generated = collect_seed_candidates(&args.permutation_tool, &args.seeds).await;
        merge_candidates(&mut candidates, generated);
    }

    Ok(candidates)
}

/// Resolve settings: defaults < config files < environment < CLI flags.
fn build_settings(args: &Args) -> Result<Settings, ScreenError> {
    let mut settings = Settings {
        screen: ScreenConfig::default(),
        output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        endpoint: None,
    };

    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: config files
    let file_config = match &args.config {
        Some(explicit_config_path) => {
            tracing::debug!("Using explicit config file: {}", explicit_config_path);
            config_manager.load_file(explicit_config_path)?
        }
        None => config_manager.discover_and_load()?,
    };
    settings = merge_file_config(settings, file_config)?;

    // Step 2: environment
    settings = apply_environment_config(settings, load_env_config())?;

    // Step 3: CLI arguments (highest precedence)
    settings = apply_cli_args(settings, args)?;

    if args.no_deliver {
        settings.endpoint = None;
    } else if settings.endpoint.is_none() {
        return Err(ScreenError::config(
            "HTTP_ENDPOINT is not set; pass --endpoint or --no-deliver",
        ));
    }

    Ok(settings)
}

fn merge_file_config(mut settings: Settings, file_config: FileConfig) -> Result<Settings, ScreenError> {
    if let Some(defaults) = file_config.defaults {
        if let Some(lookups) = defaults.lookup_kinds() {
            settings.screen.lookups = lookups;
        }
        if let Some(timeout) = &defaults.timeout {
            settings.screen.timeout = timeout_from_str(timeout)?;
        }
        if let Some(concurrency) = defaults.concurrency {
            settings.screen.max_concurrency = Some(concurrency);
        }
        if let Some(output_dir) = defaults.output_dir {
            settings.output_dir = PathBuf::from(output_dir);
        }
    }

    if let Some(resolvers) = file_config.resolvers {
        if let Some(dns_server) = &resolvers.dns_server {
            settings.screen.dns_server = parse_dns_server(dns_server)?;
        }
        if let Some(whois_server) = resolvers.whois_server {
            settings.screen.whois_server = Some(whois_server);
        }
        if let Some(url) = resolvers.reputation_url {
            settings.screen.reputation_base_url = url;
        }
    }

    if let Some(endpoint) = file_config.delivery.and_then(|d| d.endpoint) {
        settings.endpoint = Some(endpoint);
    }

    Ok(settings)
}

fn apply_environment_config(mut settings: Settings, env_config: EnvConfig) -> Result<Settings, ScreenError> {
    if let Some(api_key) = env_config.api_key {
        settings.screen = settings.screen.with_api_key(api_key);
    }
    if let Some(endpoint) = env_config.endpoint {
        settings.endpoint = Some(endpoint);
    }
    if let Some(lookups) = env_config.lookups {
        settings.screen.lookups = lookups;
    }
    if let Some(timeout) = &env_config.timeout {
        settings.screen.timeout = timeout_from_str(timeout)?;
    }
    if let Some(concurrency) = env_config.concurrency {
        settings.screen.max_concurrency = Some(concurrency);
    }
    if let Some(output_dir) = env_config.output_dir {
        settings.output_dir = PathBuf::from(output_dir);
    }
    Ok(settings)
}

fn apply_cli_args(mut settings: Settings, args: &Args) -> Result<Settings, ScreenError> {
    if let Some(lookups) = &args.lookups {
        let kinds = parse_lookup_kinds(lookups).map_err(ScreenError::config)?;
        if kinds.is_empty() {
            return Err(ScreenError::config("--lookups must name at least one lookup kind"));
        }
        settings.screen.lookups = kinds;
    }
    if let Some(timeout) = &args.timeout {
        settings.screen.timeout = timeout_from_str(timeout)?;
    }
    if let Some(concurrency) = args.concurrency {
        settings.screen.max_concurrency = Some(concurrency);
    }
    if let Some(dns_server) = &args.dns_server {
        settings.screen.dns_server = parse_dns_server(dns_server)?;
    }
    if let Some(whois_server) = &args.whois_server {
        settings.screen.whois_server = Some(whois_server.clone());
    }
    if let Some(url) = &args.reputation_url {
        settings.screen.reputation_base_url = url.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        settings.output_dir = output_dir.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = Some(endpoint.clone());
    }
    Ok(settings)
}

fn timeout_from_str(value: &str) -> Result<Duration, ScreenError> {
    parse_timeout_string(value)
        .map(Duration::from_secs)
        .ok_or_else(|| {
            ScreenError::config(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                value
            ))
        })
}
