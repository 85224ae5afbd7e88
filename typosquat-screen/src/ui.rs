//! Terminal display logic for the typosquat-screen CLI.
//!
//! Spinner, run header and the per-status summary. Everything interactive
//! goes to stderr; the summary goes to stdout.

use console::{style, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use typosquat_screen_lib::{LookupKind, OutputPaths, ReportSummary};

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner, or return None when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Spinner text for a run.
pub fn screening_message(candidates: usize, lookups: &[LookupKind]) -> String {
    format!(
        "Screening {} domain{} ({} lookup{})...",
        candidates,
        plural(candidates),
        candidates * lookups.len(),
        plural(candidates * lookups.len())
    )
}

/// Print the run header to stderr.
pub fn print_header(candidates: usize, lookups: &[LookupKind], concurrency: Option<usize>) {
    let names: Vec<&str> = lookups.iter().map(LookupKind::as_str).collect();
    let limit = concurrency
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unbounded".to_string());

    eprintln!(
        "{} {} {}",
        style("typosquat-screen").bold(),
        style(format!("v{}", typosquat_screen_lib::VERSION)).dim(),
        style(format!("| {} candidate{}", candidates, plural(candidates))).dim(),
    );
    eprintln!(
        "{}",
        style(format!("Lookups: {} | Concurrency: {}", names.join(", "), limit)).dim()
    );
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Uncolored one-line summary, also used for plain output.
pub fn summary_line(summary: &ReportSummary, duration: Duration) -> String {
    format!(
        "{} outcome{} in {:.1}s | {} registered | {} unregistered | {} suspicious | {} error{}",
        summary.total(),
        plural(summary.total()),
        duration.as_secs_f64(),
        summary.registered,
        summary.unregistered,
        summary.suspicious,
        summary.error,
        plural(summary.error),
    )
}

/// Print the colored per-status summary and report locations.
pub fn print_summary(summary: &ReportSummary, paths: &OutputPaths, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} outcome{} in {:.1}s  {}  {}  {}  {}  {}  {}  {}  {}",
        style(summary.total()).bold(),
        plural(summary.total()),
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} registered", summary.registered)).white(),
        style("|").dim(),
        style(format!("{} unregistered", summary.unregistered)).green(),
        style("|").dim(),
        style(format!("{} suspicious", summary.suspicious)).red().bold(),
        style("|").dim(),
        style(format!("{} error{}", summary.error, plural(summary.error))).yellow(),
    );

    if summary.suspicious > 0 {
        println!(
            "  {} {}",
            style("Suspicious domains:").red(),
            style(paths.condensed.display()).dim()
        );
    }
    println!("  {} {}", style("Reports:").dim(), style(paths.dir.display()).dim());
}

/// Note that delivery went through.
pub fn print_delivered(endpoint: &str) {
    println!("  {} {}", style("Delivered condensed report to").dim(), endpoint);
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
