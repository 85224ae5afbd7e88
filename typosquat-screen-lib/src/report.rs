//! Result sink: routes outcomes into per-category report files.
//!
//! Four files live in the output directory. `registered.txt`,
//! `unregistered.txt` and `suspicious.txt` get one full record per outcome;
//! `condensed_suspicious.txt` gets a short record per suspicious outcome and
//! is the file that gets delivered. Error outcomes land in `registered.txt`
//! with status `error`.

use crate::error::ScreenError;
use crate::types::{DomainStatus, LookupOutcome};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Public report page for a domain on the reputation service.
pub fn virustotal_link(domain: &str) -> String {
    format!("https://www.virustotal.com/gui/domain/{}", domain)
}

/// Full record written to the category files.
pub fn format_record(outcome: &LookupOutcome) -> String {
    format!(
        "Domain: {}\nStatus: {}\nData:\n{}\n\n",
        outcome.domain, outcome.status, outcome.evidence
    )
}

/// Short record written to the condensed file.
pub fn format_condensed(outcome: &LookupOutcome) -> String {
    format!(
        "Domain: {}\nVirusTotal Link: {}\nDetermination: {}\n\n",
        outcome.domain,
        virustotal_link(&outcome.domain),
        outcome.status
    )
}

/// Locations of the four report files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub registered: PathBuf,
    pub unregistered: PathBuf,
    pub suspicious: PathBuf,
    pub condensed: PathBuf,
}

impl OutputPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            registered: dir.join("registered.txt"),
            unregistered: dir.join("unregistered.txt"),
            suspicious: dir.join("suspicious.txt"),
            condensed: dir.join("condensed_suspicious.txt"),
            dir,
        }
    }
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_OUTPUT_DIR)
    }
}

/// Per-status counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub registered: usize,
    pub unregistered: usize,
    pub suspicious: usize,
    pub error: usize,
}

impl ReportSummary {
    /// Total outcomes recorded.
    pub fn total(&self) -> usize {
        self.registered + self.unregistered + self.suspicious + self.error
    }

    fn record(&mut self, status: DomainStatus) {
        match status {
            DomainStatus::Registered => self.registered += 1,
            DomainStatus::Unregistered => self.unregistered += 1,
            DomainStatus::Suspicious => self.suspicious += 1,
            DomainStatus::Error => self.error += 1,
        }
    }
}

/// Buffered writer over the four report files.
pub struct ReportWriter {
    paths: OutputPaths,
    registered: BufWriter<File>,
    unregistered: BufWriter<File>,
    suspicious: BufWriter<File>,
    condensed: BufWriter<File>,
    summary: ReportSummary,
}

impl ReportWriter {
    /// Create the output directory if needed and truncate all four files.
    pub async fn create(paths: OutputPaths) -> Result<Self, ScreenError> {
        tokio::fs::create_dir_all(&paths.dir)
            .await
            .map_err(|e| ScreenError::file_error(paths.dir.display().to_string(), e.to_string()))?;

        Ok(Self {
            registered: open_truncated(&paths.registered).await?,
            unregistered: open_truncated(&paths.unregistered).await?,
            suspicious: open_truncated(&paths.suspicious).await?,
            condensed: open_truncated(&paths.condensed).await?,
            paths,
            summary: ReportSummary::default(),
        })
    }

    /// Route one outcome to its category file.
    pub async fn write(&mut self, outcome: &LookupOutcome) -> Result<(), ScreenError> {
        let record = format_record(outcome);
        let (writer, path) = match outcome.status {
            DomainStatus::Registered | DomainStatus::Error => (&mut self.registered, &self.paths.registered),
            DomainStatus::Unregistered => (&mut self.unregistered, &self.paths.unregistered),
            DomainStatus::Suspicious => (&mut self.suspicious, &self.paths.suspicious),
        };
        write_to(writer, path, &record).await?;

        if outcome.status == DomainStatus::Suspicious {
            write_to(&mut self.condensed, &self.paths.condensed, &format_condensed(outcome)).await?;
        }

        self.summary.record(outcome.status);
        Ok(())
    }

    /// Flush every file and return the counts.
    pub async fn finish(mut self) -> Result<ReportSummary, ScreenError> {
        flush(&mut self.registered, &self.paths.registered).await?;
        flush(&mut self.unregistered, &self.paths.unregistered).await?;
        flush(&mut self.suspicious, &self.paths.suspicious).await?;
        flush(&mut self.condensed, &self.paths.condensed).await?;
        Ok(self.summary)
    }
}

/// Drain `outcomes` into the report files until the channel closes.
pub async fn write_reports(
    mut outcomes: mpsc::Receiver<LookupOutcome>,
    paths: OutputPaths,
) -> Result<ReportSummary, ScreenError> {
    let mut writer = ReportWriter::create(paths).await?;
    while let Some(outcome) = outcomes.recv().await {
        writer.write(&outcome).await?;
    }
    let summary = writer.finish().await?;
    tracing::info!(
        total = summary.total(),
        suspicious = summary.suspicious,
        errors = summary.error,
        "reports written"
    );
    Ok(summary)
}

async fn open_truncated(path: &Path) -> Result<BufWriter<File>, ScreenError> {
    File::create(path)
        .await
        .map(BufWriter::new)
        .map_err(|e| ScreenError::file_error(path.display().to_string(), e.to_string()))
}

async fn write_to(writer: &mut BufWriter<File>, path: &Path, text: &str) -> Result<(), ScreenError> {
    writer
        .write_all(text.as_bytes())
        .await
        .map_err(|e| ScreenError::file_error(path.display().to_string(), e.to_string()))
}

async fn flush(writer: &mut BufWriter<File>, path: &Path) -> Result<(), ScreenError> {
    writer
        .flush()
        .await
        .map_err(|e| ScreenError::file_error(path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LookupKind;
    use tempfile::TempDir;

    fn outcome(domain: &str, status: DomainStatus, evidence: &str) -> LookupOutcome {
        LookupOutcome::new(domain, LookupKind::Reputation, status, evidence)
    }

    async fn read(path: &Path) -> String {
        tokio::fs::read_to_string(path).await.unwrap()
    }

    #[test]
    fn test_record_formats() {
        let o = outcome("examp1e.com", DomainStatus::Suspicious, "{\"malicious\": 3}");
        assert_eq!(
            format_record(&o),
            "Domain: examp1e.com\nStatus: suspicious\nData:\n{\"malicious\": 3}\n\n"
        );
        assert_eq!(
            format_condensed(&o),
            "Domain: examp1e.com\nVirusTotal Link: https://www.virustotal.com/gui/domain/examp1e.com\nDetermination: suspicious\n\n"
        );
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::default();
        assert_eq!(paths.dir, PathBuf::from("output"));
        assert_eq!(paths.condensed, PathBuf::from("output/condensed_suspicious.txt"));
    }

    #[tokio::test]
    async fn test_routes_outcomes_by_status() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path().join("nested/output"));

        let (tx, rx) = mpsc::channel(8);
        tx.send(outcome("a.com", DomainStatus::Registered, "reg")).await.unwrap();
        tx.send(outcome("b.com", DomainStatus::Unregistered, "unreg")).await.unwrap();
        tx.send(outcome("c.com", DomainStatus::Suspicious, "phish")).await.unwrap();
        tx.send(outcome("d.com", DomainStatus::Error, "Error checking threat intelligence: boom"))
            .await
            .unwrap();
        drop(tx);

        let summary = write_reports(rx, paths.clone()).await.unwrap();
        assert_eq!(
            summary,
            ReportSummary {
                registered: 1,
                unregistered: 1,
                suspicious: 1,
                error: 1
            }
        );
        assert_eq!(summary.total(), 4);

        let registered = read(&paths.registered).await;
        assert!(registered.contains("Domain: a.com\nStatus: registered\nData:\nreg\n\n"));
        assert!(registered.contains("Domain: d.com\nStatus: error\n"));
        assert_eq!(read(&paths.unregistered).await, "Domain: b.com\nStatus: unregistered\nData:\nunreg\n\n");
        assert_eq!(read(&paths.suspicious).await, "Domain: c.com\nStatus: suspicious\nData:\nphish\n\n");

        let condensed = read(&paths.condensed).await;
        assert_eq!(condensed.matches("Domain: ").count(), 1);
        assert!(condensed.contains("https://www.virustotal.com/gui/domain/c.com"));
    }

    #[tokio::test]
    async fn test_files_are_truncated_per_run() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path());

        for _ in 0..2 {
            let (tx, rx) = mpsc::channel(1);
            tx.send(outcome("c.com", DomainStatus::Suspicious, "malicious")).await.unwrap();
            drop(tx);
            write_reports(rx, paths.clone()).await.unwrap();
        }

        assert_eq!(read(&paths.condensed).await.matches("Domain: ").count(), 1);
    }

    #[tokio::test]
    async fn test_empty_run_creates_empty_files() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path());

        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let summary = write_reports(rx, paths.clone()).await.unwrap();

        assert_eq!(summary.total(), 0);
        for path in [&paths.registered, &paths.unregistered, &paths.suspicious, &paths.condensed] {
            assert_eq!(read(path).await, "");
        }
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_file_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let result = ReportWriter::create(OutputPaths::in_dir(&blocker)).await;
        assert!(matches!(result, Err(ScreenError::File { .. })));
    }
}
