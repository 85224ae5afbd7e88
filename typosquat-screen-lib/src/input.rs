//! Candidate input: JSON candidate files and the external permutation tool.
//!
//! Both sources produce the same JSON shape, an array of records with at
//! least a `domain` field. Every domain is normalized and validated before
//! any lookup is dispatched, so a bad entry rejects the whole input.

use crate::error::ScreenError;
use crate::types::CandidateDomain;
use crate::utils::{normalize_domain, validate_domain};
use std::collections::HashSet;
use std::path::Path;
use tokio::process::Command;

/// Default permutation tool.
pub const DEFAULT_PERMUTATION_TOOL: &str = "dnstwist";

/// Parse a JSON candidate array.
///
/// Domains are normalized (trimmed, lowercased, trailing dot dropped).
///
/// # Errors
///
/// Returns `ScreenError::Parse` for malformed JSON or any invalid domain.
pub fn parse_candidates(json: &str) -> Result<Vec<CandidateDomain>, ScreenError> {
    let mut candidates: Vec<CandidateDomain> = serde_json::from_str(json)
        .map_err(|e| ScreenError::parse(format!("invalid candidate list: {}", e)))?;

    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.domain = normalize_domain(&candidate.domain);
        validate_domain(&candidate.domain).map_err(|e| match e {
            ScreenError::Parse { message } => {
                ScreenError::parse(format!("candidate #{}: {}", index + 1, message))
            }
            other => other,
        })?;
    }

    Ok(candidates)
}

/// Load candidates from a JSON file.
///
/// # Errors
///
/// `ScreenError::File` if the file cannot be read, `ScreenError::Parse` if
/// its contents are not a valid candidate list.
pub async fn load_candidates<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateDomain>, ScreenError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ScreenError::file_error(path.display().to_string(), e.to_string()))?;

    let candidates = parse_candidates(&content)?;
    tracing::debug!(path = %path.display(), count = candidates.len(), "loaded candidates");
    Ok(candidates)
}

/// Run the permutation tool for one seed domain and parse its output.
///
/// Invokes `<program> -f json <seed>` and reads the candidate list from
/// stdout.
pub async fn run_permutation_tool(
    program: &str,
    seed: &str,
) -> Result<Vec<CandidateDomain>, ScreenError> {
    let output = Command::new(program)
        .arg("-f")
        .arg("json")
        .arg(seed)
        .output()
        .await
        .map_err(|e| {
            ScreenError::internal(format!(
                "Failed to execute {}: {}. Make sure '{}' is installed.",
                program, e, program
            ))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScreenError::internal(format!(
            "{} exited with {} for seed {}: {}",
            program,
            output.status,
            seed,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_candidates(&stdout)
}

/// Append `more` to `candidates`, skipping domains already present.
///
/// First occurrence wins, so file input takes precedence over generated
/// permutations when both name the same domain.
pub fn merge_candidates<I>(candidates: &mut Vec<CandidateDomain>, more: I)
where
    I: IntoIterator<Item = CandidateDomain>,
{
    let mut seen: HashSet<String> = candidates.iter().map(|c| c.domain.clone()).collect();
    for candidate in more {
        if seen.insert(candidate.domain.clone()) {
            candidates.push(candidate);
        }
    }
}

/// Run the permutation tool for every seed and merge the results.
///
/// A seed whose run fails is logged and skipped. Domains produced by more
/// than one seed are kept once.
pub async fn collect_seed_candidates(program: &str, seeds: &[String]) -> Vec<CandidateDomain> {
    let mut merged = Vec::new();

    for seed in seeds {
        match run_permutation_tool(program, seed).await {
            Ok(candidates) => {
                tracing::info!(seed = %seed, count = candidates.len(), "generated permutations");
                merge_candidates(&mut merged, candidates);
            }
            Err(e) => tracing::warn!(seed = %seed, "skipping seed: {}", e),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const DNSTWIST_SAMPLE: &str = r#"[
        {"fuzzer": "*original", "domain": "example.com", "dns_a": ["93.184.216.34"], "dns_ns": ["a.iana-servers.net"]},
        {"fuzzer": "homoglyph", "domain": "examp1e.com", "dns_a": ["10.0.0.1"], "dns_aaaa": ["::1"]},
        {"fuzzer": "addition", "domain": "Examplea.COM."}
    ]"#;

    #[test]
    fn test_parse_candidates() {
        let candidates = parse_candidates(DNSTWIST_SAMPLE).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].fuzzer, "*original");
        assert_eq!(candidates[1].dns_aaaa, Some(vec!["::1".to_string()]));
        assert_eq!(candidates[2].domain, "examplea.com");
        assert_eq!(candidates[2].dns_a, None);
    }

    #[test]
    fn test_fuzzer_is_optional() {
        let candidates = parse_candidates(r#"[{"domain": "examp1e.com"}]"#).unwrap();
        assert_eq!(candidates, vec![CandidateDomain::new("examp1e.com")]);
    }

    #[test]
    fn test_empty_list_is_valid() {
        assert!(parse_candidates("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(parse_candidates("not json"), Err(ScreenError::Parse { .. })));
        assert!(matches!(
            parse_candidates(r#"[{"fuzzer": "addition"}]"#),
            Err(ScreenError::Parse { .. })
        ));
        assert!(matches!(
            parse_candidates(r#"{"domain": "examp1e.com"}"#),
            Err(ScreenError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_domain_is_parse_error() {
        let err = parse_candidates(r#"[{"domain": "examp1e.com"}, {"domain": "bad domain"}]"#)
            .unwrap_err();
        match err {
            ScreenError::Parse { message } => assert!(message.contains("candidate #2")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_candidates_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(DNSTWIST_SAMPLE.as_bytes()).unwrap();

        let candidates = load_candidates(file.path()).await.unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_file_error() {
        let result = load_candidates("/nonexistent/candidates.json").await;
        assert!(matches!(result, Err(ScreenError::File { .. })));
    }

    #[tokio::test]
    async fn test_missing_tool_is_error() {
        let result = run_permutation_tool("typosquat-screen-no-such-tool", "example.com").await;
        match result {
            Err(ScreenError::Internal { message }) => assert!(message.contains("installed")),
            other => panic!("expected internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_merge_candidates_skips_known_domains() {
        let mut candidates = parse_candidates(DNSTWIST_SAMPLE).unwrap();
        let generated = vec![
            CandidateDomain::new("examp1e.com"),
            CandidateDomain::new("exampel.com"),
            CandidateDomain::new("exampel.com"),
        ];

        merge_candidates(&mut candidates, generated);

        let domains: Vec<&str> = candidates.iter().map(|c| c.domain.as_str()).collect();
        assert_eq!(domains, vec!["example.com", "examp1e.com", "examplea.com", "exampel.com"]);
        assert_eq!(candidates[1].fuzzer, "homoglyph");
    }

    #[tokio::test]
    async fn test_failed_seeds_are_skipped() {
        let seeds = vec!["example.com".to_string(), "example.org".to_string()];
        let merged = collect_seed_candidates("typosquat-screen-no-such-tool", &seeds).await;
        assert!(merged.is_empty());
    }
}
