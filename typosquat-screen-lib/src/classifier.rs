//! Classification of raw lookup responses.
//!
//! The policy is kept as ordered rule tables: the first rule with any pattern
//! found in the (lowercased) response decides the status. When nothing
//! matches, the domain is considered registered.

use crate::error::ScreenError;
use crate::types::{DomainStatus, LookupKind, LookupOutcome, LookupResponse};

/// One classification rule: any of `patterns` present yields `status`.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub patterns: &'static [&'static str],
    pub status: DomainStatus,
}

/// Reputation API rules. Suspicious is checked before unregistered.
pub const REPUTATION_RULES: &[Rule] = &[
    Rule {
        patterns: &["malicious", "phishing"],
        status: DomainStatus::Suspicious,
    },
    Rule {
        patterns: &["not found", "no match"],
        status: DomainStatus::Unregistered,
    },
];

/// WHOIS rules, applied to the sanitized record.
pub const WHOIS_RULES: &[Rule] = &[
    Rule {
        patterns: &["no match for", "not found"],
        status: DomainStatus::Unregistered,
    },
    Rule {
        patterns: &["fraud", "phishing"],
        status: DomainStatus::Suspicious,
    },
];

/// Boilerplate that registries append to WHOIS records. Everything from the
/// first marker on is dropped before classification.
pub const WHOIS_BOILERPLATE_MARKERS: &[&str] = &[
    "terms of use",
    ">>> last update of whois database",
    "the registry database contains only",
    "notice: the expiration date displayed",
    "for more information on whois status codes",
    "url of the icann whois inaccuracy complaint form",
    "by submitting a whois query",
    "by the following terms of use",
    "access to whois information is provided",
];

fn rules_for(kind: LookupKind) -> &'static [Rule] {
    match kind {
        LookupKind::Reputation => REPUTATION_RULES,
        LookupKind::Whois => WHOIS_RULES,
        LookupKind::Dns => &[],
    }
}

/// Apply a rule table to free text.
pub fn match_rules(rules: &[Rule], text: &str) -> DomainStatus {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| lowered.contains(p)))
        .map(|rule| rule.status)
        .unwrap_or(DomainStatus::Registered)
}

/// Strip registry boilerplate from a WHOIS record.
///
/// Keeps only the text before the earliest marker. The result contains no
/// marker, so sanitizing twice is a no-op.
pub fn sanitize_whois(text: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with `text`.
    let lowered = text.to_ascii_lowercase();
    let cut = WHOIS_BOILERPLATE_MARKERS
        .iter()
        .filter_map(|marker| lowered.find(marker))
        .min();

    match cut {
        Some(index) => &text[..index],
        None => text,
    }
}

/// Classify a lookup response.
pub fn classify(kind: LookupKind, response: &LookupResponse) -> DomainStatus {
    match response {
        LookupResponse::Records(records) if records.is_empty() => DomainStatus::Unregistered,
        LookupResponse::Records(_) => DomainStatus::Registered,
        LookupResponse::Text(text) => {
            let text = match kind {
                LookupKind::Whois => sanitize_whois(text),
                _ => text.as_str(),
            };
            match_rules(rules_for(kind), text)
        }
    }
}

/// Classify a response and build the outcome with its evidence text.
pub fn evaluate(domain: &str, kind: LookupKind, response: &LookupResponse) -> LookupOutcome {
    let status = classify(kind, response);
    let evidence = match response {
        LookupResponse::Records(records) if records.is_empty() => "No A records found".to_string(),
        LookupResponse::Records(records) => {
            format!("A record for {}: {}", domain, records.join(", "))
        }
        LookupResponse::Text(text) if kind == LookupKind::Whois => sanitize_whois(text).to_string(),
        LookupResponse::Text(text) => text.clone(),
    };

    LookupOutcome::new(domain, kind, status, evidence)
}

/// Build the `error` outcome for a failed lookup.
pub fn failed(domain: &str, kind: LookupKind, error: &ScreenError) -> LookupOutcome {
    let prefix = match kind {
        LookupKind::Dns => "Error checking DNS records",
        LookupKind::Whois => "Error fetching WHOIS data",
        LookupKind::Reputation => "Error checking threat intelligence",
    };

    LookupOutcome::new(domain, kind, DomainStatus::Error, format!("{}: {}", prefix, error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> LookupResponse {
        LookupResponse::Text(s.to_string())
    }

    #[test]
    fn test_reputation_classification() {
        let kind = LookupKind::Reputation;
        assert_eq!(
            classify(kind, &text(r#"{"last_analysis_results": {"x": {"category": "malicious"}}}"#)),
            DomainStatus::Suspicious
        );
        assert_eq!(classify(kind, &text("Flagged as PHISHING")), DomainStatus::Suspicious);
        assert_eq!(
            classify(kind, &text(r#"{"error": {"code": "NotFoundError", "message": "Domain \"x.com\" not found"}}"#)),
            DomainStatus::Unregistered
        );
        assert_eq!(classify(kind, &text("No Match")), DomainStatus::Unregistered);
        assert_eq!(classify(kind, &text(r#"{"data": {"harmless": 70}}"#)), DomainStatus::Registered);
    }

    #[test]
    fn test_reputation_suspicious_takes_precedence() {
        let body = "Domain not found in one engine, malicious in another";
        assert_eq!(classify(LookupKind::Reputation, &text(body)), DomainStatus::Suspicious);
    }

    #[test]
    fn test_whois_classification() {
        let kind = LookupKind::Whois;
        assert_eq!(classify(kind, &text("No match for \"EXAMP1E.COM\".")), DomainStatus::Unregistered);
        assert_eq!(classify(kind, &text("Domain NOT FOUND")), DomainStatus::Unregistered);
        assert_eq!(
            classify(kind, &text("Domain Status: clientHold\nRemarks: reported for fraud")),
            DomainStatus::Suspicious
        );
        assert_eq!(
            classify(kind, &text("Domain Name: EXAMP1E.COM\nRegistrar: Example Registrar")),
            DomainStatus::Registered
        );
    }

    #[test]
    fn test_whois_unregistered_takes_precedence() {
        let record = "No match for domain. Report phishing to abuse@example.net";
        assert_eq!(classify(LookupKind::Whois, &text(record)), DomainStatus::Unregistered);
    }

    #[test]
    fn test_whois_boilerplate_does_not_classify() {
        // "not found" only appears inside the disclaimer
        let record = "Domain Name: EXAMP1E.COM\nRegistrar: Example\n\nTERMS OF USE: if a record is not found ...";
        assert_eq!(classify(LookupKind::Whois, &text(record)), DomainStatus::Registered);
    }

    #[test]
    fn test_sanitize_truncates_at_first_marker() {
        assert_eq!(
            sanitize_whois("Domain Status: active\nTERMS OF USE: You are not authorized"),
            "Domain Status: active\n"
        );

        let record = "Registrar: X\n>>> Last update of whois database: 2024-01-01 <<<\nNOTICE: The expiration date displayed";
        assert_eq!(sanitize_whois(record), "Registrar: X\n");

        assert_eq!(sanitize_whois("Registrar: X"), "Registrar: X");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "Domain Status: active\nTERMS OF USE: ...",
            "plain record",
            "",
            "Ünïcode Registrar\nBy submitting a WHOIS query, you agree",
        ];
        for sample in samples {
            let once = sanitize_whois(sample);
            assert_eq!(sanitize_whois(once), once);
        }
    }

    #[test]
    fn test_empty_text_defaults_to_registered() {
        assert_eq!(classify(LookupKind::Whois, &text("   \n")), DomainStatus::Registered);
        assert_eq!(classify(LookupKind::Reputation, &text("")), DomainStatus::Registered);
        assert_eq!(
            classify(LookupKind::Whois, &text("TERMS OF USE: not found")),
            DomainStatus::Registered
        );
    }

    #[test]
    fn test_dns_classification() {
        let one = LookupResponse::Records(vec!["93.184.216.34".to_string()]);
        let none = LookupResponse::Records(vec![]);
        assert_eq!(classify(LookupKind::Dns, &one), DomainStatus::Registered);
        assert_eq!(classify(LookupKind::Dns, &none), DomainStatus::Unregistered);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let response = text("Malicious and not found");
        let first = classify(LookupKind::Reputation, &response);
        for _ in 0..10 {
            assert_eq!(classify(LookupKind::Reputation, &response), first);
        }
    }

    #[test]
    fn test_evaluate_evidence() {
        let outcome = evaluate(
            "examp1e.com",
            LookupKind::Dns,
            &LookupResponse::Records(vec!["1.2.3.4".to_string(), "5.6.7.8".to_string()]),
        );
        assert_eq!(outcome.status, DomainStatus::Registered);
        assert_eq!(outcome.evidence, "A record for examp1e.com: 1.2.3.4, 5.6.7.8");

        let outcome = evaluate("examp1e.com", LookupKind::Dns, &LookupResponse::Records(vec![]));
        assert_eq!(outcome.evidence, "No A records found");

        let outcome = evaluate(
            "examp1e.com",
            LookupKind::Whois,
            &text("Registrar: X\nTERMS OF USE: blah"),
        );
        assert_eq!(outcome.evidence, "Registrar: X\n");
    }

    #[test]
    fn test_failed_outcome() {
        let err = ScreenError::lookup(LookupKind::Reputation, "examp1e.com", "connection refused");
        let outcome = failed("examp1e.com", LookupKind::Reputation, &err);
        assert_eq!(outcome.status, DomainStatus::Error);
        assert!(outcome.evidence.starts_with("Error checking threat intelligence: "));
        assert!(outcome.evidence.contains("connection refused"));
    }
}
