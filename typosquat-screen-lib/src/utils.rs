//! Utility functions for domain processing and validation.

use crate::error::ScreenError;

/// Normalize a candidate domain: trim whitespace, lowercase, drop a trailing dot.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Validate a domain name format.
///
/// Checks basic FQDN syntax. Lookups will still fail for names that parse
/// but do not resolve, and those become `error` outcomes rather than
/// rejected input.
pub fn validate_domain(domain: &str) -> Result<(), ScreenError> {
    let domain = domain.trim();

    if domain.is_empty() {
        return Err(ScreenError::parse("domain name cannot be empty"));
    }

    if !is_valid_fqdn(domain) {
        return Err(ScreenError::parse(format!(
            "'{}' is not a valid fully qualified domain name",
            domain
        )));
    }

    Ok(())
}

/// Validate that an FQDN has basic valid structure.
pub(crate) fn is_valid_fqdn(domain: &str) -> bool {
    if domain.len() < 4 || domain.len() > 253 {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    // Cannot start or end with dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return false;
    }

    for part in domain.split('.') {
        if part.is_empty() || part.len() > 63 {
            return false;
        }

        if part.starts_with('-') || part.ends_with('-') {
            return false;
        }

        // Alphanumeric (including IDN labels) and hyphens only
        if !part.chars().all(|c| c.is_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
