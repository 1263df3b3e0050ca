//! Remote URL → storage key normalization.
//!
//! Credentials are keyed by the bare host domain of the Git remote, so
//! `https://github.com/foo/bar.git` and `github.com` resolve to the same
//! entry. The provider prefix (first dotted label) selects the legacy
//! key set during migration.

use url::Url;

/// Normalize a remote URL or bare host to a lowercase domain.
///
/// Strips scheme, userinfo, port, path, query, and fragment. Returns
/// `None` if no host can be extracted.
pub fn normalize_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    // Bare hosts like "github.com" don't parse as absolute URLs.
    let with_scheme;
    let candidate = if trimmed.contains("://") {
        trimmed
    } else {
        with_scheme = format!("https://{}", trimmed);
        with_scheme.as_str()
    };

    let parsed = Url::parse(candidate).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.');
    if host.is_empty() {
        return None;
    }

    Some(host.to_ascii_lowercase())
}

/// Provider prefix of a domain: the first dotted label.
///
/// `github.com` → `github`. Only consulted for legacy-format lookup.
pub fn provider_prefix(domain: &str) -> Option<&str> {
    domain.split('.').next().filter(|label| !label.is_empty())
}
