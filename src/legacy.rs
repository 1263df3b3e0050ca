//! Legacy per-field storage keys.
//!
//! Older releases stored one encrypted scalar per field, under
//! provider-prefixed keys (`githubUsername`, `githubToken`). The current
//! format stores a single encrypted JSON record under the full domain.
//! This table enumerates the known legacy key names per provider; it is
//! consulted only while migrating reads, never for new writes.

/// Legacy storage key names for one provider.
pub struct LegacyKeySet {
    /// Provider prefix, the first label of the domain ("github").
    pub provider: &'static str,
    /// Key holding the encrypted username.
    pub username_key: &'static str,
    /// Key holding the encrypted API token.
    pub token_key: &'static str,
    /// Superseded key names from even older releases, cleared alongside
    /// the primary pair when migration succeeds.
    pub stale_keys: &'static [&'static str],
}

const LEGACY_KEY_SETS: &[LegacyKeySet] = &[
    LegacyKeySet {
        provider: "github",
        username_key: "githubUsername",
        token_key: "githubToken",
        stale_keys: &["githubAccessToken"],
    },
    LegacyKeySet {
        provider: "gitlab",
        username_key: "gitlabUsername",
        token_key: "gitlabToken",
        stale_keys: &["gitlabAccessToken"],
    },
    LegacyKeySet {
        provider: "bitbucket",
        username_key: "bitbucketUsername",
        token_key: "bitbucketToken",
        stale_keys: &[],
    },
];

/// Look up the legacy key set for a provider prefix.
///
/// Providers outside the table never had legacy-format entries.
pub fn legacy_keys_for(provider: &str) -> Option<&'static LegacyKeySet> {
    LEGACY_KEY_SETS.iter().find(|set| set.provider == provider)
}

impl LegacyKeySet {
    /// Every key name owned by this provider, for post-migration cleanup.
    pub fn all_keys(&self) -> Vec<&'static str> {
        let mut keys = vec![self.username_key, self.token_key];
        keys.extend_from_slice(self.stale_keys);
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_provider() {
        let set = legacy_keys_for("github").unwrap();
        assert_eq!(set.username_key, "githubUsername");
        assert_eq!(set.token_key, "githubToken");
    }

    #[test]
    fn test_unknown_provider() {
        assert!(legacy_keys_for("sourcehut").is_none());
        assert!(legacy_keys_for("").is_none());
    }

    #[test]
    fn test_all_keys_includes_stale_variants() {
        let keys = legacy_keys_for("github").unwrap().all_keys();
        assert!(keys.contains(&"githubUsername"));
        assert!(keys.contains(&"githubToken"));
        assert!(keys.contains(&"githubAccessToken"));
    }
}
