//! Applicator configuration

use serde::{Deserialize, Serialize};

/// How much of the derived state to rebuild after applying modifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebuildPolicy {
    /// Only what the changed layers and the changed street area require
    #[default]
    Scoped,
    /// Every derived index, regardless of what changed
    Full,
}

/// Scenario applicator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicatorConfig {
    /// Recompute the baseline checksum after application and compare
    pub verify_baseline_unchanged: bool,
    /// Derived-index rebuild policy
    pub rebuild_policy: RebuildPolicy,
}

impl ApplicatorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With baseline verification on or off
    #[inline]
    #[must_use]
    pub fn with_verify_baseline_unchanged(mut self, verify: bool) -> Self {
        self.verify_baseline_unchanged = verify;
        self
    }

    /// With a rebuild policy
    #[inline]
    #[must_use]
    pub fn with_rebuild_policy(mut self, policy: RebuildPolicy) -> Self {
        self.rebuild_policy = policy;
        self
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown values
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }
}

impl Default for ApplicatorConfig {
    fn default() -> Self {
        Self {
            verify_baseline_unchanged: cfg!(debug_assertions),
            rebuild_policy: RebuildPolicy::Scoped,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid applicator configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_defaults_on_in_test_builds() {
        assert_eq!(
            ApplicatorConfig::default().verify_baseline_unchanged,
            cfg!(debug_assertions)
        );
        assert_eq!(ApplicatorConfig::default().rebuild_policy, RebuildPolicy::Scoped);
    }

    #[test]
    fn parses_toml() {
        let config = ApplicatorConfig::from_toml_str(
            "verify_baseline_unchanged = true\nrebuild_policy = \"full\"\n",
        )
        .unwrap();
        assert!(config.verify_baseline_unchanged);
        assert_eq!(config.rebuild_policy, RebuildPolicy::Full);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(ApplicatorConfig::from_toml_str("").unwrap(), ApplicatorConfig::default());
    }

    #[test]
    fn rejects_unknown_policy() {
        assert!(ApplicatorConfig::from_toml_str("rebuild_policy = \"partial\"").is_err());
    }

    #[test]
    fn builder_methods() {
        let config = ApplicatorConfig::new()
            .with_verify_baseline_unchanged(false)
            .with_rebuild_policy(RebuildPolicy::Full);
        assert!(!config.verify_baseline_unchanged);
        assert_eq!(config.rebuild_policy, RebuildPolicy::Full);
    }
}
