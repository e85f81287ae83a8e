//! Push configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Default number of upserts in flight within one level
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 5;

/// Settings for one push run
///
/// ```toml
/// concurrency_limit = 8
/// dry_run = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PushConfig {
    /// Maximum concurrent upserts within a level
    pub concurrency_limit: usize,
    /// Resolve and report without calling any upsert
    pub dry_run: bool,
}

impl PushConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With concurrency limit
    #[inline]
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// With dry-run mode
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Parse and validate a TOML document
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML or unknown keys
    /// - `ConfigError::ZeroConcurrency` for `concurrency_limit = 0`
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    ///
    /// # Errors
    /// `ConfigError::ZeroConcurrency` when the limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency_limit == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Concurrency limit actually applied (never below one)
    #[inline]
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency_limit.max(1)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PushConfig::new();
        assert_eq!(config.concurrency_limit, 5);
        assert!(!config.dry_run);
    }

    #[test]
    fn parses_partial_toml() {
        let config = PushConfig::from_toml_str("dry_run = true").unwrap();
        assert!(config.dry_run);
        assert_eq!(config.concurrency_limit, DEFAULT_CONCURRENCY_LIMIT);
    }

    #[test]
    fn rejects_zero_and_unknown_keys() {
        assert!(matches!(
            PushConfig::from_toml_str("concurrency_limit = 0"),
            Err(ConfigError::ZeroConcurrency)
        ));
        assert!(matches!(
            PushConfig::from_toml_str("concurency_limit = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_limit_is_clamped_when_built_in_code() {
        assert_eq!(PushConfig::new().with_concurrency_limit(0).effective_concurrency(), 1);
    }
}
