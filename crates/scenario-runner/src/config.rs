//! Runner configuration
//!
//! Loaded from TOML, then overridden from the environment:
//!
//! | variable                   | field                |
//! |----------------------------|----------------------|
//! | `SCENARIO_MAX_CONCURRENCY` | `max_concurrency`    |
//! | `SCENARIO_MAX_VARIANTS`    | `max_variants`       |
//! | `SCENARIO_VERIFY`          | `verify_constraints` |
//! | `SCENARIO_DENY_CONFLICTS`  | `deny_conflicts`     |

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Executions in flight at once
    pub max_concurrency: usize,
    /// Largest number of executions one scenario may expand to
    pub max_variants: usize,
    /// Run each constraint's post-condition check before the body
    pub verify_constraints: bool,
    /// Fail executions whose constraints touch the same state key
    pub deny_conflicts: bool,
}

impl RunnerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With max concurrency
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    /// With variant cap
    #[inline]
    #[must_use]
    pub fn with_max_variants(mut self, max: usize) -> Self {
        self.max_variants = max;
        self
    }

    /// With post-condition checks on or off
    #[inline]
    #[must_use]
    pub fn with_verify_constraints(mut self, verify: bool) -> Self {
        self.verify_constraints = verify;
        self
    }

    /// With conflicting constraints treated as setup failures
    #[inline]
    #[must_use]
    pub fn with_deny_conflicts(mut self, deny: bool) -> Self {
        self.deny_conflicts = deny;
        self
    }

    /// Parse from TOML; missing fields take their defaults
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] or [`ConfigError::InvalidValue`]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] if the file cannot be read
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Apply `SCENARIO_*` environment overrides
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for an unparsable variable
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any variable source
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for an unparsable variable
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup("SCENARIO_MAX_CONCURRENCY") {
            self.max_concurrency = parse_usize("SCENARIO_MAX_CONCURRENCY", &value)?;
        }
        if let Some(value) = lookup("SCENARIO_MAX_VARIANTS") {
            self.max_variants = parse_usize("SCENARIO_MAX_VARIANTS", &value)?;
        }
        if let Some(value) = lookup("SCENARIO_VERIFY") {
            self.verify_constraints = parse_bool("SCENARIO_VERIFY", &value)?;
        }
        if let Some(value) = lookup("SCENARIO_DENY_CONFLICTS") {
            self.deny_conflicts = parse_bool("SCENARIO_DENY_CONFLICTS", &value)?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid("max_concurrency", "0"));
        }
        if self.max_variants == 0 {
            return Err(ConfigError::invalid("max_variants", "0"));
        }
        Ok(self)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_variants: 256,
            verify_constraints: true,
            deny_conflicts: false,
        }
    }
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value)),
    }
}
