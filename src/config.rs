//! Configuration for a lint run
//!
//! Read from YAML or JSON:
//!
//! ```yaml
//! rules:
//!   await-promise: error
//!   some-legacy-rule:
//!     severity: warning
//!     options: [true, "check-x"]
//! overrides:
//!   - files: ["**/*.spec.ts"]
//!     rules:
//!       await-promise: off
//! engine:
//!   parallel: true
//!   jobs: 0
//! fix:
//!   enabled: false
//!   max_iterations: 10
//! ```

use crate::diagnostic::Severity;
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configured severity of a rule, `off` disables it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    #[default]
    Error,
    #[serde(alias = "warn")]
    Warning,
    #[serde(alias = "hint")]
    Suggestion,
    Off,
}

impl RuleSeverity {
    /// Severity of reported failures, `None` when the rule is off
    pub fn severity(self) -> Option<Severity> {
        match self {
            RuleSeverity::Error => Some(Severity::Error),
            RuleSeverity::Warning => Some(Severity::Warning),
            RuleSeverity::Suggestion => Some(Severity::Suggestion),
            RuleSeverity::Off => None,
        }
    }
}

/// Settings of one rule.
///
/// Written either as a bare severity or as `{ severity, options }`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RuleEntry", into = "RuleEntry")]
pub struct RuleConfig {
    pub severity: RuleSeverity,
    /// Rule options, `Null` when not configured
    pub options: Value,
}

impl RuleConfig {
    pub fn new(severity: RuleSeverity) -> Self {
        Self {
            severity,
            options: Value::Null,
        }
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    /// Apply an override: the severity always wins, options only when given
    fn merge(&mut self, other: &RuleConfig) {
        self.severity = other.severity;
        if !other.options.is_null() {
            self.options = other.options.clone();
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RuleEntry {
    Short(RuleSeverity),
    Long {
        #[serde(default)]
        severity: RuleSeverity,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        options: Value,
    },
}

impl From<RuleEntry> for RuleConfig {
    fn from(entry: RuleEntry) -> Self {
        match entry {
            RuleEntry::Short(severity) => RuleConfig::new(severity),
            RuleEntry::Long { severity, options } => RuleConfig { severity, options },
        }
    }
}

impl From<RuleConfig> for RuleEntry {
    fn from(config: RuleConfig) -> Self {
        if config.options.is_null() {
            RuleEntry::Short(config.severity)
        } else {
            RuleEntry::Long {
                severity: config.severity,
                options: config.options,
            }
        }
    }
}

/// Rule settings for files matching some globs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Override {
    /// Glob patterns, matched against the file name
    pub files: Vec<String>,

    pub rules: BTreeMap<String, RuleConfig>,
}

impl Override {
    fn glob_set(&self) -> Result<GlobSet, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.files {
            builder.add(Glob::new(pattern)?);
        }
        Ok(builder.build()?)
    }
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Lint files in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// Fix settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixConfig {
    /// Apply fixes while linting
    pub enabled: bool,

    /// Upper bound of lint-and-fix rounds per file
    pub max_iterations: usize,
}

impl Default for FixConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_iterations: 10,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rules to run, by name
    pub rules: BTreeMap<String, RuleConfig>,

    /// Per-file rule settings, applied in order
    pub overrides: Vec<Override>,

    /// Engine settings
    pub engine: EngineConfig,

    /// Fix settings
    pub fix: FixConfig,
}

impl Config {
    /// Create an empty configuration (no rules enabled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::preset_recommended()),
            _ => None,
        }
    }

    fn preset_recommended() -> Self {
        let mut config = Self::default();
        config
            .rules
            .insert("await-promise".to_string(), RuleConfig::new(RuleSeverity::Error));
        config
    }

    /// Load configuration from a `.yaml`, `.yml` or `.json` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "json" => Self::from_json_str(&content),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown config file format: {}",
                ext
            ))),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check glob patterns and limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (i, o) in self.overrides.iter().enumerate() {
            if o.files.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "Override #{} has no file patterns",
                    i + 1
                )));
            }
            o.glob_set()?;
        }
        if self.fix.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "fix.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Rule settings for one file, with all matching overrides applied.
    ///
    /// Contains disabled rules too; check [`RuleSeverity::severity`].
    pub fn effective_rules(&self, file_name: &str) -> BTreeMap<String, RuleConfig> {
        let mut rules = self.rules.clone();
        for o in &self.overrides {
            let glob_set = match o.glob_set() {
                Ok(set) => set,
                Err(e) => {
                    warn!("Ignoring override with invalid pattern: {}", e);
                    continue;
                }
            };
            if !glob_set.is_match(file_name) {
                continue;
            }
            for (name, config) in &o.rules {
                rules
                    .entry(name.clone())
                    .and_modify(|existing| existing.merge(config))
                    .or_insert_with(|| config.clone());
            }
        }
        rules
    }

    /// Check if a rule runs on a file
    pub fn is_rule_enabled(&self, rule_name: &str, file_name: &str) -> bool {
        self.effective_rules(file_name)
            .get(rule_name)
            .is_some_and(|r| r.severity != RuleSeverity::Off)
    }
}
