//! Debugger configuration loading.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use smol_str::SmolStr;

use crate::error::ConfigError;

pub const DEFAULT_MAX_TIME_MS: u64 = 10;
pub const DEFAULT_MAX_TIME_PERCENTAGE: f64 = 1.0;
pub const DEFAULT_MAX_MEMORY_MB: u64 = 10;

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct DebuggerConfig {
    /// Extra functions callable from conditions and watch expressions.
    pub allowed_functions: Vec<SmolStr>,
    /// Extra `Class::method` targets callable from conditions and watch expressions.
    pub allowed_methods: Vec<SmolStr>,
    /// Absolute per-request ceiling on handler time.
    pub max_time: Duration,
    /// Per-request ceiling as a percentage of the average request time.
    pub max_time_percentage: f64,
    /// Per-request ceiling on memory charged to captures, in bytes.
    pub max_memory: usize,
    /// Base directory for relative breakpoint filenames.
    pub source_root: Option<PathBuf>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            allowed_functions: Vec::new(),
            allowed_methods: Vec::new(),
            max_time: Duration::from_millis(DEFAULT_MAX_TIME_MS),
            max_time_percentage: DEFAULT_MAX_TIME_PERCENTAGE,
            max_memory: usize::try_from(DEFAULT_MAX_MEMORY_MB * BYTES_PER_MB).unwrap_or(usize::MAX),
            source_root: None,
        }
    }
}

impl DebuggerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string().into(),
            message: err.to_string().into(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: DebuggerToml =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string().into()))?;
        raw.into_config()
    }
}

/// Splits a comma-separated list, dropping blanks.
#[must_use]
pub fn split_name_list(text: &str) -> Vec<SmolStr> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(SmolStr::new)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameList {
    Csv(String),
    List(Vec<String>),
}

impl NameList {
    fn into_names(self) -> Vec<SmolStr> {
        match self {
            Self::Csv(text) => split_name_list(&text),
            Self::List(items) => items
                .iter()
                .flat_map(|item| split_name_list(item))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DebuggerToml {
    debugger: Option<DebuggerSection>,
}

#[derive(Debug, Deserialize)]
struct DebuggerSection {
    allowed_functions: Option<NameList>,
    allowed_methods: Option<NameList>,
    max_time_ms: Option<u64>,
    max_time_percentage: Option<f64>,
    max_memory_mb: Option<u64>,
    source_root: Option<String>,
}

impl DebuggerToml {
    fn into_config(self) -> Result<DebuggerConfig, ConfigError> {
        let defaults = DebuggerConfig::default();
        let Some(section) = self.debugger else {
            return Ok(defaults);
        };

        let max_time_percentage = section
            .max_time_percentage
            .unwrap_or(DEFAULT_MAX_TIME_PERCENTAGE);
        if !max_time_percentage.is_finite() || max_time_percentage <= 0.0 {
            return Err(ConfigError::Invalid(
                format!("debugger.max_time_percentage must be positive, got {max_time_percentage}")
                    .into(),
            ));
        }

        let max_memory = match section.max_memory_mb {
            Some(mb) => mb
                .checked_mul(BYTES_PER_MB)
                .and_then(|bytes| usize::try_from(bytes).ok())
                .ok_or_else(|| {
                    ConfigError::Invalid(format!("debugger.max_memory_mb too large: {mb}").into())
                })?,
            None => defaults.max_memory,
        };

        Ok(DebuggerConfig {
            allowed_functions: section
                .allowed_functions
                .map(NameList::into_names)
                .unwrap_or_default(),
            allowed_methods: section
                .allowed_methods
                .map(NameList::into_names)
                .unwrap_or_default(),
            max_time: section
                .max_time_ms
                .map_or(defaults.max_time, Duration::from_millis),
            max_time_percentage,
            max_memory,
            source_root: section.source_root.map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = DebuggerConfig::from_toml_str("").unwrap();
        assert_eq!(config, DebuggerConfig::default());
        assert_eq!(config.max_time, Duration::from_millis(10));
        assert_eq!(config.max_memory, 10 * 1024 * 1024);
    }

    #[test]
    fn test_csv_and_list_forms() {
        let config = DebuggerConfig::from_toml_str(
            r#"
[debugger]
allowed_functions = "foo, bar,,baz"
allowed_methods = ["Cart::total", "Cart::count,Cart::first"]
max_time_ms = 25
max_time_percentage = 2.5
max_memory_mb = 1
source_root = "/srv/app"
"#,
        )
        .unwrap();
        assert_eq!(config.allowed_functions, vec!["foo", "bar", "baz"]);
        assert_eq!(
            config.allowed_methods,
            vec!["Cart::total", "Cart::count", "Cart::first"]
        );
        assert_eq!(config.max_time, Duration::from_millis(25));
        assert!((config.max_time_percentage - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.max_memory, 1024 * 1024);
        assert_eq!(config.source_root, Some(PathBuf::from("/srv/app")));
    }

    #[test]
    fn test_rejects_non_positive_percentage() {
        let err = DebuggerConfig::from_toml_str("[debugger]\nmax_time_percentage = 0.0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = DebuggerConfig::from_toml_str("[debugger\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
