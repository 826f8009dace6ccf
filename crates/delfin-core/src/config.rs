//! Configuration loading and parsing for Delfin
//!
//! Provides functionality to load and parse `delfin.toml` configuration files.

use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::types::IntrinsicType;

pub const CONFIG_FILENAME: &str = "delfin.toml";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["target", "analysis", "type_aliases"];
const KNOWN_TARGET_KEYS: &[&str] = &["pointer_size", "extended_size"];
const KNOWN_ANALYSIS_KEYS: &[&str] = &["unit_scope_names"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid TOML in '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub analysis: AnalysisConfig,
    /// Extra System names standing for intrinsic types, e.g. `Float = "Double"`.
    pub type_aliases: BTreeMap<String, String>,
}

/// Sizes that differ between compilation targets.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TargetConfig {
    pub pointer_size: u8,
    pub extended_size: u8,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            pointer_size: 4,
            extended_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Namespace prefixes tried when a uses-clause entry names no known unit.
    pub unit_scope_names: Vec<String>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.target.pointer_size, 4 | 8) {
            return Err(ConfigError::InvalidValue {
                key: "target.pointer_size".to_string(),
                message: format!("expected 4 or 8, got {}", self.target.pointer_size),
            });
        }
        if !matches!(self.target.extended_size, 8 | 10 | 16) {
            return Err(ConfigError::InvalidValue {
                key: "target.extended_size".to_string(),
                message: format!("expected 8, 10 or 16, got {}", self.target.extended_size),
            });
        }
        for (alias, target) in &self.type_aliases {
            if IntrinsicType::from_name(target).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: format!("type_aliases.{alias}"),
                    message: format!("'{target}' is not an intrinsic type"),
                });
            }
        }
        Ok(())
    }

    /// Alias names paired with the intrinsic they stand for.
    pub fn intrinsic_aliases(&self) -> impl Iterator<Item = (&str, IntrinsicType)> {
        self.type_aliases.iter().filter_map(|(alias, target)| {
            IntrinsicType::from_name(target).map(|intrinsic| (alias.as_str(), intrinsic))
        })
    }
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if !current.pop() {
            return None;
        }
    }
}

fn read_config(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })?;
    config.validate()?;

    Ok((config, content))
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    read_config(path).map(|(config, _)| config)
}

pub fn load_config_with_warnings(path: &Path) -> Result<ConfigResult, ConfigError> {
    let (config, content) = read_config(path)?;
    let warnings = detect_unknown_keys(&content);

    Ok(ConfigResult { config, warnings })
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();

    let table: toml::Table = match content.parse() {
        Ok(t) => t,
        Err(_) => return warnings,
    };

    let known_top: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known_top.contains(key.as_str()) {
            warnings.push(format!("Unknown config option: '{}'", key));
        }
    }

    for (section, known) in [("target", KNOWN_TARGET_KEYS), ("analysis", KNOWN_ANALYSIS_KEYS)] {
        if let Some(toml::Value::Table(entries)) = table.get(section) {
            let known: HashSet<&str> = known.iter().copied().collect();
            for key in entries.keys() {
                if !known.contains(key.as_str()) {
                    warnings.push(format!("Unknown config option in [{}]: '{}'", section, key));
                }
            }
        }
    }

    warnings
}

pub fn load_config_or_default(start_dir: &Path) -> Config {
    find_config_file(start_dir)
        .and_then(|path| load_config(&path).ok())
        .unwrap_or_default()
}
