//! Configuration management for rollrank CLI

use anyhow::{Context, Result};
use rollrank::MappingPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT: &str = "backend/light/rollAppraiserData.json";
pub const DEFAULT_MAPPING_OUTPUT: &str = "src/data/d2/trait-to-enhanced-trait.json";
pub const DEFAULT_REDUCED_OUTPUT: &str = "backend/light/rollAppraiserData.light.json";
pub const DEFAULT_FETCH_COMMAND: [&str; 2] = ["python3", "backend/get_light.py"];

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub mapping_output: Option<PathBuf>,
    pub reduced_output: Option<PathBuf>,
    pub fetch_command: Option<Vec<String>>,
    pub policy: Option<MappingPolicy>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("rollrank");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    pub fn input(&self) -> PathBuf {
        self.input.clone().unwrap_or_else(|| DEFAULT_INPUT.into())
    }

    pub fn mapping_output(&self) -> PathBuf {
        self.mapping_output
            .clone()
            .unwrap_or_else(|| DEFAULT_MAPPING_OUTPUT.into())
    }

    pub fn reduced_output(&self) -> PathBuf {
        self.reduced_output
            .clone()
            .unwrap_or_else(|| DEFAULT_REDUCED_OUTPUT.into())
    }

    pub fn fetch_command(&self) -> Vec<String> {
        self.fetch_command
            .clone()
            .unwrap_or_else(|| DEFAULT_FETCH_COMMAND.iter().map(|s| s.to_string()).collect())
    }

    pub fn policy(&self) -> MappingPolicy {
        self.policy.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.input(), PathBuf::from(DEFAULT_INPUT));
        assert_eq!(config.mapping_output(), PathBuf::from(DEFAULT_MAPPING_OUTPUT));
        assert_eq!(config.fetch_command(), vec!["python3", "backend/get_light.py"]);
        assert_eq!(config.policy(), MappingPolicy::AscendingHash);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            input: Some(PathBuf::from("/data/rolls.json")),
            fetch_command: Some(vec!["./fetch.sh".to_string()]),
            policy: Some(MappingPolicy::FirstSeenEnhanced),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("policy = \"first-seen-enhanced\""));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.reduced_output(), PathBuf::from(DEFAULT_REDUCED_OUTPUT));
    }

    #[test]
    fn test_load_missing_is_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "policy = \"sideways\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
