//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up rollrank CLI defaults.

use crate::config::Config;
use anyhow::Result;
use rollrank::MappingPolicy;
use std::path::PathBuf;

/// Values given to `configure`; `None` leaves a setting unchanged
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub input: Option<PathBuf>,
    pub mapping_output: Option<PathBuf>,
    pub reduced_output: Option<PathBuf>,
    pub fetch_command: Option<Vec<String>>,
    pub policy: Option<MappingPolicy>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.input.is_none()
            && self.mapping_output.is_none()
            && self.reduced_output.is_none()
            && self.fetch_command.is_none()
            && self.policy.is_none()
    }

    fn apply(self, config: &mut Config) {
        if let Some(input) = self.input {
            config.input = Some(input);
        }
        if let Some(output) = self.mapping_output {
            config.mapping_output = Some(output);
        }
        if let Some(output) = self.reduced_output {
            config.reduced_output = Some(output);
        }
        if let Some(command) = self.fetch_command {
            config.fetch_command = Some(command);
        }
        if let Some(policy) = self.policy {
            config.policy = Some(policy);
        }
    }
}

/// Handle the configure command
pub fn handle(update: ConfigUpdate, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if update.is_empty() {
        show_usage();
        return Ok(());
    }

    update.apply(&mut config);
    config.save()?;

    println!("Configuration saved");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

fn show_config(config: &Config) {
    println!("{:<16} {}", "Input:", config.input().display());
    println!("{:<16} {}", "Mapping output:", config.mapping_output().display());
    println!("{:<16} {}", "Reduced output:", config.reduced_output().display());
    println!("{:<16} {}", "Fetch command:", config.fetch_command().join(" "));
    println!("{:<16} {}", "Policy:", config.policy());

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

fn show_usage() {
    println!("Usage: rollrank configure --input PATH --policy ascending-hash");
    println!("   or: rollrank configure --fetch-command python3 backend/get_light.py");
    println!("   or: rollrank configure --show");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_update() {
        let mut config = Config {
            input: Some(PathBuf::from("old.json")),
            reduced_output: Some(PathBuf::from("keep.json")),
            ..Default::default()
        };

        let update = ConfigUpdate {
            input: Some(PathBuf::from("new.json")),
            policy: Some(MappingPolicy::FirstSeenEnhanced),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut config);

        assert_eq!(config.input, Some(PathBuf::from("new.json")));
        assert_eq!(config.reduced_output, Some(PathBuf::from("keep.json")));
        assert_eq!(config.policy, Some(MappingPolicy::FirstSeenEnhanced));
    }

    #[test]
    fn test_empty_update() {
        assert!(ConfigUpdate::default().is_empty());
    }
}
