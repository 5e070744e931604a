//! Deployment configuration: defaults, optional skiff.toml, CLI overrides.
//!
//! Defaults live here; the CLI layer applies flag overrides on top of
//! whatever the config store loads.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::types::CpuArchitecture;

/// Explicit configuration for one deployment run.
///
/// Defaults mirror the layout the bot's EC2 hosts are provisioned with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Remote host, also the EC2 Name tag when lifecycle management is on.
    pub hostname: String,
    /// Local path of the model artifact.
    pub model_path: PathBuf,
    /// Name of the compiled binary under `target/<triple>/release/`.
    pub bot_binary: String,
    /// Config files synced by the config group, alongside the crontab.
    pub config_files: Vec<PathBuf>,
    /// Crontab file synced by the config group and installed remotely.
    pub crontab_file: PathBuf,
    /// Remote login user whose home directory receives the transfers.
    pub remote_user: String,
    /// Directory the remote install step moves files into.
    pub remote_dir: String,
    /// Architecture assumed when no instance lookup runs.
    pub architecture: CpuArchitecture,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            hostname: "aws-ec2-4".to_string(),
            model_path: PathBuf::from("model_path"),
            bot_binary: "bot".to_string(),
            config_files: vec![PathBuf::from("config.bot.yaml"), PathBuf::from("config.yaml")],
            crontab_file: PathBuf::from("cron-settings.crontab"),
            remote_user: "ec2-user".to_string(),
            remote_dir: "/usr/local/bot".to_string(),
            architecture: CpuArchitecture::X86_64,
        }
    }
}

impl DeployConfig {
    /// File name the crontab lands under in the remote home directory.
    pub fn crontab_name(&self) -> String {
        self.crontab_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.crontab_file.display().to_string())
    }
}

/// Loads skiff.toml from an explicit path or the default locations.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store for an explicit config file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Default location: `./skiff.toml`, falling back to the user config dir.
    pub fn from_default_locations() -> Self {
        let local = PathBuf::from("skiff.toml");
        if local.exists() {
            return Self::from_path(local);
        }
        let global = dirs::config_dir()
            .map(|p| p.join("skiff").join("skiff.toml"))
            .unwrap_or_else(|| local.clone());
        Self::from_path(global)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the config, falling back to defaults when the file is absent.
    pub fn load(&self) -> anyhow::Result<DeployConfig> {
        if !self.config_path.exists() {
            return Ok(DeployConfig::default());
        }
        let content = std::fs::read_to_string(&self.config_path).with_context(|| {
            format!(
                "Failed to read config file: {}",
                self.config_path.display()
            )
        })?;
        toml::from_str(&content).with_context(|| {
            format!("Invalid config file: {}", self.config_path.display())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_provisioned_layout() {
        let config = DeployConfig::default();
        assert_eq!(config.hostname, "aws-ec2-4");
        assert_eq!(config.bot_binary, "bot");
        assert_eq!(config.remote_user, "ec2-user");
        assert_eq!(config.remote_dir, "/usr/local/bot");
        assert_eq!(config.config_files.len(), 2);
        assert_eq!(config.crontab_name(), "cron-settings.crontab");
    }

    #[test]
    fn crontab_name_strips_leading_directories() {
        let config = DeployConfig {
            crontab_file: PathBuf::from("deploy/cron-settings.crontab"),
            ..DeployConfig::default()
        };
        assert_eq!(config.crontab_name(), "cron-settings.crontab");
    }
}
