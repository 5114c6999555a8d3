//! Configuration management for scan settings.
//!
//! Stores configuration in JSON format at `~/.whoshome/config.json`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::application::{CoordinatorOptions, DEFAULT_MAX_WORKERS, DEFAULT_TIMEOUT};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Per-command timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of scans running at once.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Warn when a scan needs root and the process is not root.
    #[serde(default = "default_true")]
    pub warn_about_privileges: bool,

    /// CIDR suffix used when the host argument has none.
    #[serde(default = "default_cidr")]
    pub cidr: String,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_true() -> bool {
    true
}

fn default_cidr() -> String {
    "24".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_workers: default_max_workers(),
            warn_about_privileges: true,
            cidr: default_cidr(),
        }
    }
}

impl Config {
    /// Replace settings given on the command line.
    pub fn apply_overrides(
        &mut self,
        timeout_secs: Option<u64>,
        max_workers: Option<usize>,
        cidr: Option<String>,
    ) {
        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(max_workers) = max_workers {
            self.max_workers = max_workers;
        }
        if let Some(cidr) = cidr {
            self.cidr = cidr;
        }
    }

    /// Validated coordinator settings for this configuration.
    pub fn coordinator_options(&self) -> Result<CoordinatorOptions> {
        let options = CoordinatorOptions::new()
            .with_max_workers(self.max_workers)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_privilege_warning(self.warn_about_privileges);
        options.validate()?;
        Ok(options)
    }
}

/// Reads and writes [`Config`] as JSON at `~/.whoshome/config.json`.
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("no home directory for the config file".to_string()))?;
        Ok(Self::with_path(home.join(".whoshome").join("config.json")))
    }

    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Stored settings, or the defaults when nothing was saved yet.
    pub async fn load(&self) -> Result<Config> {
        let content = match fs::read_to_string(&self.config_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(self.error("read", e)),
        };
        serde_json::from_str(&content).map_err(|e| self.error("parse", e))
    }

    /// Persist `config`. Readers never see a half-written file: the JSON
    /// goes to a sibling temp file that is then renamed over the target.
    pub async fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| self.error("create the directory of", e))?;
        }

        let staged = self.config_path.with_extension("json.tmp");
        let mut file = fs::File::create(&staged)
            .await
            .map_err(|e| self.error("stage", e))?;
        file.write_all(serde_json::to_string_pretty(config)?.as_bytes())
            .await
            .map_err(|e| self.error("write", e))?;
        file.sync_all().await.map_err(|e| self.error("sync", e))?;

        fs::rename(&staged, &self.config_path)
            .await
            .map_err(|e| self.error("replace", e))
    }

    fn error(&self, action: &str, cause: impl std::fmt::Display) -> Error {
        Error::Config(format!(
            "could not {} {}: {}",
            action,
            self.config_path.display(),
            cause
        ))
    }
}
