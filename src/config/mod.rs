//! Configuration for a collection run
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! ```toml
//! cache_dir = "cache"
//! results_dir = "results"
//! experiments_dir = "executed_experiments"
//! log_level = "info"
//!
//! [agency]
//! url = "https://agency.example.org"
//! username = "experimenter"
//! password = "secret"
//!
//! [analysis]
//! occupancy_step = 4.0
//! transition_bin = 60
//! ```

use crate::agency::Credentials;
use crate::analysis::{DEFAULT_OCCUPANCY_STEP, DEFAULT_TRANSITION_BIN};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "batchtrace.toml";
/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "BATCHTRACE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub agency: AgencyConfig,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_experiments_dir")]
    pub experiments_dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgencyConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Seconds between occupancy samples
    #[serde(default = "default_occupancy_step")]
    pub occupancy_step: f64,
    /// Seconds per transition bin
    #[serde(default = "default_transition_bin")]
    pub transition_bin: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_experiments_dir() -> PathBuf {
    PathBuf::from("executed_experiments")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_occupancy_step() -> f64 {
    DEFAULT_OCCUPANCY_STEP
}

fn default_transition_bin() -> u64 {
    DEFAULT_TRANSITION_BIN
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            occupancy_step: default_occupancy_step(),
            transition_bin: default_transition_bin(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            agency: AgencyConfig::default(),
            cache_dir: default_cache_dir(),
            results_dir: default_results_dir(),
            experiments_dir: default_experiments_dir(),
            log_level: default_log_level(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load the config for this process
    ///
    /// Uses the file named by `BATCHTRACE_CONFIG`, else `batchtrace.toml` in
    /// the working directory if present, else defaults. Environment
    /// overrides are applied last.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            Err(_) => Self::default(),
        };

        config.merge_env_vars();
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    pub fn merge_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("AGENCY_URL") {
            self.agency.url = url;
        }

        if let Some(username) = lookup("AGENCY_USERNAME") {
            self.agency.username = username;
        }

        if let Some(password) = lookup("AGENCY_PASSWORD") {
            self.agency.password = password;
        }

        if let Some(cache_dir) = lookup("BATCHTRACE_CACHE_DIR") {
            self.cache_dir = PathBuf::from(cache_dir);
        }

        if let Some(results_dir) = lookup("BATCHTRACE_RESULTS_DIR") {
            self.results_dir = PathBuf::from(results_dir);
        }

        if let Some(log_level) = lookup("BATCHTRACE_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// Check that the agency can be reached with these settings
    pub fn validate(&self) -> Result<()> {
        if self.agency.url.trim().is_empty() {
            return Err(Error::Config("agency url is not set".to_string()));
        }

        if self.agency.username.trim().is_empty() {
            return Err(Error::Config("agency username is not set".to_string()));
        }

        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.agency.username, &self.agency.password)
    }
}
