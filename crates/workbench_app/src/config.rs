use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use workbench_engine::{ClientSettings, DEFAULT_API_BASE};

pub const API_BASE_ENV: &str = "WORKBENCH_API_BASE";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base: String,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            output_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads the user config, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("workbench").join("config.json"))
    }

    /// The command line wins over the environment, which wins over the file.
    pub fn with_overrides(
        mut self,
        env_api_base: Option<String>,
        cli_api_base: Option<String>,
        cli_output_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(api_base) = cli_api_base
            .or(env_api_base)
            .filter(|value| !value.trim().is_empty())
        {
            self.api_base = api_base.trim().to_string();
        }
        if cli_output_dir.is_some() {
            self.output_dir = cli_output_dir;
        }
        self
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            api_base: self.api_base.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            ..ClientSettings::default()
        }
    }

    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("output")
        })
    }
}
