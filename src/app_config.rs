use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// External media tool settings
    #[serde(default)]
    pub tool: ToolConfig,

    /// Hand the produced video to the platform opener after a successful cut
    #[serde(default = "default_true")]
    pub open_result: bool,

    /// Opener executables, first one found on PATH wins
    #[serde(default = "default_opener_candidates")]
    pub opener_candidates: Vec<String>,

    /// Session state carried between runs
    #[serde(default)]
    pub session: SessionConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// External media tool configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolConfig {
    /// Executable names tried in order on the search path
    #[serde(default = "default_tool_candidates")]
    pub candidates: Vec<String>,

    /// Kill the tool after this many seconds, 0 disables the limit
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            candidates: default_tool_candidates(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ToolConfig {
    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<std::time::Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.timeout_secs))
        }
    }
}

/// Explicit session state for the path pickers
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SessionConfig {
    /// Directory the last file was picked from
    #[serde(default)]
    pub last_dir: Option<PathBuf>,
}

impl SessionConfig {
    /// Directory relative picks are resolved against: the last used
    /// directory, else the working directory, else home
    pub fn start_dir(&self) -> PathBuf {
        if let Some(dir) = self.last_dir.as_ref().filter(|d| d.is_dir()) {
            return dir.clone();
        }
        std::env::current_dir()
            .ok()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn remember<P: AsRef<Path>>(&mut self, dir: P) {
        self.last_dir = Some(dir.as_ref().to_path_buf());
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tool_candidates() -> Vec<String> {
    vec!["ffmpeg".to_string(), "avconv".to_string()]
}

fn default_timeout_secs() -> u64 {
    3600 // 1 hour, stream copies of feature-length files finish well within it
}

fn default_opener_candidates() -> Vec<String> {
    if cfg!(target_os = "macos") {
        vec!["open".to_string()]
    } else if cfg!(target_os = "windows") {
        vec!["explorer".to_string()]
    } else {
        vec!["xdg-open".to_string(), "gio".to_string()]
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.tool.candidates.iter().all(|c| c.trim().is_empty()) {
            return Err(anyhow!("At least one media tool candidate is required"));
        }

        if self.open_result && self.opener_candidates.is_empty() {
            warn!("open_result is set but no opener candidates are configured");
        }

        Ok(())
    }

    /// Default location: `<config dir>/quickcut/config.json`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quickcut")
            .join("config.json")
    }

    /// Load the configuration, creating a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            let config: Config = serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            debug!("Loaded configuration from {}", path.display());
            return Ok(config);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            tool: ToolConfig::default(),
            open_result: true,
            opener_candidates: default_opener_candidates(),
            session: SessionConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
