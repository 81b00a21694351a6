use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use frame_search_core::DEFAULT_SERVICE_URL;
use frame_search_engine::{EngineSettings, ProbeSettings, ServiceSettings};
use log::LevelFilter;
use serde::Deserialize;

use super::logging::LogDestination;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "frame_search.ron";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub service_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub probe_timeout_secs: u64,
    pub ffprobe_path: PathBuf,
    pub log: LogDestination,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            upload_timeout_secs: 600,
            probe_timeout_secs: 15,
            ffprobe_path: PathBuf::from("ffprobe"),
            log: LogDestination::File,
            log_level: "info".to_string(),
            log_file: PathBuf::from("./frame_search.log"),
        }
    }
}

impl AppConfig {
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            service: ServiceSettings {
                service_url: self.service_url.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                upload_timeout: Duration::from_secs(self.upload_timeout_secs),
                ..ServiceSettings::default()
            },
            probe: ProbeSettings {
                program: self.ffprobe_path.clone(),
                timeout: Duration::from_secs(self.probe_timeout_secs),
            },
        }
    }

    pub fn level_filter(&self) -> anyhow::Result<LevelFilter> {
        self.log_level
            .parse()
            .with_context(|| format!("invalid log_level {:?}", self.log_level))
    }
}

/// Loads the config file. A missing default file yields defaults; a missing
/// explicit file or a malformed one is an error.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            return Ok(AppConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("reading config {}", path.display()));
        }
    };

    let config: AppConfig =
        ron::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    if config.service_url.trim().is_empty() {
        bail!("config {}: service_url must not be empty", path.display());
    }
    Ok(config)
}
