use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use client_logging::client_debug;
use serde::Deserialize;
use tokio::process::Command;

use crate::{EngineError, FailureKind};

#[async_trait::async_trait]
pub trait DurationProbe: Send + Sync {
    /// Playable duration of the media file in seconds.
    async fn probe(&self, path: &Path) -> Result<f64, EngineError>;
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub program: PathBuf,
    /// A file whose metadata does not resolve within this window fails the probe.
    pub timeout: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffprobe"),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Reads container duration through an external `ffprobe`.
#[derive(Debug, Clone, Default)]
pub struct FfprobeDurationProbe {
    settings: ProbeSettings,
}

impl FfprobeDurationProbe {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }
}

#[async_trait::async_trait]
impl DurationProbe for FfprobeDurationProbe {
    async fn probe(&self, path: &Path) -> Result<f64, EngineError> {
        let program = &self.settings.program;
        client_debug!("Probing {:?} with {:?}", path, program);

        let child = Command::new(program)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.settings.timeout, child)
            .await
            .map_err(|_| {
                EngineError::new(
                    FailureKind::Timeout,
                    format!("no metadata after {:?}", self.settings.timeout),
                )
            })?
            .map_err(|err| {
                EngineError::new(
                    FailureKind::Probe,
                    format!("failed to run {}: {err}", program.display()),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::new(
                FailureKind::Probe,
                format!("{} ({})", stderr.trim(), output.status),
            ));
        }

        parse_ffprobe_duration(&output.stdout)
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    duration: Option<String>,
}

/// Parses the JSON written by `ffprobe -show_entries format=duration -of json`.
pub fn parse_ffprobe_duration(stdout: &[u8]) -> Result<f64, EngineError> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|err| EngineError::new(FailureKind::Probe, err.to_string()))?;
    let raw = parsed
        .format
        .and_then(|format| format.duration)
        .ok_or_else(|| EngineError::new(FailureKind::Probe, "no duration in container metadata"))?;
    let duration: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::new(FailureKind::Probe, format!("unparsable duration {raw:?}")))?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(EngineError::new(
            FailureKind::Probe,
            format!("invalid duration {raw:?}"),
        ));
    }
    Ok(duration)
}
