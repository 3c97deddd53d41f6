/*!
 * External media tool capabilities.
 *
 * The reconciler only needs two things from the outside world: the duration
 * of an audio file, and a way to write a copy of it (either untouched or
 * tempo-adjusted). Both are expressed as traits so that tests can substitute
 * fakes; `FfmpegTools` implements them on top of ffprobe and ffmpeg.
 */

use std::ffi::OsStr;
use std::path::Path;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use tokio::process::Command;

use crate::app_config::MediaToolsConfig;
use crate::errors::MediaError;

/// Reads the duration of a media file
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Duration of the file in seconds
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError>;
}

/// Writes a copy of an audio file, optionally with its tempo changed
#[async_trait]
pub trait MediaTempoTransform: Send + Sync {
    /// Apply a chain of tempo multipliers, each within the tool's per-stage range
    async fn apply_tempo(&self, input: &Path, output: &Path, stages: &[f64]) -> Result<(), MediaError>;

    /// Copy the streams without re-encoding
    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), MediaError>;
}

#[async_trait]
impl<T: MediaProbe + ?Sized> MediaProbe for &T {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        (**self).probe_duration(path).await
    }
}

#[async_trait]
impl<T: MediaTempoTransform + ?Sized> MediaTempoTransform for &T {
    async fn apply_tempo(&self, input: &Path, output: &Path, stages: &[f64]) -> Result<(), MediaError> {
        (**self).apply_tempo(input, output, stages).await
    }

    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        (**self).stream_copy(input, output).await
    }
}

/// Build an `atempo` filter chain, e.g. `atempo=2,atempo=1.25`
pub fn atempo_filter(stages: &[f64]) -> Result<String, MediaError> {
    if stages.is_empty() {
        return Err(MediaError::InvalidTempo("no tempo stages".to_string()));
    }

    if let Some(bad) = stages.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(MediaError::InvalidTempo(format!("stage {} is not a positive number", bad)));
    }

    Ok(stages
        .iter()
        .map(|s| format!("atempo={}", s))
        .collect::<Vec<_>>()
        .join(","))
}

/// ffprobe/ffmpeg backed media tools
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::new(&MediaToolsConfig::default())
    }
}

impl FfmpegTools {
    pub fn new(config: &MediaToolsConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    // Run a tool to completion, bounded by the configured timeout
    async fn run(&self, program: &str, args: &[&OsStr]) -> Result<Output, MediaError> {
        debug!("Running {} {:?}", program, args);

        let future = Command::new(program).args(args).kill_on_drop(true).output();

        let output = tokio::select! {
            result = future => {
                result.map_err(|e| MediaError::Spawn {
                    tool: program.to_string(),
                    message: e.to_string(),
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(MediaError::Timeout {
                    tool: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", program, filtered);
            return Err(MediaError::Failed {
                tool: program.to_string(),
                code: output.status.code(),
                stderr: filtered,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaProbe for FfmpegTools {
    async fn probe_duration(&self, path: &Path) -> Result<f64, MediaError> {
        let output = self
            .run(
                &self.ffprobe_path,
                &[
                    OsStr::new("-v"),
                    OsStr::new("error"),
                    OsStr::new("-show_entries"),
                    OsStr::new("format=duration"),
                    OsStr::new("-of"),
                    OsStr::new("default=noprint_wrappers=1:nokey=1"),
                    path.as_os_str(),
                ],
            )
            .await?;

        parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl MediaTempoTransform for FfmpegTools {
    async fn apply_tempo(&self, input: &Path, output: &Path, stages: &[f64]) -> Result<(), MediaError> {
        let filter = atempo_filter(stages)?;
        debug!("Applying tempo chain '{}' to {}", filter, input.display());

        self.run(
            &self.ffmpeg_path,
            &[
                OsStr::new("-y"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-filter:a"),
                OsStr::new(&filter),
                output.as_os_str(),
            ],
        )
        .await?;

        Ok(())
    }

    async fn stream_copy(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        self.run(
            &self.ffmpeg_path,
            &[
                OsStr::new("-y"),
                OsStr::new("-i"),
                input.as_os_str(),
                OsStr::new("-c"),
                OsStr::new("copy"),
                output.as_os_str(),
            ],
        )
        .await?;

        Ok(())
    }
}

/// Interpret ffprobe's bare `format=duration` output
pub fn parse_probe_duration(stdout: &str) -> Result<f64, MediaError> {
    let value = stdout.trim();
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| MediaError::UnparseableOutput {
            tool: "ffprobe".to_string(),
            output: value.to_string(),
        })
}

/// Keep only meaningful ffmpeg diagnostic lines, dropping the version banner,
/// build configuration and stream metadata.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: [&str; 14] = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "encoder",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
