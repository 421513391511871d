use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::RegexSet;
use tokio::process::Command;
use tracing::debug;

use super::ffprobe::FfprobeOutput;
use crate::error::ToolError;

/// Decoder stderr lines that do not indicate damage.
static IGNORABLE_DECODER_LINES: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)Last message repeated",
        r"(?i)Discarding ID3 tags",
        r"(?i)deprecated pixel format",
        r"(?i)Consider increasing the -probesize",
    ])
    .expect("ignorable decoder patterns should compile")
});

/// Portion of a file to decode. `None` fields mean "from the start" and
/// "to the end".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DecodeWindow {
    pub start_seconds: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl DecodeWindow {
    pub fn sample(start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            start_seconds: Some(start_seconds),
            duration_seconds: Some(duration_seconds),
        }
    }

    pub fn whole_file() -> Self {
        Self::default()
    }
}

/// Result of one decode run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Clean,
    /// Non-zero exit or decoder errors; never empty.
    Failed(Vec<String>),
    TimedOut,
}

/// The external metadata-probe and decode-test commands.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<FfprobeOutput, ToolError>;

    async fn decode(
        &self,
        path: &str,
        window: DecodeWindow,
        timeout: Duration,
    ) -> DecodeOutcome;
}

/// Keeps the stderr lines that count as decode errors.
pub fn filter_decoder_errors(stderr: &str) -> Vec<String> {
    stderr
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !IGNORABLE_DECODER_LINES.is_match(line))
        .map(str::to_string)
        .collect()
}

/// Interprets a finished decode run.
pub fn decode_outcome(exit_code: Option<i32>, stderr: &str) -> DecodeOutcome {
    let errors = filter_decoder_errors(stderr);
    let exited_cleanly = exit_code == Some(0);
    match (exited_cleanly, errors.is_empty()) {
        (true, true) => DecodeOutcome::Clean,
        (_, false) => DecodeOutcome::Failed(errors),
        (false, true) => {
            let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
            DecodeOutcome::Failed(vec![format!("ffmpeg exited with code {code}")])
        }
    }
}

/// `ffprobe`/`ffmpeg` subprocesses. Timed-out children are killed.
#[derive(Debug, Clone)]
pub struct FfmpegTools {
    ffprobe: String,
    ffmpeg: String,
}

impl FfmpegTools {
    pub fn new(ffprobe: impl Into<String>, ffmpeg: impl Into<String>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
            ffmpeg: ffmpeg.into(),
        }
    }

    fn decode_args(path: &str, window: DecodeWindow) -> Vec<String> {
        let mut args = vec!["-v".to_string(), "error".to_string()];
        if let Some(start) = window.start_seconds {
            args.extend(["-ss".to_string(), format!("{start:.3}")]);
        }
        args.extend(["-i".to_string(), path.to_string()]);
        if let Some(duration) = window.duration_seconds.filter(|d| *d > 0.0) {
            args.extend(["-t".to_string(), format!("{duration:.3}")]);
        }
        args.extend(["-f", "null", "-"].map(String::from));
        args
    }
}

impl Default for FfmpegTools {
    fn default() -> Self {
        Self::new("ffprobe", "ffmpeg")
    }
}

#[async_trait]
impl MediaProbe for FfmpegTools {
    async fn probe(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<FfprobeOutput, ToolError> {
        let child = Command::new(&self.ffprobe)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: self.ffprobe.clone(),
                source,
            })?;

        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout {
                tool: "ffprobe".to_string(),
                seconds: timeout.as_secs(),
            })?
            .map_err(|source| ToolError::Spawn {
                tool: self.ffprobe.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: "ffprobe".to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        FfprobeOutput::parse(&output.stdout)
    }

    async fn decode(
        &self,
        path: &str,
        window: DecodeWindow,
        timeout: Duration,
    ) -> DecodeOutcome {
        let args = Self::decode_args(path, window);
        debug!(path, ?window, "running decode test");
        let child = match Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                return DecodeOutcome::Failed(vec![format!(
                    "failed to spawn {}: {err}",
                    self.ffmpeg
                )]);
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Err(_) => DecodeOutcome::TimedOut,
            Ok(Err(err)) => DecodeOutcome::Failed(vec![err.to_string()]),
            Ok(Ok(output)) => decode_outcome(
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            ),
        }
    }
}
