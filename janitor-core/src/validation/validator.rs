use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use janitor_model::{TechnicalMetadata, ValidationResult};

use super::ffprobe::FfprobeOutput;
use super::quality::ResolutionTier;
use super::stereo::detect_3d;
use super::tools::{DecodeOutcome, DecodeWindow, MediaProbe};
use crate::config::{DeepScanMode, ValidationConfig};

const SHORT_DURATION_SECONDS: f64 = 60.0;

/// Staged integrity check of a single file.
///
/// Stages run in order: probe, optional 3D rejection, duration, bitrate,
/// sampled decode, full decode. A probe failure or 3D detection ends the
/// run. The start sample always runs when deep scanning; the middle and end
/// samples and the full decode only run while the file is still valid.
pub struct Validator {
    config: ValidationConfig,
    tools: Arc<dyn MediaProbe>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
enum SampleAt {
    Start,
    Middle,
    End,
}

impl SampleAt {
    fn label(self) -> &'static str {
        match self {
            SampleAt::Start => "start",
            SampleAt::Middle => "middle",
            SampleAt::End => "end",
        }
    }
}

impl Validator {
    pub fn new(config: ValidationConfig, tools: Arc<dyn MediaProbe>) -> Self {
        Self { config, tools }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Probes and sample-decodes `path`. Problems end up on the result,
    /// never as an error.
    pub async fn validate(&self, path: &str) -> ValidationResult {
        let mut result = ValidationResult::new(path);

        let probe = match self
            .tools
            .probe(path, self.config.probe_timeout())
            .await
        {
            Ok(probe) => probe,
            Err(err) => {
                warn!(path, error = %err, "ffprobe failed");
                result.timed_out = err.is_timeout();
                result.fail(format!("ffprobe failed: {err}"));
                return result;
            }
        };
        result.metadata = extract_metadata(&probe);

        if self.config.reject_3d
            && let Some(detection) = detect_3d(path, &probe)
        {
            warn!(path, detection = %detection, "3D content detected");
            result.fail(format!("3D content detected: {detection}"));
            return result;
        }

        let duration = result.metadata.duration_seconds;
        if self.config.check_duration_sanity
            && let Some(duration) = duration
        {
            self.check_duration(&mut result, duration);
        }

        if self.config.check_bitrate {
            self.check_bitrate(&mut result);
        }

        if self.config.deep_scan_enabled
            && let Some(duration) = duration
        {
            self.deep_scan(&mut result, path, duration).await;
        }

        if self.config.full_decode_enabled && result.valid {
            info!(path, "running full decode test");
            let outcome = self
                .tools
                .decode(
                    path,
                    DecodeWindow::whole_file(),
                    self.config.full_decode_timeout(),
                )
                .await;
            apply_decode(&mut result, outcome, "Full decode error");
        }

        if result.valid {
            info!(path, "validation passed");
        } else {
            warn!(path, errors = ?result.errors, timed_out = result.timed_out, "validation failed");
        }
        result
    }

    fn check_duration(&self, result: &mut ValidationResult, duration: f64) {
        let max_hours = self.config.max_duration_hours;
        if duration > max_hours * 3600.0 {
            warn!(
                path = %result.file_path,
                duration_hours = duration / 3600.0,
                max_hours,
                "duration sanity check failed"
            );
            result.fail(format!(
                "Duration {:.1}h exceeds max {}h",
                duration / 3600.0,
                max_hours
            ));
        }
        if duration < SHORT_DURATION_SECONDS {
            result.warn(format!("Duration is very short: {duration:.1}s"));
        }
    }

    fn check_bitrate(&self, result: &mut ValidationResult) {
        let meta = &result.metadata;
        let (Some(width), Some(height), Some(bitrate)) =
            (meta.width, meta.height, meta.video_bitrate_kbps)
        else {
            return;
        };
        if width == 0 || height == 0 || bitrate == 0 {
            return;
        }
        let tier = ResolutionTier::from_dimensions(width, height);
        let minimum = tier.min_bitrate_kbps(&self.config);
        if bitrate < minimum {
            debug!(path = %result.file_path, bitrate, %tier, minimum, "low bitrate");
            result.warn(format!(
                "Bitrate {bitrate}kbps is low for {tier} (minimum: {minimum}kbps)"
            ));
        }
    }

    async fn deep_scan(
        &self,
        result: &mut ValidationResult,
        path: &str,
        duration: f64,
    ) {
        let sample = self.config.sample_duration_seconds as f64;

        self.decode_sample(result, path, SampleAt::Start, 0.0, sample)
            .await;

        if self.config.deep_scan_mode != DeepScanMode::Full {
            return;
        }
        if result.valid && duration > sample * 3.0 {
            let start = duration / 2.0 - sample / 2.0;
            self.decode_sample(result, path, SampleAt::Middle, start, sample)
                .await;
        }
        if result.valid && duration > sample * 2.0 {
            let start = duration - sample;
            self.decode_sample(result, path, SampleAt::End, start, sample)
                .await;
        }
    }

    async fn decode_sample(
        &self,
        result: &mut ValidationResult,
        path: &str,
        at: SampleAt,
        start: f64,
        length: f64,
    ) {
        let outcome = self
            .tools
            .decode(
                path,
                DecodeWindow::sample(start, length),
                self.config.decode_timeout(),
            )
            .await;
        let prefix = format!("Decode error ({})", at.label());
        apply_decode(result, outcome, &prefix);
    }
}

fn apply_decode(
    result: &mut ValidationResult,
    outcome: DecodeOutcome,
    prefix: &str,
) {
    match outcome {
        DecodeOutcome::Clean => {}
        DecodeOutcome::Failed(errors) => {
            for error in errors {
                result.fail(format!("{prefix}: {error}"));
            }
        }
        DecodeOutcome::TimedOut => {
            result.timed_out = true;
            result.fail(format!("{prefix}: ffmpeg decode test timed out"));
        }
    }
}

fn extract_metadata(probe: &FfprobeOutput) -> TechnicalMetadata {
    let video = probe.video();
    TechnicalMetadata {
        duration_seconds: probe.duration_seconds(),
        width: video.and_then(|v| v.width),
        height: video.and_then(|v| v.height),
        video_bitrate_kbps: probe.video_bitrate_kbps(),
        video_codec: video.and_then(|v| v.codec_name.clone()),
        container: probe.format.format_name.clone(),
    }
}
