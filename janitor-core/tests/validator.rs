mod support;

use std::sync::Arc;

use janitor_core::config::{DeepScanMode, ValidationConfig};
use janitor_core::validation::{DecodeOutcome, Validator};

use support::fakes::ScriptedProbe;
use support::fixtures::{probe_json, validation_config};

const PATH: &str = "/media/movies/Heat (1995)/Heat.1995.mkv";

fn full_mode() -> ValidationConfig {
    ValidationConfig {
        deep_scan_mode: DeepScanMode::Full,
        ..validation_config()
    }
}

#[tokio::test]
async fn clean_file_passes_every_sample() {
    let probe = Arc::new(ScriptedProbe::with_default_probe(probe_json(7200.0)));
    let validator = Validator::new(full_mode(), probe.clone());

    let result = validator.validate(PATH).await;

    assert!(result.valid, "{:?}", result.errors);
    assert!(!result.timed_out);
    let starts: Vec<Option<f64>> = probe.decode_log().into_iter().map(|(_, s)| s).collect();
    assert_eq!(starts, [Some(0.0), Some(3585.0), Some(7170.0)]);
    assert_eq!(result.metadata.height, Some(1080));
    assert_eq!(result.metadata.video_codec.as_deref(), Some("h264"));
}

#[tokio::test]
async fn failing_start_sample_skips_the_rest() {
    let probe = Arc::new(ScriptedProbe::with_default_probe(probe_json(7200.0)));
    probe.script_decode(
        PATH,
        0.0,
        DecodeOutcome::Failed(vec!["[h264 @ 0x1] corrupt macroblock".to_string()]),
    );
    let validator = Validator::new(full_mode(), probe.clone());

    let result = validator.validate(PATH).await;

    assert!(!result.valid);
    assert_eq!(
        result.errors,
        ["Decode error (start): [h264 @ 0x1] corrupt macroblock"]
    );
    assert_eq!(probe.decode_log().len(), 1);
}

#[tokio::test]
async fn partial_mode_only_samples_the_start() {
    let probe = Arc::new(ScriptedProbe::with_default_probe(probe_json(7200.0)));
    let validator = Validator::new(validation_config(), probe.clone());

    assert!(validator.validate(PATH).await.valid);
    assert_eq!(probe.decode_log(), [(PATH.to_string(), Some(0.0))]);
}

#[tokio::test]
async fn decode_timeout_is_inconclusive() {
    let probe = Arc::new(ScriptedProbe::with_default_probe(probe_json(7200.0)));
    probe.script_decode(PATH, 0.0, DecodeOutcome::TimedOut);
    let validator = Validator::new(full_mode(), probe.clone());

    let result = validator.validate(PATH).await;

    assert!(result.timed_out);
    assert!(!result.valid);
    assert_eq!(probe.decode_log().len(), 1);
}

#[tokio::test]
async fn probe_timeout_is_inconclusive() {
    let probe = Arc::new(ScriptedProbe::default());
    probe.time_out_probe(PATH);
    let validator = Validator::new(validation_config(), probe.clone());

    let result = validator.validate(PATH).await;

    assert!(result.timed_out);
    assert!(!result.valid);
    assert!(probe.decode_log().is_empty());
}

#[tokio::test]
async fn unreadable_container_stops_at_probe() {
    let probe = Arc::new(ScriptedProbe::default());
    let validator = Validator::new(full_mode(), probe.clone());

    let result = validator.validate(PATH).await;

    assert!(!result.valid);
    assert!(!result.timed_out);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("ffprobe failed:"));
    assert!(probe.decode_log().is_empty());
}

#[tokio::test]
async fn duration_and_bitrate_checks() {
    let probe = Arc::new(ScriptedProbe::default());
    let too_long = "/m/long.mkv";
    let short = "/m/short.mkv";
    probe.script_probe(too_long, probe_json(13.0 * 3600.0));
    probe.script_probe(
        short,
        r#"{"streams": [{"codec_type": "video", "width": 1920, "height": 1080,
            "bit_rate": "900000"}], "format": {"duration": "42.0"}}"#
            .to_string(),
    );
    let validator = Validator::new(validation_config(), probe);

    let long = validator.validate(too_long).await;
    assert!(!long.valid);
    assert_eq!(long.errors, ["Duration 13.0h exceeds max 12h"]);

    let trailer = validator.validate(short).await;
    assert!(trailer.valid);
    assert_eq!(
        trailer.warnings,
        [
            "Duration is very short: 42.0s",
            "Bitrate 900kbps is low for 1080p (minimum: 3000kbps)",
        ]
    );
}

#[tokio::test]
async fn stereoscopic_files_are_rejected_when_enabled() {
    let probe = Arc::new(ScriptedProbe::with_default_probe(probe_json(7200.0)));
    let config = ValidationConfig {
        reject_3d: true,
        ..validation_config()
    };
    let validator = Validator::new(config, probe.clone());

    let result = validator.validate("/m/Avatar.2009.3D.HSBS.1080p.mkv").await;

    assert!(!result.valid);
    assert!(result.errors[0].starts_with("3D content detected: filename:"));
    assert!(probe.decode_log().is_empty());
}
