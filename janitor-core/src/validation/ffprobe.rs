//! ffprobe JSON output (`-print_format json -show_format -show_streams`).

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ToolError;

/// `ffprobe -print_format json -show_format -show_streams` output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
    #[serde(default)]
    pub format: FfprobeFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeStream {
    #[serde(default)]
    pub codec_name: Option<String>,
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub bit_rate: Option<String>,
    #[serde(default)]
    pub stereo_mode: Option<String>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    #[serde(default)]
    pub side_data_list: Vec<FfprobeSideData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeSideData {
    #[serde(default)]
    pub side_data_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FfprobeFormat {
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub bit_rate: Option<String>,
    #[serde(default)]
    pub format_name: Option<String>,
}

impl FfprobeOutput {
    pub fn parse(stdout: &[u8]) -> Result<Self, ToolError> {
        serde_json::from_slice(stdout).map_err(|source| ToolError::Parse {
            tool: "ffprobe".to_string(),
            source,
        })
    }

    /// First video stream.
    pub fn video(&self) -> Option<&FfprobeStream> {
        self.streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
    }

    /// Container duration, falling back to the video stream's.
    pub fn duration_seconds(&self) -> Option<f64> {
        parse_number(self.format.duration.as_deref()).or_else(|| {
            self.video().and_then(|v| parse_number(v.duration.as_deref()))
        })
    }

    /// Video stream bitrate, falling back to the overall container bitrate.
    pub fn video_bitrate_kbps(&self) -> Option<u64> {
        self.video()
            .and_then(|v| parse_number(v.bit_rate.as_deref()))
            .or_else(|| parse_number(self.format.bit_rate.as_deref()))
            .map(|bps| (bps / 1000.0) as u64)
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "aac", "codec_type": "audio",
             "bit_rate": "128000"},
            {"index": 1, "codec_name": "h264", "codec_type": "video",
             "width": 1920, "height": 1080, "duration": "5400.5",
             "tags": {"language": "eng"}}
        ],
        "format": {"duration": "5400.250000", "bit_rate": "4500000",
                   "format_name": "matroska,webm"}
    }"#;

    #[test]
    fn picks_video_stream_and_falls_back_to_format_bitrate() {
        let output = FfprobeOutput::parse(SAMPLE.as_bytes()).expect("parse");
        let video = output.video().expect("video stream");
        assert_eq!(video.codec_name.as_deref(), Some("h264"));
        assert_eq!(output.duration_seconds(), Some(5400.25));
        assert_eq!(output.video_bitrate_kbps(), Some(4500));
    }

    #[test]
    fn duration_falls_back_to_stream() {
        let json = r#"{"streams": [{"codec_type": "video", "duration": "12.5",
            "bit_rate": "800000"}], "format": {}}"#;
        let output = FfprobeOutput::parse(json.as_bytes()).expect("parse");
        assert_eq!(output.duration_seconds(), Some(12.5));
        assert_eq!(output.video_bitrate_kbps(), Some(800));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = FfprobeOutput::parse(b"not json").expect_err("should fail");
        assert!(matches!(err, ToolError::Parse { .. }));
    }
}
