//! Stereoscopic (3D) content detection.

use once_cell::sync::Lazy;
use regex::Regex;

use super::ffprobe::FfprobeOutput;

static FILENAME_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"[.\-_ ]3D[.\-_ ]",
        r"[.\-_ ]H?[.\-]?SBS[.\-_ ]",
        r"[.\-_ ]H?[.\-]?OU[.\-_ ]",
        r"[.\-_ ]H?TAB[.\-_ ]",
        r"Side[.\-_ ]?by[.\-_ ]?Side",
        r"Half[.\-_ ]?(?:SBS|OU)",
        r"[.\-_ ]MVC[.\-_ ]",
        r"Blu[.\-_ ]?Ray[.\-_ ]?3D",
        r"3D[.\-_ ]?BluRay",
    ]
    .into_iter()
    .map(|pattern| {
        Regex::new(&format!("(?i){pattern}"))
            .expect("3D filename marker should compile")
    })
    .collect()
});

/// Returns a short description of why the file looks stereoscopic.
pub fn detect_3d(path: &str, probe: &FfprobeOutput) -> Option<String> {
    from_filename(path)
        .map(|marker| format!("filename:{marker}"))
        .or_else(|| from_metadata(probe))
        .or_else(|| from_aspect_ratio(probe))
}

fn from_filename(path: &str) -> Option<String> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    FILENAME_MARKERS.iter().find_map(|re| {
        re.find(file_name).map(|m| {
            m.as_str()
                .trim_matches(|c| matches!(c, '.' | '-' | '_' | ' '))
                .to_string()
        })
    })
}

fn from_metadata(probe: &FfprobeOutput) -> Option<String> {
    let video = probe.video()?;
    if let Some(mode) = video.stereo_mode.as_deref().filter(|m| !m.is_empty()) {
        return Some(format!("stereo_mode:{mode}"));
    }
    let mut tags: Vec<(&String, &String)> = video.tags.iter().collect();
    tags.sort();
    if let Some((key, value)) = tags.into_iter().find(|(key, _)| {
        let key = key.to_ascii_lowercase();
        key.contains("stereo") || key.contains("3d")
    }) {
        return Some(format!("{key}:{value}"));
    }
    video.side_data_list.iter().find_map(|side| {
        let kind = side.side_data_type.as_deref()?;
        let lower = kind.to_ascii_lowercase();
        (lower.contains("stereo") || lower.contains("3d"))
            .then(|| format!("side_data:{kind}"))
    })
}

fn from_aspect_ratio(probe: &FfprobeOutput) -> Option<String> {
    let video = probe.video()?;
    let (width, height) = (video.width?, video.height?);
    if width == 0 || height == 0 {
        return None;
    }
    let ratio = f64::from(width) / f64::from(height);
    if ratio >= 3.2 {
        Some(format!("SBS-aspect({width}x{height}, ratio={ratio:.2})"))
    } else if ratio <= 1.0 && height >= 1080 {
        Some(format!("OU-aspect({width}x{height}, ratio={ratio:.2})"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ffprobe::FfprobeStream;

    fn video(width: u32, height: u32) -> FfprobeOutput {
        FfprobeOutput {
            streams: vec![FfprobeStream {
                codec_type: Some("video".into()),
                width: Some(width),
                height: Some(height),
                ..FfprobeStream::default()
            }],
            ..FfprobeOutput::default()
        }
    }

    #[test]
    fn filename_markers() {
        let probe = video(1920, 1080);
        assert_eq!(
            detect_3d("/m/Avatar.2009.3D.HSBS.1080p.mkv", &probe).as_deref(),
            Some("filename:3D")
        );
        assert_eq!(
            detect_3d("/m/Movie.Half-SBS.mkv", &probe).as_deref(),
            Some("filename:SBS")
        );
        assert!(detect_3d("/m/3Days.to.Kill.2014.mkv", &probe).is_none());
    }

    #[test]
    fn stream_metadata() {
        let mut probe = video(1920, 1080);
        probe.streams[0].stereo_mode = Some("left_right".into());
        assert_eq!(
            detect_3d("/m/a.mkv", &probe).as_deref(),
            Some("stereo_mode:left_right")
        );
    }

    #[test]
    fn extreme_aspect_ratios() {
        assert!(
            detect_3d("/m/a.mkv", &video(3840, 1080))
                .is_some_and(|d| d.starts_with("SBS-aspect"))
        );
        assert!(
            detect_3d("/m/a.mkv", &video(1920, 2160))
                .is_some_and(|d| d.starts_with("OU-aspect"))
        );
        assert!(detect_3d("/m/a.mkv", &video(1440, 1080)).is_none());
        assert!(detect_3d("/m/a.mkv", &video(640, 640)).is_none());
    }
}
