use std::fmt;

use crate::config::ValidationConfig;

/// Resolution bucket by pixel count, with 20% slack below each nominal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    Sd,
    Hd720,
    Hd1080,
    Uhd4k,
}

impl ResolutionTier {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let pixels = f64::from(width) * f64::from(height);
        let at_least = |w: f64, h: f64| pixels >= w * h * 0.8;
        if at_least(3840.0, 2160.0) {
            ResolutionTier::Uhd4k
        } else if at_least(1920.0, 1080.0) {
            ResolutionTier::Hd1080
        } else if at_least(1280.0, 720.0) {
            ResolutionTier::Hd720
        } else {
            ResolutionTier::Sd
        }
    }

    pub fn min_bitrate_kbps(self, config: &ValidationConfig) -> u64 {
        match self {
            ResolutionTier::Sd => config.min_bitrate_sd,
            ResolutionTier::Hd720 => config.min_bitrate_720p,
            ResolutionTier::Hd1080 => config.min_bitrate_1080p,
            ResolutionTier::Uhd4k => config.min_bitrate_4k,
        }
    }
}

impl fmt::Display for ResolutionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolutionTier::Sd => "sd",
            ResolutionTier::Hd720 => "720p",
            ResolutionTier::Hd1080 => "1080p",
            ResolutionTier::Uhd4k => "4k",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_allow_cropped_frames() {
        assert_eq!(
            ResolutionTier::from_dimensions(3840, 1600),
            ResolutionTier::Hd1080
        );
        assert_eq!(
            ResolutionTier::from_dimensions(3840, 2160),
            ResolutionTier::Uhd4k
        );
        assert_eq!(
            ResolutionTier::from_dimensions(1920, 800),
            ResolutionTier::Hd720
        );
        assert_eq!(ResolutionTier::from_dimensions(720, 480), ResolutionTier::Sd);
    }

    #[test]
    fn thresholds_follow_config() {
        let config = ValidationConfig::default();
        assert_eq!(ResolutionTier::Sd.min_bitrate_kbps(&config), 500);
        assert_eq!(ResolutionTier::Uhd4k.min_bitrate_kbps(&config), 8000);
        assert_eq!(ResolutionTier::Hd1080.to_string(), "1080p");
    }
}
