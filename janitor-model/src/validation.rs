//! Validator output.

/// Technical details extracted from the probe stage.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TechnicalMetadata {
    pub duration_seconds: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub video_bitrate_kbps: Option<u64>,
    pub video_codec: Option<String>,
    pub container: Option<String>,
}

/// Result of validating one file.
///
/// `valid` is true only when `errors` is empty. `timed_out` marks a probe
/// or decode stage that hit its deadline; such a result says nothing about
/// the file's health and callers must not persist it as a verdict.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidationResult {
    pub file_path: String,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: TechnicalMetadata,
    #[cfg_attr(feature = "serde", serde(default))]
    pub timed_out: bool,
}

impl ValidationResult {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            valid: true,
            ..Self::default()
        }
    }

    /// Records a hard failure. Any error invalidates the file.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.valid = false;
    }

    pub fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}
