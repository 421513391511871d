//! File integrity validation: probe, sanity checks and sampled decoding.

pub mod ffprobe;
mod quality;
mod stereo;
mod tools;
mod validator;

pub use quality::ResolutionTier;
pub use stereo::detect_3d;
pub use tools::{
    DecodeOutcome, DecodeWindow, FfmpegTools, MediaProbe, decode_outcome,
    filter_decoder_errors,
};
pub use validator::Validator;
