//! Local audio handling for video analysis.

mod ffmpeg;

pub use ffmpeg::{check_tools, extract_audio, probe_duration, split_audio};
