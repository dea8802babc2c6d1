//! Speech transcription of the video's audio track.

mod models;
mod whisper;

pub use models::{format_timestamp, Transcript, TranscriptSegment};
pub use whisper::WhisperTranscriber;
