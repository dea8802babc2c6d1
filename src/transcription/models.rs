//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Individual transcript segments with timestamps.
    pub segments: Vec<TranscriptSegment>,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            segments,
            duration_seconds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }

    /// Format the transcript with timestamps, one segment per line.
    ///
    /// Timestamps are given in whole seconds as well so the model can echo them back
    /// as numbers.
    pub fn format_with_timestamps(&self) -> String {
        self.segments
            .iter()
            .map(|s| {
                format!(
                    "[{} - {} | {:.0}s] {}",
                    format_timestamp(s.start_seconds),
                    format_timestamp(s.end_seconds),
                    s.start_seconds,
                    s.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text,
        }
    }

    /// Shift the segment later by `offset` seconds.
    pub fn shifted(mut self, offset: f64) -> Self {
        self.start_seconds += offset;
        self.end_seconds += offset;
        self
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_creation() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 5.0, "Rinse the filter".to_string()),
            TranscriptSegment::new(5.0, 10.0, "Add the grounds".to_string()),
        ]);

        assert_eq!(transcript.duration_seconds, 10.0);
        assert!(!transcript.is_empty());
        assert!(Transcript::new(vec![]).is_empty());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.0), "01:05");
        assert_eq!(format_timestamp(3665.0), "01:01:05");
    }

    #[test]
    fn test_format_with_timestamps() {
        let transcript = Transcript::new(vec![
            TranscriptSegment::new(0.0, 4.2, "Hello".to_string()),
            TranscriptSegment::new(64.6, 70.0, "Pour slowly".to_string()),
        ]);
        assert_eq!(
            transcript.format_with_timestamps(),
            "[00:00 - 00:04 | 0s] Hello\n[01:04 - 01:10 | 65s] Pour slowly"
        );
    }

    #[test]
    fn test_shifted_segment() {
        let seg = TranscriptSegment::new(1.0, 2.5, "x".to_string()).shifted(600.0);
        assert_eq!(seg.start_seconds, 601.0);
        assert_eq!(seg.end_seconds, 602.5);
    }
}
