//! OpenAI Whisper transcription implementation.

use super::{Transcript, TranscriptSegment};
use crate::audio::split_audio;
use crate::error::{HowieError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_openai::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
    chunk_duration_seconds: u32,
}

impl WhisperTranscriber {
    pub fn with_config(model: &str, chunk_duration_seconds: u32, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            model: model.to_string(),
            chunk_duration_seconds,
        })
    }

    /// Transcribe an audio file, splitting it when it is longer than one chunk.
    ///
    /// Chunks are sent one after another and their timestamps shifted back onto the
    /// original timeline.
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    pub async fn transcribe(&self, audio_path: &Path) -> Result<Transcript> {
        let temp_dir = tempfile::tempdir()?;
        let chunks = split_audio(audio_path, temp_dir.path(), self.chunk_duration_seconds).await?;
        let chunk_count = chunks.len();
        info!("Transcribing {} audio chunk(s) with {}", chunk_count, self.model);

        let mut segments = Vec::new();
        for (idx, (chunk_path, offset)) in chunks.into_iter().enumerate() {
            let chunk_segments = self
                .transcribe_single(&chunk_path)
                .await
                .map_err(|e| with_chunk_context(e, idx, chunk_count, offset))?;
            segments.extend(chunk_segments.into_iter().map(|s| s.shifted(offset)));
        }

        Ok(Transcript::new(segments))
    }

    /// Transcribe a single audio file (no splitting).
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson)
            .build()
            .map_err(|e| HowieError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| HowieError::ServiceUnavailable(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = response
            .segments
            .map(|segs| {
                segs.iter()
                    .map(|s| {
                        TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim().to_string())
                    })
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![TranscriptSegment::new(
                    0.0,
                    response.duration as f64,
                    response.text.trim().to_string(),
                )]
            });

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}

/// Say which chunk a Whisper outage hit. Local failures keep their own kind.
fn with_chunk_context(err: HowieError, idx: usize, count: usize, offset: f64) -> HowieError {
    match err {
        HowieError::ServiceUnavailable(msg) => HowieError::ServiceUnavailable(format!(
            "chunk {}/{} at {:.0}s: {}",
            idx + 1,
            count,
            offset,
            msg
        )),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outage_is_tagged_with_chunk() {
        let err = with_chunk_context(
            HowieError::ServiceUnavailable("Whisper API error: 502".to_string()),
            1,
            3,
            600.0,
        );
        assert!(err.is_service_unavailable());
        assert!(err.to_string().contains("chunk 2/3 at 600s: Whisper API error: 502"));
    }

    #[tokio::test]
    async fn test_unreadable_chunk_stays_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            WhisperTranscriber::with_config("whisper-1", 600, Duration::from_secs(5)).unwrap();

        let err = transcriber
            .transcribe_single(&dir.path().join("missing.mp3"))
            .await
            .unwrap_err();
        let err = with_chunk_context(err, 0, 1, 0.0);

        assert!(matches!(err, HowieError::Io(_)));
        assert!(!err.is_service_unavailable());
    }
}
