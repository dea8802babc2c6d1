//! Turning a video file into raw structured-summary output from a model.

use crate::audio::{check_tools, extract_audio};
use crate::config::{Prompts, Settings};
use crate::error::{HowieError, Result};
use crate::openai::create_client_with_timeout;
use crate::transcription::WhisperTranscriber;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Produces the raw structured summary of a video.
///
/// Implementations return the model text as-is; validation happens in
/// [`VideoAnalysis::from_model_output`](super::VideoAnalysis::from_model_output).
#[async_trait]
pub trait VideoAnalyzer: Send + Sync {
    async fn analyze(&self, video: &Path) -> Result<String>;
}

/// Analyzer that transcribes the audio track with Whisper and asks a chat model for
/// the summary and key actions.
pub struct OpenAIVideoAnalyzer {
    client: Client<OpenAIConfig>,
    transcriber: WhisperTranscriber,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIVideoAnalyzer {
    pub fn new(settings: &Settings, prompts: Prompts) -> Result<Self> {
        let timeout = Duration::from_secs(settings.llm.request_timeout_seconds);
        let transcriber = WhisperTranscriber::with_config(
            &settings.video_analysis.transcription_model,
            settings.video_analysis.segment_seconds,
            timeout,
        )?;

        Ok(Self {
            client: create_client_with_timeout(timeout)?,
            transcriber,
            model: settings.llm.model_name.clone(),
            temperature: settings.video_analysis.temperature,
            prompts,
        })
    }

    async fn summarize(&self, transcript: &str) -> Result<String> {
        let mut vars = HashMap::new();
        vars.insert("transcript".to_string(), transcript.to_string());
        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.video_analysis.structured_summary, &vars);
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.video_analysis.system, &HashMap::new());

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| HowieError::InvalidInput(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| HowieError::InvalidInput(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| HowieError::InvalidInput(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| HowieError::ServiceUnavailable(format!("Video analysis error: {}", e)))?;

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl VideoAnalyzer for OpenAIVideoAnalyzer {
    #[instrument(skip(self), fields(video = %video.display()))]
    async fn analyze(&self, video: &Path) -> Result<String> {
        // Only reached on a summary cache miss, so a cached video needs no ffmpeg.
        check_tools().await?;

        let work_dir = tempfile::tempdir()?;
        let audio = extract_audio(video, work_dir.path()).await?;

        let transcript = self.transcriber.transcribe(&audio).await?;
        if transcript.is_empty() {
            return Err(HowieError::SchemaValidation(
                "video has no speech to summarize".to_string(),
            ));
        }
        info!(
            "Transcribed {} segments ({:.0}s), requesting structured summary",
            transcript.segments.len(),
            transcript.duration_seconds
        );

        self.summarize(&transcript.format_with_timestamps()).await
    }
}
