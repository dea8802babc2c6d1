//! Prompt templates for Howie.
//!
//! The built-in prompts can be overridden by a single TOML file whose sections mirror
//! the structs below (`[video_analysis]`, `[rag]`). Missing keys keep their defaults.

use crate::error::{HowieError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub video_analysis: VideoAnalysisPrompts,
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the structured video summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoAnalysisPrompts {
    pub system: String,
    pub structured_summary: String,
}

impl Default for VideoAnalysisPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video content analyst. You receive a timestamped transcript of an instructional video and describe what the viewer is shown.

Respond with a single JSON object and nothing else."#
                .to_string(),

            structured_summary: r#"Analyze the video transcript below.

Produce a JSON object with exactly these keys:
- "summary": a brief summary of the video content (2-4 sentences)
- "actions": an array of the key actions demonstrated, in order. Each item has:
  - "action": a short description of the action
  - "timestamp": the time in seconds where the action occurs (a number)

Only use timestamps that appear in the transcript. Do not invent steps that are not described.

Example:
{"summary": "A barista demonstrates a pour-over brew.", "actions": [{"action": "Rinse the paper filter with hot water", "timestamp": 12.5}]}

Transcript:
{{transcript}}"#
                .to_string(),
        }
    }
}

/// Prompts for RAG response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub qa_system_prompt: String,
    pub user: String,
    pub chat_system: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            qa_system_prompt: r#"You are Howie, a friendly assistant that helps people make a great cup of coffee.

Guidelines:
- Answer using only the provided context from the brewing video and the equipment manual
- When a step comes from the video, mention its timestamp as [MM:SS]
- When a detail comes from the manual, say so
- If the context doesn't contain the answer, say so clearly instead of guessing
- Be concise and practical"#
                .to_string(),

            user: r#"Question: {{question}}

Relevant excerpts from the knowledge base:

{{context}}

Please answer the question based on the above context."#
                .to_string(),

            chat_system: r#"You are Howie, a friendly assistant that helps people make a great cup of coffee.

In this conversation:
- Answer using the context from the brewing video and the equipment manual provided with each question
- Remember previous questions in the conversation for follow-ups
- Mention video timestamps as [MM:SS] when relevant
- If asked about something the context doesn't cover, say so honestly"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying an optional override file and custom variables.
    pub fn load(
        prompts_path: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = match prompts_path {
            Some(path) => {
                let path = PathBuf::from(shellexpand::tilde(path).to_string());
                if !path.exists() {
                    return Err(HowieError::Config(format!(
                        "Prompts file not found at: {}",
                        path.display()
                    )));
                }
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            None => Prompts::default(),
        };

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Look up a prompt by section and name.
    pub fn get_prompt(&self, section: &str, name: &str) -> Result<&str> {
        let prompt = match (section, name) {
            ("video_analysis", "system") => &self.video_analysis.system,
            ("video_analysis", "structured_summary") => &self.video_analysis.structured_summary,
            ("rag", "qa_system_prompt") => &self.rag.qa_system_prompt,
            ("rag", "user") => &self.rag.user,
            ("rag", "chat_system") => &self.rag.chat_system,
            _ => {
                return Err(HowieError::Config(format!(
                    "Prompt '{}' not found in section '{}'",
                    name, section
                )))
            }
        };
        Ok(prompt.as_str())
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are replaced in a single left-to-right pass: substituted values
    /// are never scanned again, and unknown `{{names}}` are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = &after[..end];
                    match vars.get(name) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(name);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    rest = &rest[start..];
                    break;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
