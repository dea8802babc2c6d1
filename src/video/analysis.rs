//! The structured analysis of a video: a summary plus timestamped key actions.

use crate::error::{HowieError, Result};
use serde::{Deserialize, Serialize};

/// Summary and key actions of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    /// A brief summary of the video content.
    pub summary: String,
    /// Key actions observed in the video, in order.
    pub actions: Vec<VideoAction>,
}

/// A single action and where it happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAction {
    /// Description of the action.
    pub action: String,
    /// Seconds from the start of the video.
    pub timestamp: f64,
}

impl VideoAnalysis {
    /// Validate raw model output against the analysis schema.
    ///
    /// Tolerates prose or a markdown fence around the object, but the object itself
    /// must carry `summary` and `actions` with the right types.
    pub fn from_model_output(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(HowieError::SchemaValidation(
                "model returned an empty response".to_string(),
            ));
        }

        let json_str = match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if end > start => &trimmed[start..=end],
            _ => {
                return Err(HowieError::SchemaValidation(format!(
                    "response is not a JSON object: {}",
                    preview(trimmed)
                )))
            }
        };

        let analysis: VideoAnalysis = serde_json::from_str(json_str).map_err(|e| {
            HowieError::SchemaValidation(format!("{}. Response was: {}", e, preview(trimmed)))
        })?;

        if let Some(bad) = analysis
            .actions
            .iter()
            .find(|a| !a.timestamp.is_finite() || a.timestamp < 0.0)
        {
            return Err(HowieError::SchemaValidation(format!(
                "action '{}' has an invalid timestamp {}",
                bad.action, bad.timestamp
            )));
        }

        Ok(analysis)
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(500) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
