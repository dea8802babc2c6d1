//! Source documents built from the video analysis and the manual.

use crate::chunking::SentenceSplitter;
use crate::fingerprint::hash_bytes;
use crate::video::VideoAnalysis;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;

/// A unit of retrievable text with its citation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>, metadata: Value) -> Self {
        let metadata = match metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }

    /// Human-readable label for citing this document.
    pub fn label(&self) -> String {
        source_label(&self.metadata)
    }
}

/// Short stable id for a configured source path (first 6 hex chars of its SHA-256).
pub fn short_source_id(source_path: &str) -> String {
    hash_bytes(source_path.as_bytes())[..6].to_string()
}

/// One summary document plus one document per key action.
pub fn video_documents(video_path: &str, analysis: &VideoAnalysis) -> Vec<SourceDocument> {
    let h = short_source_id(video_path);

    let mut docs = Vec::with_capacity(analysis.actions.len() + 1);
    docs.push(SourceDocument::new(
        format!("video:{h}:0_summary"),
        analysis.summary.clone(),
        json!({ "source": "video_summary" }),
    ));

    for (i, action) in analysis.actions.iter().enumerate() {
        docs.push(SourceDocument::new(
            format!("video:{h}_action_{i}"),
            action.action.clone(),
            json!({ "source": "video_action", "timestamp": action.timestamp }),
        ));
    }
    docs
}

/// One document per chunk of the manual's text.
pub fn pdf_documents(
    pdf_path: &str,
    text: &str,
    splitter: &SentenceSplitter,
) -> Vec<SourceDocument> {
    let source_id = format!("pdf:{}:0", short_source_id(pdf_path));

    splitter
        .split_text(text)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            SourceDocument::new(
                format!("{source_id}_chunk_{i}"),
                chunk,
                json!({ "source_id": source_id, "file_name": pdf_path }),
            )
        })
        .collect()
}

/// Citation label: the file's base name when known, otherwise the source kind in
/// title case (`video_action` -> `Video Action`).
pub fn source_label(metadata: &Map<String, Value>) -> String {
    if let Some(file_name) = metadata.get("file_name").and_then(Value::as_str) {
        return Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
    }

    match metadata.get("source").and_then(Value::as_str) {
        Some(source) => source
            .split(['_', ' '])
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
        None => "Unknown source".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::VideoAction;

    fn analysis() -> VideoAnalysis {
        VideoAnalysis {
            summary: "Steve brews a pour-over.".to_string(),
            actions: vec![
                VideoAction {
                    action: "Weigh 22g of coffee".to_string(),
                    timestamp: 12.0,
                },
                VideoAction {
                    action: "Bloom for 45 seconds".to_string(),
                    timestamp: 61.5,
                },
            ],
        }
    }

    #[test]
    fn test_short_source_id_is_stable() {
        let a = short_source_id("data/steves-pour-over-method.mp4");
        assert_eq!(a.len(), 6);
        assert_eq!(a, short_source_id("data/steves-pour-over-method.mp4"));
        assert_ne!(a, short_source_id("data/manual.pdf"));
    }

    #[test]
    fn test_video_documents() {
        let path = "data/video.mp4";
        let h = short_source_id(path);
        let docs = video_documents(path, &analysis());

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, format!("video:{h}:0_summary"));
        assert_eq!(docs[0].text, "Steve brews a pour-over.");
        assert_eq!(docs[0].metadata["source"], "video_summary");

        assert_eq!(docs[2].id, format!("video:{h}_action_1"));
        assert_eq!(docs[2].text, "Bloom for 45 seconds");
        assert_eq!(docs[2].metadata["source"], "video_action");
        assert_eq!(docs[2].metadata["timestamp"], 61.5);
    }

    #[test]
    fn test_pdf_documents() {
        let splitter = SentenceSplitter::new(4, 1).unwrap();
        let path = "data/manual.pdf";
        let h = short_source_id(path);
        let docs = pdf_documents(path, "Fill the tank. Press the button. Wait.", &splitter);

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, format!("pdf:{h}:0_chunk_0"));
        assert_eq!(docs[1].id, format!("pdf:{h}:0_chunk_1"));
        assert_eq!(docs[0].metadata["source_id"], format!("pdf:{h}:0"));
        assert_eq!(docs[0].metadata["file_name"], path);
    }

    #[test]
    fn test_source_labels() {
        let docs = video_documents("v.mp4", &analysis());
        assert_eq!(docs[0].label(), "Video Summary");
        assert_eq!(docs[1].label(), "Video Action");

        let splitter = SentenceSplitter::new(256, 20).unwrap();
        let pdf = pdf_documents("data/manuals/brewer.pdf", "Clean weekly.", &splitter);
        assert_eq!(pdf[0].label(), "brewer.pdf");

        assert_eq!(source_label(&Map::new()), "Unknown source");
    }
}
