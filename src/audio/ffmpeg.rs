//! Audio processing with ffmpeg and ffprobe.
//!
//! The video itself is never sent anywhere; its audio track is pulled out locally and
//! split into pieces small enough for the transcription endpoint.

use crate::error::{HowieError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Fails with `ToolNotFound` unless both ffmpeg and ffprobe run.
pub async fn check_tools() -> Result<()> {
    check_tool("ffmpeg").await?;
    check_tool("ffprobe").await
}

async fn check_tool(name: &str) -> Result<()> {
    let result = Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if status.success() => Ok(()),
        Ok(_) => Err(HowieError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HowieError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(HowieError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

/// Extracts the audio track of a video into `<output_dir>/<stem>.mp3`.
#[instrument(skip(output_dir), fields(video = %video.display()))]
pub async fn extract_audio(video: &Path, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let target = output_dir.join(format!("{}.mp3", stem));

    info!("Extracting audio track");

    let result = Command::new("ffmpeg")
        .arg("-i").arg(video)
        .arg("-vn")
        .arg("-ac").arg("1")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(&target)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(target),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(HowieError::AudioExtraction(format!("ffmpeg failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HowieError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(HowieError::AudioExtraction(format!("ffmpeg error: {e}"))),
    }
}

/// Splits an audio file into pieces of at most `chunk_seconds`.
///
/// Returns `(path, offset_seconds)` pairs in playback order. Audio shorter than one
/// chunk comes back as the original file at offset zero.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let offsets = segment_offsets(total_duration, chunk_seconds);
    if offsets.len() <= 1 {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::with_capacity(offsets.len());
    for (idx, (offset, length)) in offsets.into_iter().enumerate() {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        extract_segment(source, &segment_path, offset, length).await?;
        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// `(offset, length)` of every piece when cutting `total` seconds into `chunk_seconds`.
fn segment_offsets(total: f64, chunk_seconds: u32) -> Vec<(f64, f64)> {
    let chunk_len = chunk_seconds.max(1) as f64;
    if total <= chunk_len {
        return vec![(0.0, total)];
    }

    let mut offsets = Vec::new();
    let mut offset = 0.0;
    while offset < total {
        offsets.push((offset, chunk_len.min(total - offset)));
        offset += chunk_len;
    }
    offsets
}

/// Extracts a time range from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let copy_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_result {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(HowieError::AudioExtraction(format!("Segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(HowieError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(HowieError::AudioExtraction(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HowieError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(HowieError::AudioExtraction(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(HowieError::AudioExtraction(format!(
            "ffprobe could not read {}",
            path.display()
        )));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json_str: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|_| HowieError::AudioExtraction("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| HowieError::AudioExtraction("Could not determine audio duration".into()))
}
