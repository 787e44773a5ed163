use std::path::Path;
use std::time::Duration;

use log::{debug, error, warn};
use serde_json::{from_str, Value};
use tokio::process::Command;

use crate::errors::CollaboratorError;
use crate::subtitle_model::CodecHint;

// @module: Container probing and track extraction via ffprobe/ffmpeg

/// Default extraction deadline (15 minutes); long remuxes of large
/// containers can take a while.
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 900;

/// Environment override for the extraction deadline, in seconds.
const EXTRACT_TIMEOUT_ENV: &str = "BISUBS_EXTRACT_TIMEOUT_SECS";

/// Probe deadline; listing streams is cheap.
const PROBE_TIMEOUT_SECS: u64 = 60;

/// One subtitle stream as reported by the container.
#[derive(Debug, Clone)]
pub struct SubtitleStream {
    /// Stream index within the container
    pub index: usize,
    /// Codec name as reported by ffprobe
    pub codec: String,
    /// Language tag from stream metadata, if any
    pub language: Option<String>,
    /// Stream title, if any
    pub title: Option<String>,
    /// Forced disposition flag
    pub forced: bool,
    /// Default disposition flag
    pub default: bool,
}

impl SubtitleStream {
    /// Codec family for this stream, when recognized.
    pub fn codec_hint(&self) -> Option<CodecHint> {
        CodecHint::from_name(&self.codec)
    }

    /// True for image-based streams that need OCR.
    pub fn is_bitmap(&self) -> bool {
        matches!(
            self.codec.as_str(),
            "hdmv_pgs_subtitle" | "dvd_subtitle" | "dvb_subtitle" | "xsub"
        )
    }
}

/// Target codec for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractCodec {
    Srt,
    Ass,
    Vtt,
    /// Raw copy of an image-based stream, for the OCR collaborator
    Pgs,
}

impl ExtractCodec {
    fn ffmpeg_args(&self) -> (&'static str, &'static str) {
        match self {
            Self::Srt => ("srt", "-c:s"),
            Self::Ass => ("ass", "-c:s"),
            Self::Vtt => ("webvtt", "-c:s"),
            Self::Pgs => ("copy", "-c:s"),
        }
    }
}

/// List the subtitle streams of a video container.
pub async fn list_subtitle_tracks(video_path: &Path) -> Result<Vec<SubtitleStream>, CollaboratorError> {
    if !video_path.exists() {
        return Err(CollaboratorError::Failed {
            name: "ffprobe",
            message: format!("video not found: {:?}", video_path),
        });
    }

    let probe_future = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "s",
            video_path.to_str().unwrap_or(""),
        ])
        .output();

    let output = tokio::select! {
        result = probe_future => result.map_err(|e| CollaboratorError::Failed {
            name: "ffprobe",
            message: e.to_string(),
        })?,
        _ = tokio::time::sleep(Duration::from_secs(PROBE_TIMEOUT_SECS)) => {
            return Err(CollaboratorError::Timeout { name: "ffprobe", seconds: PROBE_TIMEOUT_SECS });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        error!("ffprobe failed: {}", stderr);
        return Err(CollaboratorError::Failed {
            name: "ffprobe",
            message: stderr.into_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let json: Value = from_str(&stdout).map_err(|e| CollaboratorError::Failed {
        name: "ffprobe",
        message: format!("unparseable probe output: {}", e),
    })?;

    let mut tracks = Vec::new();
    if let Some(streams) = json.get("streams").and_then(|s| s.as_array()) {
        for stream in streams {
            let index = stream
                .get("index")
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(0);
            let codec = stream
                .get("codec_name")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string();
            let tags = stream.get("tags");
            let language = tags
                .and_then(|t| t.get("language"))
                .and_then(|l| l.as_str())
                .map(|s| s.to_string());
            let title = tags
                .and_then(|t| t.get("title"))
                .and_then(|l| l.as_str())
                .map(|s| s.to_string());
            let disposition = stream.get("disposition");
            let forced = disposition
                .and_then(|d| d.get("forced"))
                .and_then(|f| f.as_u64())
                .unwrap_or(0)
                == 1;
            let default = disposition
                .and_then(|d| d.get("default"))
                .and_then(|f| f.as_u64())
                .unwrap_or(0)
                == 1;

            tracks.push(SubtitleStream {
                index,
                codec,
                language,
                title,
                forced,
                default,
            });
        }
    }

    debug!(
        "Found {} subtitle stream(s) in {:?}",
        tracks.len(),
        video_path.file_name()
    );
    Ok(tracks)
}

/// Extract one subtitle stream to a file, converting to the target
/// codec. Honors the extraction deadline (overridable through the
/// `BISUBS_EXTRACT_TIMEOUT_SECS` environment variable).
pub async fn extract_track(
    video_path: &Path,
    stream_index: usize,
    out_path: &Path,
    target: ExtractCodec,
) -> Result<(), CollaboratorError> {
    let (codec_name, codec_flag) = target.ffmpeg_args();
    let timeout = extract_timeout();

    let ffmpeg_future = Command::new("ffmpeg")
        .args([
            "-y",
            "-i",
            video_path.to_str().unwrap_or_default(),
            "-map",
            &format!("0:{}", stream_index),
            codec_flag,
            codec_name,
            out_path.to_str().unwrap_or_default(),
        ])
        .output();

    let result = tokio::select! {
        result = ffmpeg_future => result.map_err(|e| CollaboratorError::Failed {
            name: "ffmpeg",
            message: e.to_string(),
        })?,
        _ = tokio::time::sleep(timeout) => {
            return Err(CollaboratorError::Timeout { name: "ffmpeg", seconds: timeout.as_secs() });
        }
    };

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        let filtered = filter_ffmpeg_stderr(&stderr);
        error!("Subtitle extraction failed: {}", filtered);
        return Err(CollaboratorError::Failed {
            name: "ffmpeg",
            message: filtered,
        });
    }

    let size = std::fs::metadata(out_path).map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        return Err(CollaboratorError::Failed {
            name: "ffmpeg",
            message: format!("extracted stream {} is empty", stream_index),
        });
    }
    Ok(())
}

fn extract_timeout() -> Duration {
    let seconds = std::env::var(EXTRACT_TIMEOUT_ENV)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_EXTRACT_TIMEOUT_SECS);
    if seconds != DEFAULT_EXTRACT_TIMEOUT_SECS {
        warn!("Extraction deadline overridden to {} s", seconds);
    }
    Duration::from_secs(seconds)
}

/// Keep the stderr lines that explain a failure.
///
/// ffmpeg's banner, build configuration, and input/output metadata
/// dumps all take the same shape: a section header followed by
/// indented continuation lines. Dropping the headers and everything
/// indented leaves the actual error lines, which ffmpeg prints flush
/// left outside any section.
fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const SECTION_HEADERS: [&str; 5] = [
        "ffmpeg version",
        "Input #",
        "Output #",
        "Stream mapping",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            !line.trim().is_empty()
                && !line.starts_with(char::is_whitespace)
                && !SECTION_HEADERS.iter().any(|h| line.starts_with(h))
        })
        .collect();

    if meaningful.is_empty() {
        "ffmpeg reported no usable error output".to_string()
    } else {
        meaningful.join("\n")
    }
}
