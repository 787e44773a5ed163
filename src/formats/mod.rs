/*!
 * Format adapters for the three supported text subtitle formats.
 *
 * Each adapter turns raw text into the shared track model and back:
 *
 * - `srt`: SubRip blocks, CRLF + UTF-8 BOM on write
 * - `ass`: ASS/SSA sections with style and comment passthrough
 * - `vtt`: WebVTT cues with NOTE/STYLE/REGION preservation
 *
 * Parsers are tolerant: malformed events are logged and skipped, the
 * rest of the track survives. `parse_file` runs encoding detection
 * before handing text to a parser.
 */

pub mod ass;
pub mod srt;
pub mod vtt;

use std::fs;
use std::path::Path;

use log::debug;

use crate::encoding_detector;
use crate::errors::InputError;
use crate::subtitle_model::{CodecHint, SourceKind, Track};

/// The text formats an adapter exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Srt,
    Ass,
    Ssa,
    Vtt,
}

impl FormatKind {
    /// Map a file extension to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "srt" => Some(Self::Srt),
            "ass" => Some(Self::Ass),
            "ssa" => Some(Self::Ssa),
            "vtt" | "webvtt" => Some(Self::Vtt),
            _ => None,
        }
    }

    /// Format for a path, by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
            Self::Ssa => "ssa",
            Self::Vtt => "vtt",
        }
    }

    fn codec_hint(&self) -> CodecHint {
        match self {
            Self::Srt => CodecHint::Srt,
            Self::Ass => CodecHint::Ass,
            Self::Ssa => CodecHint::Ssa,
            Self::Vtt => CodecHint::Vtt,
        }
    }
}

/// Parse raw bytes in the given format, detecting the encoding first.
///
/// `declared_encoding` short-circuits detection when the caller already
/// knows the encoding (e.g. from a previous probe of the same source).
pub fn parse_bytes(
    bytes: &[u8],
    kind: FormatKind,
    source_kind: SourceKind,
    declared_encoding: Option<&str>,
    origin: &Path,
) -> Result<Track, InputError> {
    let text = match declared_encoding.and_then(|label| {
        encoding_rs::Encoding::for_label(label.as_bytes())
    }) {
        Some(encoding) => {
            let (decoded, _, _) = encoding.decode(bytes);
            decoded.into_owned()
        }
        None => encoding_detector::decode(bytes, origin)?.text,
    };

    let track = match kind {
        FormatKind::Srt => srt::parse(&text, source_kind),
        FormatKind::Ass | FormatKind::Ssa => ass::parse(&text, source_kind, kind.codec_hint()),
        FormatKind::Vtt => vtt::parse(&text, source_kind),
    }
    .map_err(|e| InputError::UnsupportedFormat(e.to_string()))?;

    if track.events.is_empty() {
        return Err(InputError::EmptyTrack(origin.to_path_buf()));
    }
    debug!(
        "Parsed {} events from {:?} ({:?})",
        track.events.len(),
        origin.file_name(),
        kind
    );
    Ok(track)
}

/// Read and parse a subtitle file, inferring the format from the
/// extension and the encoding from the bytes.
pub fn parse_file(path: &Path, source_kind: SourceKind) -> Result<Track, InputError> {
    if !path.is_file() {
        return Err(InputError::FileNotFound(path.to_path_buf()));
    }
    let kind = FormatKind::from_path(path).ok_or_else(|| {
        InputError::UnsupportedFormat(path.to_string_lossy().into_owned())
    })?;
    let bytes =
        fs::read(path).map_err(|_| InputError::FileNotFound(path.to_path_buf()))?;
    let mut track = parse_bytes(&bytes, kind, source_kind, None, path)?;
    track.title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(track)
}

/// Serialize a track in the given format.
///
/// SRT and ASS outputs carry a UTF-8 BOM; VTT does not.
pub fn serialize(track: &Track, kind: FormatKind) -> Vec<u8> {
    match kind {
        FormatKind::Srt => srt::serialize(track),
        FormatKind::Ass | FormatKind::Ssa => ass::serialize(track),
        FormatKind::Vtt => vtt::serialize(track),
    }
}
