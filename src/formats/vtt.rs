use anyhow::Result;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_model::{format_vtt_timestamp, CodecHint, Event, SourceKind, Track};

// @module: WebVTT parsing and serialization

// @const: VTT cue timing line, HH:MM:SS.mmm or MM:SS.mmm, with optional settings
static CUE_TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})\s*-->\s*(?:(\d{2,}):)?(\d{2}):(\d{2})\.(\d{3})(.*)$",
    )
    .unwrap()
});

/// Parse WebVTT text into a track.
///
/// NOTE/STYLE/REGION blocks are retained for round-trip but carry no
/// events; cue identifiers are dropped (events are renumbered).
pub fn parse(content: &str, source_kind: SourceKind) -> Result<Track> {
    let mut track = Track::new(source_kind, CodecHint::Vtt);

    // Blocks are separated by blank lines.
    let unified = content.replace("\r\n", "\n").replace('\r', "\n");
    let body = unified
        .trim_start_matches('\u{feff}')
        .strip_prefix("WEBVTT")
        .map(|rest| rest.split_once("\n\n").map(|(_, b)| b).unwrap_or(""))
        .unwrap_or(&unified);

    for block in body.split("\n\n") {
        let block = block.trim_matches('\n');
        if block.is_empty() {
            continue;
        }

        let first = block.lines().next().unwrap_or("");
        let keyword = first.split_whitespace().next().unwrap_or("");
        if matches!(keyword, "NOTE" | "STYLE" | "REGION") {
            track.vtt_blocks.push(block.to_string());
            continue;
        }

        if let Some(event) = parse_cue(block, track.events.len() + 1) {
            track.events.push(event);
        } else {
            warn!("Skipping malformed WebVTT cue: {}", first);
        }
    }

    track.normalize();
    Ok(track)
}

fn parse_cue(block: &str, index: usize) -> Option<Event> {
    let mut lines = block.lines().peekable();

    // Optional cue identifier line before the timing line.
    let first = *lines.peek()?;
    let timing_line = if CUE_TIMING_REGEX.is_match(first) {
        lines.next()?
    } else {
        lines.next();
        let second = lines.next()?;
        if !CUE_TIMING_REGEX.is_match(second) {
            return None;
        }
        second
    };

    let caps = CUE_TIMING_REGEX.captures(timing_line)?;
    let time = |h: usize, m: usize, s: usize, ms: usize| -> u64 {
        let get = |i: usize| caps.get(i).map_or(0, |v| v.as_str().parse().unwrap_or(0));
        get(h) * 3_600_000 + get(m) * 60_000 + get(s) * 1_000 + get(ms)
    };
    let start_ms = time(1, 2, 3, 4);
    let end_ms = time(5, 6, 7, 8);
    if end_ms < start_ms {
        return None;
    }
    let settings = caps.get(9).map(|m| m.as_str().trim().to_string());

    let text: String = lines.collect::<Vec<_>>().join("\n");
    if text.trim().is_empty() {
        return None;
    }

    let mut event = Event::new(index, start_ms, end_ms, text.trim());
    event.raw.vtt_settings = settings.filter(|s| !s.is_empty());
    Some(event)
}

/// Serialize a track as WebVTT: UTF-8 without BOM, `WEBVTT` header,
/// preserved NOTE/STYLE/REGION blocks ahead of the cues.
pub fn serialize(track: &Track) -> Vec<u8> {
    let mut out = String::from("WEBVTT\n\n");

    for block in &track.vtt_blocks {
        out.push_str(block);
        out.push_str("\n\n");
    }

    for (i, event) in track.events.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}",
            format_vtt_timestamp(event.start_ms),
            format_vtt_timestamp(event.end_ms)
        ));
        if let Some(settings) = &event.raw.vtt_settings {
            out.push(' ');
            out.push_str(settings);
        }
        out.push('\n');
        out.push_str(&event.text);
        out.push_str("\n\n");
    }

    out.into_bytes()
}
