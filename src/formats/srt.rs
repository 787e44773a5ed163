use anyhow::Result;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_model::{format_srt_timestamp, CodecHint, Event, SourceKind, Track};

// @module: SubRip (.srt) parsing and serialization

// @const: SRT timestamp line, with optional trailing position tags
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})",
    )
    .unwrap()
});

/// Parse SRT text into a track. Malformed blocks are logged and skipped;
/// the index header line is ignored and events are renumbered.
pub fn parse(content: &str, source_kind: SourceKind) -> Result<Track> {
    let mut track = Track::new(source_kind, CodecHint::Srt);

    let mut current_index: Option<usize> = None;
    let mut current_times: Option<(u64, u64)> = None;
    let mut current_text = String::new();
    let mut line_number = 0usize;

    let flush =
        |index: Option<usize>, times: Option<(u64, u64)>, text: &str, events: &mut Vec<Event>| {
            let (start_ms, end_ms) = match times {
                Some(t) => t,
                None => return,
            };
            if text.trim().is_empty() {
                warn!("Skipping empty subtitle block at index {:?}", index);
                return;
            }
            match Event::new_validated(
                index.unwrap_or(events.len() + 1),
                start_ms,
                end_ms,
                text.trim(),
            ) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping invalid subtitle block: {}", e),
            }
        };

    for line in content.lines() {
        line_number += 1;
        let trimmed = line.trim_start_matches('\u{feff}').trim();

        if trimmed.is_empty() {
            if current_times.is_some() {
                flush(current_index, current_times, &current_text, &mut track.events);
                current_index = None;
                current_times = None;
                current_text.clear();
            }
            continue;
        }

        // A bare number opens a new block.
        if current_index.is_none() && current_times.is_none() && current_text.is_empty() {
            if let Ok(num) = trimmed.parse::<usize>() {
                current_index = Some(num);
                continue;
            }
        }

        if current_times.is_none() {
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                let start = timestamp_from_captures(&caps, 1);
                let end = timestamp_from_captures(&caps, 5);
                // Trailing position tags after the timestamps are ignored.
                current_times = Some((start, end));
                continue;
            }
        }

        if current_times.is_some() {
            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        } else {
            warn!(
                "Unexpected text at line {} before a timestamp: {}",
                line_number, trimmed
            );
        }
    }

    flush(current_index, current_times, &current_text, &mut track.events);

    track.normalize();
    Ok(track)
}

fn timestamp_from_captures(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 {
        caps.get(start_idx + i)
            .map_or(0, |m| m.as_str().parse().unwrap_or(0))
    };
    part(0) * 3_600_000 + part(1) * 60_000 + part(2) * 1_000 + part(3)
}

/// Serialize a track as SRT: UTF-8 with BOM, CRLF line endings,
/// indices renumbered from 1.
pub fn serialize(track: &Track) -> Vec<u8> {
    let mut out = String::from("\u{feff}");
    for (i, event) in track.events.iter().enumerate() {
        out.push_str(&format!("{}\r\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\r\n",
            format_srt_timestamp(event.start_ms),
            format_srt_timestamp(event.end_ms)
        ));
        for line in event.text.split('\n') {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
    }
    out.into_bytes()
}
