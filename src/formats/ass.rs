use anyhow::Result;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::subtitle_model::{
    format_ass_timestamp, AssEventFields, CodecHint, Event, RawAttributes, SourceKind, Track,
};

// @module: ASS/SSA parsing and serialization

/// Standard V4+ style field order (after the style name).
const STYLE_FIELDS: [&str; 22] = [
    "Fontname", "Fontsize", "PrimaryColour", "SecondaryColour", "OutlineColour", "BackColour",
    "Bold", "Italic", "Underline", "StrikeOut", "ScaleX", "ScaleY", "Spacing", "Angle",
    "BorderStyle", "Outline", "Shadow", "Alignment", "MarginL", "MarginR", "MarginV", "Encoding",
];

/// Defaults used when a source style omits a field.
const STYLE_DEFAULTS: [&str; 22] = [
    "Arial", "20", "&H00FFFFFF", "&H000000FF", "&H00000000", "&H00000000",
    "0", "0", "0", "0", "100", "100", "0", "0",
    "1", "2", "2", "2", "10", "10", "10", "1",
];

/// Standard event field order. `Text` is last and may contain commas.
const EVENT_FIELDS: [&str; 10] = [
    "Layer", "Start", "End", "Style", "Name", "MarginL", "MarginR", "MarginV", "Effect", "Text",
];

// @const: ASS time, H:MM:SS.cc or H:MM:SS.mmm
static ASS_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})[.,](\d{2,3})$").unwrap());

// @const: Override tag blocks, e.g. {\an8\pos(10,10)}
static OVERRIDE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]*\}").unwrap());

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    ScriptInfo,
    Styles,
    Events,
    Other,
}

/// Parse ASS or SSA text into a track.
///
/// Only `Dialogue:` lines become events; `Comment:` lines are kept in
/// place but not treated as events. Styles are remapped into the
/// standard V4+ field order so the writer can emit one format line.
pub fn parse(content: &str, source_kind: SourceKind, codec: CodecHint) -> Result<Track> {
    let mut track = Track::new(source_kind, codec);

    let mut section = Section::None;
    let mut style_format: Vec<String> = STYLE_FIELDS.iter().map(|s| s.to_string()).collect();
    let mut event_format: Vec<String> = EVENT_FIELDS.iter().map(|s| s.to_string()).collect();

    for raw_line in content.lines() {
        let line = raw_line.trim_start_matches('\u{feff}').trim_end();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        if trimmed.starts_with('[') {
            section = match trimmed.to_lowercase().as_str() {
                "[script info]" => Section::ScriptInfo,
                "[v4+ styles]" | "[v4 styles]" => Section::Styles,
                "[events]" => Section::Events,
                _ => Section::Other,
            };
            continue;
        }

        match section {
            Section::ScriptInfo => {
                if let Some((key, value)) = trimmed.split_once(':') {
                    track
                        .script_info
                        .push((key.trim().to_string(), value.trim().to_string()));
                }
            }
            Section::Styles => {
                if let Some(rest) = strip_prefix_ci(trimmed, "format:") {
                    style_format = split_format(rest);
                } else if let Some(rest) = strip_prefix_ci(trimmed, "style:") {
                    if let Some((name, normalized)) = normalize_style(rest, &style_format) {
                        track.styles.insert(name, normalized);
                    }
                }
            }
            Section::Events => {
                if let Some(rest) = strip_prefix_ci(trimmed, "format:") {
                    event_format = split_format(rest);
                } else if let Some(rest) = strip_prefix_ci(trimmed, "dialogue:") {
                    match parse_dialogue(rest, &event_format, track.events.len() + 1) {
                        Some(event) => track.events.push(event),
                        None => warn!("Skipping malformed Dialogue line: {}", trimmed),
                    }
                } else if strip_prefix_ci(trimmed, "comment:").is_some() {
                    track
                        .ass_comments
                        .push((track.events.len(), trimmed.to_string()));
                }
            }
            Section::None | Section::Other => {}
        }
    }

    track.normalize();
    Ok(track)
}

fn strip_prefix_ci<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    if line.len() >= prefix.len() && line[..prefix.len()].eq_ignore_ascii_case(prefix) {
        Some(line[prefix.len()..].trim_start())
    } else {
        None
    }
}

fn split_format(rest: &str) -> Vec<String> {
    rest.split(',').map(|f| f.trim().to_string()).collect()
}

/// Remap a `Style:` line into the standard V4+ field order, filling
/// missing fields with defaults. Returns (name, comma-joined fields).
fn normalize_style(rest: &str, format: &[String]) -> Option<(String, String)> {
    let values: Vec<&str> = rest.split(',').map(|v| v.trim()).collect();
    let mut name = String::new();
    let mut fields: Vec<String> = STYLE_DEFAULTS.iter().map(|s| s.to_string()).collect();

    for (i, field) in format.iter().enumerate() {
        let value = match values.get(i) {
            Some(v) => *v,
            None => break,
        };
        if field.eq_ignore_ascii_case("name") {
            name = value.to_string();
        } else if let Some(pos) = STYLE_FIELDS
            .iter()
            .position(|f| f.eq_ignore_ascii_case(field))
        {
            fields[pos] = value.to_string();
        }
    }

    if name.is_empty() {
        return None;
    }
    Some((name, fields.join(",")))
}

/// Parse a millisecond timestamp from ASS `H:MM:SS.cc` (or `.mmm`) form.
fn parse_ass_time(s: &str) -> Option<u64> {
    let caps = ASS_TIME_REGEX.captures(s.trim())?;
    let hours: u64 = caps[1].parse().ok()?;
    let minutes: u64 = caps[2].parse().ok()?;
    let seconds: u64 = caps[3].parse().ok()?;
    let frac = &caps[4];
    let millis: u64 = match frac.len() {
        2 => frac.parse::<u64>().ok()? * 10,
        _ => frac.parse().ok()?,
    };
    Some(hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis)
}

fn parse_dialogue(rest: &str, format: &[String], index: usize) -> Option<Event> {
    // Text is the final field and may contain commas, so split into at
    // most format.len() pieces.
    let values: Vec<&str> = rest.splitn(format.len(), ',').collect();
    if values.len() < format.len().min(3) {
        return None;
    }

    let mut fields = AssEventFields::default();
    let mut start_ms = None;
    let mut end_ms = None;
    let mut style_ref = None;
    let mut text_raw = "";

    for (i, field) in format.iter().enumerate() {
        let value = match values.get(i) {
            Some(v) => *v,
            None => break,
        };
        match field.to_lowercase().as_str() {
            "layer" | "marked" => fields.layer = value.trim().parse().unwrap_or(0),
            "start" => start_ms = parse_ass_time(value),
            "end" => end_ms = parse_ass_time(value),
            "style" => style_ref = Some(value.trim().to_string()),
            "name" | "actor" => fields.name = value.trim().to_string(),
            "marginl" => fields.margin_l = value.trim().to_string(),
            "marginr" => fields.margin_r = value.trim().to_string(),
            "marginv" => fields.margin_v = value.trim().to_string(),
            "effect" => fields.effect = value.trim().to_string(),
            "text" => text_raw = value,
            _ => {}
        }
    }

    let start_ms = start_ms?;
    let end_ms = end_ms?;
    if end_ms < start_ms {
        return None;
    }

    let logical = strip_override_tags(text_raw);
    let mut event = Event::new(index, start_ms, end_ms, logical);
    event.style_ref = style_ref.filter(|s| !s.is_empty());
    event.raw = RawAttributes {
        ass: Some(fields),
        source_text: Some(text_raw.to_string()),
        ..RawAttributes::default()
    };
    Some(event)
}

/// Strip `{...}` override blocks and turn `\N`/`\n` breaks into `\n`.
pub fn strip_override_tags(text: &str) -> String {
    let without_tags = OVERRIDE_REGEX.replace_all(text, "");
    without_tags
        .replace("\\N", "\n")
        .replace("\\n", "\n")
        .replace("\\h", " ")
        .trim()
        .to_string()
}

/// Serialize a track as ASS: UTF-8 with BOM, standard V4+ sections.
pub fn serialize(track: &Track) -> Vec<u8> {
    let mut out = String::from("\u{feff}");

    out.push_str("[Script Info]\n");
    if track.script_info.is_empty() {
        out.push_str("ScriptType: v4.00+\n");
        out.push_str("WrapStyle: 0\n");
        out.push_str("ScaledBorderAndShadow: yes\n");
    } else {
        for (key, value) in &track.script_info {
            out.push_str(&format!("{}: {}\n", key, value));
        }
    }
    out.push('\n');

    out.push_str("[V4+ Styles]\n");
    out.push_str(&format!("Format: Name, {}\n", STYLE_FIELDS.join(", ")));
    if track.styles.is_empty() {
        out.push_str(&format!("Style: Default,{}\n", STYLE_DEFAULTS.join(",")));
    } else {
        for (name, fields) in &track.styles {
            out.push_str(&format!("Style: {},{}\n", name, fields));
        }
    }
    out.push('\n');

    out.push_str("[Events]\n");
    out.push_str(&format!("Format: {}\n", EVENT_FIELDS.join(", ")));

    let mut comment_iter = track.ass_comments.iter().peekable();
    for (i, event) in track.events.iter().enumerate() {
        while let Some((pos, line)) = comment_iter.peek() {
            if *pos <= i {
                out.push_str(line);
                out.push('\n');
                comment_iter.next();
            } else {
                break;
            }
        }
        out.push_str(&serialize_dialogue(event));
    }
    for (_, line) in comment_iter {
        out.push_str(line);
        out.push('\n');
    }

    out.into_bytes()
}

fn serialize_dialogue(event: &Event) -> String {
    let defaults = AssEventFields::default();
    let fields = event.raw.ass.as_ref().unwrap_or(&defaults);
    let text = match &event.raw.source_text {
        Some(raw) => raw.clone(),
        None => event.text.replace('\n', "\\N"),
    };
    format!(
        "Dialogue: {},{},{},{},{},{},{},{},{},{}\n",
        fields.layer,
        format_ass_timestamp(event.start_ms),
        format_ass_timestamp(event.end_ms),
        event.style_ref.as_deref().unwrap_or("Default"),
        fields.name,
        or_zero(&fields.margin_l),
        or_zero(&fields.margin_r),
        or_zero(&fields.margin_v),
        fields.effect,
        text
    )
}

fn or_zero(value: &str) -> &str {
    if value.is_empty() {
        "0"
    } else {
        value
    }
}
