/*!
 * Bilingual track merging.
 *
 * Two modes:
 *
 * - `merge_interleaved`: the segment-union algorithm behind bilingual
 *   SRT (and VTT). Every distinct time point of either track opens a
 *   segment; each segment shows the active primary text above the
 *   active secondary text. Anti-flicker welding fuses consecutive
 *   identical segments separated by less than the configured gap.
 * - `merge_dual_style`: bilingual ASS. Events are copied verbatim
 *   with no time merging; the primary-language track renders top
 *   aligned via a `Primary` style, the other bottom aligned via
 *   `Secondary`.
 *
 * Both modes produce an ordinary track; serialization stays with the
 * format adapters.
 */

use std::collections::BTreeSet;

use log::debug;

use crate::subtitle_model::{CodecHint, Event, SourceKind, Track};

/// Default anti-flicker fuse distance in milliseconds.
pub const DEFAULT_WELD_THRESHOLD_MS: u64 = 100;

/// Merge two aligned tracks into interleaved bilingual events.
///
/// `primary` text appears first in each merged event. Returns a track
/// whose events carry positive durations, sorted by start time, with
/// no two consecutive identical texts closer than `weld_threshold_ms`.
pub fn merge_interleaved(primary: &Track, secondary: &Track, weld_threshold_ms: u64) -> Track {
    let mut points: BTreeSet<u64> = BTreeSet::new();
    for event in primary.events.iter().chain(secondary.events.iter()) {
        points.insert(event.start_ms);
        points.insert(event.end_ms);
    }
    let points: Vec<u64> = points.into_iter().collect();

    let mut merged: Vec<Event> = Vec::new();
    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);

        let primary_text = active_text(primary, start);
        let secondary_text = active_text(secondary, start);
        if primary_text.is_empty() && secondary_text.is_empty() {
            continue;
        }

        let text = match (primary_text.is_empty(), secondary_text.is_empty()) {
            (false, false) => format!("{}\n{}", primary_text, secondary_text),
            (false, true) => primary_text,
            (true, false) => secondary_text,
            (true, true) => unreachable!(),
        };
        merged.push(Event::new(merged.len() + 1, start, end, text));
    }

    let weld_count = weld(&mut merged, weld_threshold_ms);
    if weld_count > 0 {
        debug!("Anti-flicker welding fused {} segment(s)", weld_count);
    }

    let mut track = Track::new(SourceKind::External, CodecHint::Srt);
    track.events = merged;
    track.normalize();
    track
}

/// Concatenated text of the events active at `t_ms`, in track order.
fn active_text(track: &Track, t_ms: u64) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for event in &track.events {
        if event.is_active_at(t_ms) {
            parts.push(&event.text);
        }
        if event.start_ms > t_ms {
            break;
        }
    }
    parts.join("\n")
}

/// Fuse consecutive events with identical text when the gap between
/// them is zero or below the threshold. Returns the number of fusions.
fn weld(events: &mut Vec<Event>, threshold_ms: u64) -> usize {
    let mut fused = 0usize;
    let mut i = 0usize;
    while i + 1 < events.len() {
        let gap = events[i + 1].start_ms.saturating_sub(events[i].end_ms);
        if events[i].text == events[i + 1].text && (gap == 0 || gap < threshold_ms) {
            events[i].end_ms = events[i + 1].end_ms;
            events.remove(i + 1);
            fused += 1;
        } else {
            i += 1;
        }
    }
    fused
}

/// ASS style line remainders (standard V4+ field order after the name).
fn ass_style(font: &str, size: u32, color: &str, alignment: u8, margin_v: u32) -> String {
    format!(
        "{font},{size},{color},&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,1,{alignment},10,10,{margin_v},1"
    )
}

/// Pull (fontname, fontsize) from a track's Default style, if present.
fn inherited_font(track: &Track) -> Option<(String, u32)> {
    let style = track.styles.get("Default")?;
    let mut fields = style.split(',');
    let font = fields.next()?.trim().to_string();
    let size: u32 = fields.next()?.trim().parse().ok()?;
    if font.is_empty() {
        return None;
    }
    Some((font, size))
}

/// Merge two aligned tracks as dual-style ASS.
///
/// `reference` keeps its timings by construction (events are copied,
/// never re-timed). When `reference_is_primary` the reference renders
/// with the top-aligned `Primary` style; otherwise with `Secondary`.
pub fn merge_dual_style(reference: &Track, shifted: &Track, reference_is_primary: bool) -> Track {
    let mut track = Track::new(SourceKind::External, CodecHint::Ass);

    // Script info: union of both sources' keys, reference wins conflicts.
    track.script_info = reference.script_info.clone();
    for (key, value) in &shifted.script_info {
        if !track.script_info.iter().any(|(k, _)| k == key) {
            track.script_info.push((key.clone(), value.clone()));
        }
    }
    if !track.script_info.iter().any(|(k, _)| k == "ScriptType") {
        track
            .script_info
            .insert(0, ("ScriptType".to_string(), "v4.00+".to_string()));
    }

    let (primary_track, secondary_track) = if reference_is_primary {
        (reference, shifted)
    } else {
        (shifted, reference)
    };

    let (primary_font, primary_size) =
        inherited_font(primary_track).unwrap_or_else(|| ("Arial".to_string(), 24));
    let (secondary_font, secondary_size) =
        inherited_font(secondary_track).unwrap_or_else(|| ("Arial".to_string(), 20));

    track.styles.insert(
        "Primary".to_string(),
        ass_style(&primary_font, primary_size.max(24), "&H0000FFFF", 8, 20),
    );
    track.styles.insert(
        "Secondary".to_string(),
        ass_style(&secondary_font, secondary_size.min(20), "&H00FFFFFF", 2, 20),
    );

    // Copy events verbatim, restyled. Bucket 0 is the primary language
    // so equal start times sort primary first, stably.
    let mut combined: Vec<(u8, usize, Event)> = Vec::new();
    for (bucket, source, style) in [
        (0u8, primary_track, "Primary"),
        (1u8, secondary_track, "Secondary"),
    ] {
        for (idx, event) in source.events.iter().enumerate() {
            let mut copy = event.clone();
            copy.style_ref = Some(style.to_string());
            combined.push((bucket, idx, copy));
        }
    }
    combined.sort_by_key(|(bucket, idx, event)| (event.start_ms, *bucket, *idx));

    track.events = combined.into_iter().map(|(_, _, e)| e).collect();
    track.normalize();
    track
}
