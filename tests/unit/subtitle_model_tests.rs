/*!
 * Tests for the event/track model and its invariants
 */

use bisubs::subtitle_model::{
    format_srt_timestamp, strip_control_chars, CodecHint, Event, SourceKind, Track,
    MAX_TIMESTAMP_MS,
};

use crate::common::make_track;

#[test]
fn test_normalize_withUnsortedEvents_shouldRestoreInvariants() {
    let mut track = Track::new(SourceKind::External, CodecHint::Srt);
    track.events.push(Event::new(9, 8_000, 9_000, "late"));
    track.events.push(Event::new(2, 1_000, 2_000, "early"));
    track.events.push(Event::new(5, 4_000, 5_000, "middle"));

    track.normalize();

    assert!(track.invariants_hold());
    let texts: Vec<&str> = track.events.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["early", "middle", "late"]);
    let indices: Vec<usize> = track.events.iter().map(|e| e.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
}

#[test]
fn test_normalize_withOver24hTimestamp_shouldClamp() {
    let mut track = Track::new(SourceKind::External, CodecHint::Srt);
    track
        .events
        .push(Event::new(1, 0, MAX_TIMESTAMP_MS + 5_000, "too long"));
    track.normalize();
    assert_eq!(track.events[0].end_ms, MAX_TIMESTAMP_MS);
    assert!(track.invariants_hold());
}

#[test]
fn test_normalize_shouldRecordOriginalIndex() {
    let mut track = make_track(SourceKind::External, &[(5_000, 6_000, "b"), (1_000, 2_000, "a")]);
    // make_track numbered them 1 and 2 in push order.
    track.normalize();
    assert_eq!(track.events[0].text, "a");
    assert_eq!(track.events[0].raw.original_index, Some(2));
}

#[test]
fn test_strip_control_chars_shouldDropEverythingButNewline() {
    assert_eq!(strip_control_chars("a\u{0007}b\nc\r\nd"), "ab\nc\nd");
}

#[test]
fn test_event_activity_shouldUseHalfOpenInterval() {
    let event = Event::new(1, 1_000, 2_000, "x");
    assert!(event.is_active_at(1_000));
    assert!(event.is_active_at(1_999));
    assert!(!event.is_active_at(2_000));
    assert!(!event.is_active_at(999));
}

#[test]
fn test_sample_text_shouldJoinLeadingEvents() {
    let track = make_track(
        SourceKind::External,
        &[(0, 1_000, "one"), (2_000, 3_000, "two"), (4_000, 5_000, "three")],
    );
    let sample = track.sample_text(2, 4_096);
    assert_eq!(sample, "one\ntwo");
}

#[test]
fn test_format_srt_timestamp_shouldZeroPad() {
    assert_eq!(format_srt_timestamp(0), "00:00:00,000");
    assert_eq!(format_srt_timestamp(59_999), "00:00:59,999");
    assert_eq!(format_srt_timestamp(3_600_000), "01:00:00,000");
}
