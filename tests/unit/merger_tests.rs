/*!
 * Tests for the bilingual merge modes
 */

use bisubs::merger::{merge_dual_style, merge_interleaved, DEFAULT_WELD_THRESHOLD_MS};
use bisubs::subtitle_model::SourceKind;

use crate::common::make_track;

/// Identical clocks: one merged event carrying both languages,
/// primary first.
#[test]
fn test_merge_identicalClock_shouldEmitSingleBilingualEvent() {
    let zh = make_track(SourceKind::External, &[(1_000, 3_000, "你好")]);
    let en = make_track(SourceKind::External, &[(1_000, 3_000, "Hello")]);
    let merged = merge_interleaved(&zh, &en, DEFAULT_WELD_THRESHOLD_MS);

    assert_eq!(merged.events.len(), 1);
    assert_eq!(merged.events[0].start_ms, 1_000);
    assert_eq!(merged.events[0].end_ms, 3_000);
    assert_eq!(merged.events[0].text, "你好\nHello");
}

/// Flicker welding: [1000,2000]"X" + [2050,3000]"X" fuse into one.
#[test]
fn test_merge_nearIdenticalNeighbors_shouldWeld() {
    let a = make_track(SourceKind::External, &[(1_000, 2_000, "X"), (2_050, 3_000, "X")]);
    let empty = make_track(SourceKind::External, &[]);
    let merged = merge_interleaved(&a, &empty, 100);
    assert_eq!(merged.events.len(), 1);
    assert_eq!(merged.events[0].start_ms, 1_000);
    assert_eq!(merged.events[0].end_ms, 3_000);
}

/// The weld distance is caller-configurable.
#[test]
fn test_merge_weldThreshold_shouldBeConfigurable() {
    let a = make_track(SourceKind::External, &[(1_000, 2_000, "X"), (2_050, 3_000, "X")]);
    let empty = make_track(SourceKind::External, &[]);
    // A 25 ms threshold leaves the 50 ms gap alone.
    let merged = merge_interleaved(&a, &empty, 25);
    assert_eq!(merged.events.len(), 2);
}

/// Anti-flicker property: no two consecutive outputs share text within
/// the weld distance.
#[test]
fn test_merge_output_shouldHaveNoResidualFlicker() {
    let zh = make_track(
        SourceKind::External,
        &[(0, 1_000, "甲"), (1_050, 2_000, "甲"), (2_020, 3_000, "甲"), (5_000, 6_000, "乙")],
    );
    let en = make_track(
        SourceKind::External,
        &[(0, 3_000, "A"), (5_000, 6_000, "B")],
    );
    let merged = merge_interleaved(&zh, &en, DEFAULT_WELD_THRESHOLD_MS);
    for pair in merged.events.windows(2) {
        let gap = pair[1].start_ms - pair[0].end_ms;
        assert!(
            pair[0].text != pair[1].text || gap >= DEFAULT_WELD_THRESHOLD_MS,
            "flicker between {:?} and {:?}",
            pair[0],
            pair[1]
        );
    }
}

/// Monotone-time property over an adversarial overlap pattern.
#[test]
fn test_merge_output_shouldKeepPositiveDurations() {
    let zh = make_track(
        SourceKind::External,
        &[(0, 5_000, "长句"), (1_000, 2_000, "插入"), (1_500, 1_500, "空")],
    );
    let en = make_track(
        SourceKind::External,
        &[(500, 4_500, "long"), (900, 1_100, "insert")],
    );
    let merged = merge_interleaved(&zh, &en, DEFAULT_WELD_THRESHOLD_MS);
    assert!(merged.invariants_hold());
    for event in &merged.events {
        assert!(event.end_ms > event.start_ms);
    }
}

/// Reference preservation: every reference start reappears within
/// 100 ms in the merged output.
#[test]
fn test_merge_shouldPreserveReferenceBoundaries() {
    let reference = make_track(
        SourceKind::External,
        &[(1_000, 2_500, "a"), (3_000, 4_500, "b"), (6_000, 8_000, "c"), (9_000, 9_800, "d")],
    );
    let other = make_track(
        SourceKind::External,
        &[(950, 2_450, "一"), (3_100, 4_600, "二"), (6_200, 7_700, "三")],
    );
    let merged = merge_interleaved(&reference, &other, DEFAULT_WELD_THRESHOLD_MS);
    for event in &reference.events {
        assert!(
            merged.events.iter().any(|o| {
                (o.start_ms as i64 - event.start_ms as i64).abs() <= 100
                    && (merged
                        .events
                        .iter()
                        .any(|e| (e.end_ms as i64 - event.end_ms as i64).abs() <= 100))
            }),
            "boundary {} lost",
            event.start_ms
        );
    }
}

/// Dual-style mode keeps both event sets verbatim and sorts stably.
#[test]
fn test_merge_dualStyle_shouldInterleaveSorted() {
    let zh = make_track(SourceKind::External, &[(1_000, 2_000, "一"), (5_000, 6_000, "二")]);
    let en = make_track(SourceKind::External, &[(1_000, 2_000, "one"), (3_000, 4_000, "two")]);
    let merged = merge_dual_style(&zh, &en, true);

    assert_eq!(merged.events.len(), 4);
    assert!(merged.invariants_hold());
    // Equal start times put the primary-language event first.
    assert_eq!(merged.events[0].text, "一");
    assert_eq!(merged.events[0].style_ref.as_deref(), Some("Primary"));
    assert_eq!(merged.events[1].text, "one");
    assert_eq!(merged.events[1].style_ref.as_deref(), Some("Secondary"));
    // Timings are copied, never merged.
    assert_eq!(merged.events[2].start_ms, 3_000);
    assert_eq!(merged.events[3].start_ms, 5_000);
}

#[test]
fn test_merge_dualStyle_stylesCarryAlignment() {
    let zh = make_track(SourceKind::External, &[(0, 1_000, "一")]);
    let en = make_track(SourceKind::External, &[(0, 1_000, "one")]);
    let merged = merge_dual_style(&zh, &en, true);
    // Primary renders top (alignment 8), secondary bottom (alignment 2),
    // per the standard field order: ...,Alignment,MarginL,MarginR,MarginV,Encoding.
    let primary_fields: Vec<&str> = merged.styles["Primary"].split(',').collect();
    let secondary_fields: Vec<&str> = merged.styles["Secondary"].split(',').collect();
    assert_eq!(primary_fields[primary_fields.len() - 5], "8");
    assert_eq!(secondary_fields[secondary_fields.len() - 5], "2");
}
