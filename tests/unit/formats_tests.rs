/*!
 * Tests for the SRT/ASS/VTT format adapters
 */

use std::path::PathBuf;

use bisubs::formats::{self, FormatKind};
use bisubs::subtitle_model::SourceKind;

use crate::common::{self, make_track, srt_content};

/// Round-trip property: parse(serialize(T)) preserves count, timings,
/// text and style references, for every supported format.
#[test]
fn test_round_trip_acrossAllFormats_shouldPreserveEvents() {
    let source = make_track(
        SourceKind::External,
        &[
            (1_000, 3_000, "First line"),
            (4_000, 6_000, "Second\nwith a break"),
            (7_500, 9_250, "Third line."),
        ],
    );

    for kind in [FormatKind::Srt, FormatKind::Ass, FormatKind::Vtt] {
        let bytes = formats::serialize(&source, kind);
        let reparsed = formats::parse_bytes(
            &bytes,
            kind,
            SourceKind::External,
            None,
            &PathBuf::from("round-trip"),
        )
        .unwrap_or_else(|e| panic!("reparse {:?} failed: {}", kind, e));

        assert_eq!(reparsed.events.len(), source.events.len(), "{:?}", kind);
        for (a, b) in source.events.iter().zip(reparsed.events.iter()) {
            assert_eq!(a.start_ms, b.start_ms, "{:?}", kind);
            assert_eq!(a.end_ms, b.end_ms, "{:?}", kind);
            assert_eq!(a.text, b.text, "{:?}", kind);
        }
    }
}

/// Ordering property: parsers emit events sorted by start time even
/// when the file is out of order.
#[test]
fn test_parse_withOutOfOrderBlocks_shouldSortByStart() {
    let content = srt_content(&[(5_000, 6_000, "second"), (1_000, 2_000, "first")]);
    let track = formats::parse_bytes(
        content.as_bytes(),
        FormatKind::Srt,
        SourceKind::External,
        None,
        &PathBuf::from("x.srt"),
    )
    .unwrap();
    assert!(track.invariants_hold());
    assert_eq!(track.events[0].text, "first");
}

#[test]
fn test_srt_serialize_shouldCarryBomAndCrlf() {
    let track = make_track(SourceKind::External, &[(0, 1_000, "x")]);
    let bytes = formats::serialize(&track, FormatKind::Srt);
    assert!(bytes.starts_with(b"\xef\xbb\xbf"));
    assert!(String::from_utf8(bytes).unwrap().contains("\r\n"));
}

#[test]
fn test_ass_serialize_shouldCarryBom() {
    let track = make_track(SourceKind::External, &[(0, 1_000, "x")]);
    let bytes = formats::serialize(&track, FormatKind::Ass);
    assert!(bytes.starts_with(b"\xef\xbb\xbf"));
}

#[test]
fn test_vtt_serialize_shouldNotCarryBom() {
    let track = make_track(SourceKind::External, &[(0, 1_000, "x")]);
    let bytes = formats::serialize(&track, FormatKind::Vtt);
    assert!(bytes.starts_with(b"WEBVTT"));
}

#[test]
fn test_parse_file_withGbkEncodedSrt_shouldDecode() {
    let dir = common::create_temp_dir().unwrap();
    let content = srt_content(&[(1_000, 2_000, "你好世界，这是中文字幕测试。")]);
    let (gbk_bytes, _, _) = encoding_rs::GB18030.encode(&content);
    let path =
        common::create_test_file_bytes(dir.path(), "chinese.srt", &gbk_bytes).unwrap();

    let track = formats::parse_file(&path, SourceKind::External).unwrap();
    assert_eq!(track.events.len(), 1);
    assert_eq!(track.events[0].text, "你好世界，这是中文字幕测试。");
}

#[test]
fn test_parse_file_withUnknownExtension_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "sub.txt", "not a subtitle").unwrap();
    assert!(formats::parse_file(&path, SourceKind::External).is_err());
}

#[test]
fn test_ass_parse_shouldExposeStylesForMergeInheritance() {
    let content = "[Script Info]\nScriptType: v4.00+\n\n[V4+ Styles]\nFormat: Name, Fontname, Fontsize\nStyle: Default,Noto Sans,26\n\n[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\nDialogue: 0,0:00:01.00,0:00:02.00,Default,,0,0,0,,line\n";
    let track = formats::parse_bytes(
        content.as_bytes(),
        FormatKind::Ass,
        SourceKind::External,
        None,
        &PathBuf::from("x.ass"),
    )
    .unwrap();
    assert!(track.styles["Default"].starts_with("Noto Sans,26"));
}
