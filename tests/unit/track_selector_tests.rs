/*!
 * Tests for main-dialogue track scoring
 */

use bisubs::errors::SelectionError;
use bisubs::subtitle_model::{CodecHint, RoleHint};
use bisubs::track_selector::{rank, select, TrackCandidate};

fn dialogue_sample(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("This is a full English dialogue line number {}.", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn candidate(index: usize, title: &str, forced: bool, events: usize) -> TrackCandidate {
    TrackCandidate {
        stream_index: index,
        codec: CodecHint::Srt,
        language_tag: Some("eng".to_string()),
        title: title.to_string(),
        forced,
        default: index == 0,
        event_count: events,
        sample_text: dialogue_sample(20),
    }
}

#[test]
fn test_select_forcedVersusFull_shouldPickFullTrack() {
    let candidates = vec![
        candidate(0, "English (Forced)", true, 25),
        candidate(1, "English", false, 1200),
    ];
    let best = select(&candidates, "en", None).unwrap();
    assert_eq!(best.candidate.stream_index, 1);
    assert_eq!(best.role_hint, RoleHint::Main);

    let ranked = rank(&candidates, "en", None);
    let forced = ranked.iter().find(|t| t.candidate.forced).unwrap();
    assert_eq!(forced.role_hint, RoleHint::ForcedOrSigns);
}

#[test]
fn test_select_commentaryTrack_shouldRankBelowDialogue() {
    let candidates = vec![
        candidate(0, "Director's Commentary", false, 800),
        candidate(1, "English Full", false, 800),
    ];
    let best = select(&candidates, "en", None).unwrap();
    assert_eq!(best.candidate.stream_index, 1);
}

#[test]
fn test_select_withNoCandidates_shouldError() {
    let result = select(&[], "en", None);
    assert!(matches!(
        result,
        Err(SelectionError::NoAcceptableCandidate { .. })
    ));
}

#[test]
fn test_select_withSparseWrongLanguageTrack_shouldReportNoCandidate() {
    let mut sparse_chinese = candidate(0, "Chinese", false, 30);
    sparse_chinese.language_tag = Some("chi".to_string());
    sparse_chinese.sample_text = "标志 招牌 路标".to_string();

    match select(&[sparse_chinese], "en", None) {
        Err(SelectionError::NoAcceptableCandidate { language, .. }) => {
            assert_eq!(language, "en");
        }
        other => panic!("expected NoAcceptableCandidate, got {:?}", other.map(|t| t.score)),
    }
}

#[test]
fn test_rank_shouldRecordReasoning() {
    let ranked = rank(&[candidate(0, "English (Forced)", true, 10)], "en", None);
    assert!(!ranked[0].reasoning.is_empty());
    assert!(ranked[0]
        .reasoning
        .iter()
        .any(|r| r.contains("forced") || r.contains("-20")));
}
