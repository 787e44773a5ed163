/*!
 * Tests for language classification
 */

use bisubs::language_detector::{classify, normalize_tag, tags_match, Lang};

#[test]
fn test_classify_withSimplifiedSample_shouldPickZhHans() {
    let sample = "我们现在说的是简体中文，这里有对话和说明。";
    let ranked = classify(sample, None);
    assert_eq!(ranked[0].lang, Lang::ZhHans);
    assert!(ranked[0].score > 0.5);
}

#[test]
fn test_classify_withTraditionalSample_shouldPickZhHant() {
    let sample = "我們現在說的是繁體中文，這裡有對話和說明。";
    let ranked = classify(sample, None);
    assert_eq!(ranked[0].lang, Lang::ZhHant);
}

#[test]
fn test_classify_withEnglishSample_shouldPickEnglish() {
    let sample = "We are speaking plain English here, with dialogue and narration.";
    let ranked = classify(sample, None);
    assert_eq!(ranked[0].lang, Lang::En);
}

#[test]
fn test_classify_withJapaneseKana_shouldBeatChinese() {
    // Kanji plus kana must classify as Japanese, not Chinese.
    let sample = "今日はとても良い天気ですね。映画を見ましょう。";
    let ranked = classify(sample, None);
    assert_eq!(ranked[0].lang, Lang::Ja);
    assert!(ranked.iter().all(|s| s.lang != Lang::ZhHans));
}

#[test]
fn test_classify_withMostlyPunctuation_shouldReturnEmpty() {
    let ranked = classify("... --- !!!", None);
    assert!(ranked.is_empty());
}

#[test]
fn test_classify_filenameBoost_shouldNotExceedOne() {
    let sample = "Plain English dialogue for the duration of the sample text.";
    let ranked = classify(sample, Some("Show.S01E01.eng.srt"));
    for score in ranked {
        assert!(score.score <= 1.0);
    }
}

#[test]
fn test_normalize_tag_shouldCoverContainerCodes() {
    assert_eq!(normalize_tag("eng").unwrap(), "en");
    assert_eq!(normalize_tag("jpn").unwrap(), "ja");
    assert_eq!(normalize_tag("kor").unwrap(), "ko");
    assert_eq!(normalize_tag("chi").unwrap(), "zh");
    assert_eq!(normalize_tag("CHS").unwrap(), "zh-Hans");
}

#[test]
fn test_tags_match_shouldBridgeIsoAndBcp47() {
    assert!(tags_match("zh", "chi"));
    assert!(tags_match("zh-Hans", "zh-Hant"));
    assert!(tags_match("en", "eng"));
    assert!(!tags_match("ja", "ko"));
}
