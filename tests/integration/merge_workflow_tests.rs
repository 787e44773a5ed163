/*!
 * End-to-end merge scenarios
 */

use std::fs;

use bisubs::alignment::aligner::{align, AlignerConfig};
use bisubs::alignment::anchor::AnchorContext;
use bisubs::alignment::AnchorSelector;
use bisubs::app_config::{MergeConfig, OutputFormat, SyncStrategy};
use bisubs::app_controller::{Controller, JobSpec};
use bisubs::formats::{self, FormatKind};
use bisubs::merger;
use bisubs::subtitle_model::SourceKind;
use bisubs::translator::mock::MockTranslator;
use bisubs::translator::JobTranslator;

use crate::common::{self, chinese_srt, english_srt, make_track, srt_content};

fn test_config() -> MergeConfig {
    MergeConfig {
        primary_language: "zh".to_string(),
        secondary_language: "en".to_string(),
        ..MergeConfig::default()
    }
}

/// Identical clocks: the tracks skip global alignment and merge
/// directly into bilingual SRT.
#[tokio::test]
async fn test_merge_identicalClockPair_shouldProduceBilingualSrt() {
    let dir = common::create_temp_dir().unwrap();
    let zh = common::create_test_file(dir.path(), "movie.chs.srt", &chinese_srt()).unwrap();
    let en = common::create_test_file(dir.path(), "movie.eng.srt", &english_srt()).unwrap();
    let output = dir.path().join("movie.zh-en.srt");

    let controller = Controller::with_config(test_config()).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    let report = controller.run_job(&job).await.unwrap();

    assert_eq!(report.output_path, output);
    assert!(report.alignment.is_none(), "no alignment needed");
    let merged = formats::parse_file(&output, SourceKind::External).unwrap();
    assert_eq!(merged.events.len(), 3);
    assert_eq!(merged.events[0].text, "你好\nHello");
    assert_eq!(merged.events[0].start_ms, 1_000);
    assert_eq!(merged.events[0].end_ms, 3_000);
}

/// Uniform 2.5 s offset, resolved by the forced first_line strategy.
#[tokio::test]
async fn test_merge_uniformOffsetPair_shouldRealignAndMerge() {
    let dir = common::create_temp_dir().unwrap();
    let zh = common::create_test_file(
        dir.path(),
        "movie.chs.srt",
        &srt_content(&[(3_500, 5_500, "你好")]),
    )
    .unwrap();
    let en = common::create_test_file(
        dir.path(),
        "movie.eng.srt",
        &srt_content(&[(1_000, 3_000, "Hello")]),
    )
    .unwrap();
    let output = dir.path().join("movie.zh-en.srt");

    let config = MergeConfig {
        sync_strategy: SyncStrategy::FirstLine,
        alignment_threshold: 0.5,
        ..test_config()
    };
    let controller = Controller::with_config(config).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    let report = controller.run_job(&job).await.unwrap();

    let (method, shift, _) = report.alignment.expect("alignment ran");
    assert_eq!(method, "first_line");
    assert_eq!(shift, -2_500);

    let merged = formats::parse_file(&output, SourceKind::External).unwrap();
    assert_eq!(merged.events.len(), 1);
    assert_eq!(merged.events[0].start_ms, 1_000);
    assert_eq!(merged.events[0].end_ms, 3_000);
    assert_eq!(merged.events[0].text, "你好\nHello");
}

/// Large offset resolved through translation-assisted wide-window
/// anchoring, with pre-anchor trimming of the shifted track.
#[tokio::test]
async fn test_merge_largeOffset_withTranslation_shouldAnchorSemantically() {
    let compass_en = "This compass points to the thing you want most";
    let later_en = "And right now that thing is treasure";
    let mut reference = make_track(
        SourceKind::Embedded,
        &[
            (11_730, 14_000, compass_en),
            (14_200, 16_100, later_en),
            (16_900, 18_400, "Every man on this crew knows it"),
            (19_500, 21_000, "So we sail at dawn"),
        ],
    );
    reference.language = Some("en".to_string());

    let mut shifted = make_track(
        SourceKind::External,
        &[
            (60_000, 62_000, "字幕組招募中"),
            (64_000, 66_000, "本字幕僅供學習交流"),
            (68_497, 71_000, "在這個羅盤指向你最想要的東西"),
            (70_967, 72_900, "而現在那東西就是寶藏"),
        ],
    );
    shifted.language = Some("zh-Hant".to_string());

    let translator = MockTranslator::dictionary(&[
        ("在這個羅盤指向你最想要的東西", compass_en),
        ("而現在那東西就是寶藏", later_en),
    ]);
    let job_translator = JobTranslator::new(&translator);
    let ctx = AnchorContext {
        translator: Some(&job_translator),
        reference_lang: reference.language.clone(),
        shifted_lang: shifted.language.clone(),
    };
    let config = AlignerConfig {
        min_confidence: 0.3,
        allow_large_offset: true,
        enable_pre_anchor_trim: true,
        strategy: SyncStrategy::Auto,
        ..AlignerConfig::default()
    };

    let outcome = align(&reference, &shifted, &config, &AnchorSelector::Auto, &ctx)
        .await
        .unwrap();

    assert_eq!(outcome.shift_ms, -56_767);
    assert_eq!(outcome.trimmed_events, 2, "leading credits are trimmed");
    assert!(job_translator.calls_used() <= 10);

    let merged = merger::merge_interleaved(&outcome.shifted, &reference, 100);
    assert_eq!(merged.events[0].start_ms, 11_730);
    assert!(merged.events[0].text.contains("羅盤"));
    assert!(merged.events[0].text.contains(compass_en));
}

/// GBK-encoded input decodes, merges, and round-trips as UTF-8.
#[tokio::test]
async fn test_merge_gbkEncodedChinese_shouldDecodeAndMerge() {
    let dir = common::create_temp_dir().unwrap();
    let chinese = srt_content(&[
        (1_000, 3_000, "你好，世界。"),
        (4_000, 6_000, "我们今天去看电影。"),
    ]);
    let (gbk_bytes, _, _) = encoding_rs::GB18030.encode(&chinese);
    let zh =
        common::create_test_file_bytes(dir.path(), "movie.chs.srt", &gbk_bytes).unwrap();
    let en = common::create_test_file(
        dir.path(),
        "movie.eng.srt",
        &srt_content(&[
            (1_000, 3_000, "Hello, world."),
            (4_000, 6_000, "We are going to the movies today."),
        ]),
    )
    .unwrap();
    let output = dir.path().join("movie.zh-en.srt");

    let controller = Controller::with_config(test_config()).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    controller.run_job(&job).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"\xef\xbb\xbf"), "SRT output carries a BOM");
    let merged = formats::parse_file(&output, SourceKind::External).unwrap();
    assert_eq!(merged.events.len(), 2);
    assert_eq!(merged.events[0].text, "你好，世界。\nHello, world.");
}

/// ASS output mode produces the dual-style track.
#[tokio::test]
async fn test_merge_assOutput_shouldUseDualStyles() {
    let dir = common::create_temp_dir().unwrap();
    let zh = common::create_test_file(dir.path(), "movie.chs.srt", &chinese_srt()).unwrap();
    let en = common::create_test_file(dir.path(), "movie.eng.srt", &english_srt()).unwrap();
    let output = dir.path().join("movie.zh-en.ass");

    let config = MergeConfig {
        output_format: OutputFormat::Ass,
        ..test_config()
    };
    let controller = Controller::with_config(config).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    controller.run_job(&job).await.unwrap();

    let merged = formats::parse_file(&output, SourceKind::External).unwrap();
    assert_eq!(merged.events.len(), 6);
    assert!(merged.styles.contains_key("Primary"));
    assert!(merged.styles.contains_key("Secondary"));
    let primary_count = merged
        .events
        .iter()
        .filter(|e| e.style_ref.as_deref() == Some("Primary"))
        .count();
    assert_eq!(primary_count, 3);
}

/// A sparse track against a dense one surfaces the forced/signs warning.
#[tokio::test]
async fn test_merge_sparseAgainstDense_shouldWarn() {
    let dir = common::create_temp_dir().unwrap();
    let dense: Vec<(u64, u64, &str)> = (0..40)
        .map(|i| (i * 2_000, i * 2_000 + 1_500, "对白台词"))
        .collect();
    let zh = common::create_test_file(dir.path(), "a.chs.srt", &srt_content(&dense)).unwrap();
    let sparse = srt_content(&[(0, 1_500, "Sign text"), (2_000, 3_500, "Another sign")]);
    let en = common::create_test_file(dir.path(), "a.eng.srt", &sparse).unwrap();
    let output = dir.path().join("a.zh-en.srt");

    let controller = Controller::with_config(test_config()).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    let report = controller.run_job(&job).await.unwrap();
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("forced/signs")));
}

/// Batch mode skips inputs whose output already exists and reports a
/// failure line for unreadable containers.
#[tokio::test]
async fn test_batch_shouldSkipExistingAndReportFailures() {
    let dir = common::create_temp_dir().unwrap();
    fs::write(dir.path().join("done.mkv"), b"not really a video").unwrap();
    fs::write(dir.path().join("done.zh-en.srt"), b"existing output").unwrap();
    fs::write(dir.path().join("broken.mkv"), b"not really a video").unwrap();

    let controller = Controller::with_config(test_config()).unwrap();
    let summary = controller.run_batch(dir.path()).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(summary.lines.len(), 2);
}

/// Serialization is atomic: a failed job leaves no partial output.
#[tokio::test]
async fn test_failedJob_shouldLeaveNoOutputFile() {
    let dir = common::create_temp_dir().unwrap();
    let zh = common::create_test_file(
        dir.path(),
        "a.chs.srt",
        &srt_content(&[(10_000, 12_000, "中文台词在这里")]),
    )
    .unwrap();
    let en = common::create_test_file(
        dir.path(),
        "a.eng.srt",
        &srt_content(&[(1_000, 3_000, "English line here")]),
    )
    .unwrap();
    let output = dir.path().join("a.zh-en.srt");

    // Dissimilar cross-language text with a large gap and a strict
    // threshold: every automatic strategy fails.
    let config = MergeConfig {
        alignment_threshold: 0.95,
        ..test_config()
    };
    let controller = Controller::with_config(config).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    let result = controller.run_job(&job).await;
    assert!(result.is_err());
    assert!(!output.exists(), "no partial output may survive");
}

/// Round-trip through every output format preserves the merged events.
#[tokio::test]
async fn test_vttOutput_shouldMergeWithSrtSemantics() {
    let dir = common::create_temp_dir().unwrap();
    let zh = common::create_test_file(dir.path(), "m.chs.srt", &chinese_srt()).unwrap();
    let en = common::create_test_file(dir.path(), "m.eng.srt", &english_srt()).unwrap();
    let output = dir.path().join("m.zh-en.vtt");

    let config = MergeConfig {
        output_format: OutputFormat::Vtt,
        ..test_config()
    };
    let controller = Controller::with_config(config).unwrap();
    let job = JobSpec {
        primary_subtitle: Some(zh),
        secondary_subtitle: Some(en),
        output: Some(output.clone()),
        ..JobSpec::default()
    };
    controller.run_job(&job).await.unwrap();

    let bytes = fs::read(&output).unwrap();
    assert!(bytes.starts_with(b"WEBVTT"), "VTT output has no BOM");
    let merged = formats::parse_bytes(
        &bytes,
        FormatKind::Vtt,
        SourceKind::External,
        None,
        &output,
    )
    .unwrap();
    assert_eq!(merged.events.len(), 3);
    assert_eq!(merged.events[0].text, "你好\nHello");
}
