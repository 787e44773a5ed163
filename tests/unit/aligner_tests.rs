/*!
 * Tests for global time-shift alignment
 */

use bisubs::alignment::aligner::{align, AlignerConfig};
use bisubs::alignment::anchor::AnchorContext;
use bisubs::alignment::{AnchorMethod, AnchorSelector, SelectorChoice};
use bisubs::app_config::SyncStrategy;
use bisubs::errors::AlignmentError;
use bisubs::subtitle_model::SourceKind;

use crate::common::make_track;

fn config(strategy: SyncStrategy, min_confidence: f64) -> AlignerConfig {
    AlignerConfig {
        strategy,
        min_confidence,
        ..AlignerConfig::default()
    }
}

/// Uniform 2.5 s offset resolved by a forced first_line strategy.
#[tokio::test]
async fn test_align_uniformOffset_shouldShiftBackOntoReference() {
    let reference = make_track(SourceKind::External, &[(1_000, 3_000, "Hello")]);
    let shifted = make_track(SourceKind::External, &[(3_500, 5_500, "你好")]);

    let outcome = align(
        &reference,
        &shifted,
        &config(SyncStrategy::FirstLine, 0.5),
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.shift_ms, -2_500);
    assert_eq!(outcome.anchor.method, AnchorMethod::FirstLine);
    assert_eq!(outcome.shifted.events[0].start_ms, 1_000);
    assert_eq!(outcome.shifted.events[0].end_ms, 3_000);
    assert!(outcome.reference_preserved);
}

/// Re-aligning the aligned pair yields a shift of zero (idempotence).
#[tokio::test]
async fn test_align_twice_shouldConvergeToZeroShift() {
    let reference = make_track(
        SourceKind::External,
        &[(2_000, 4_000, "line one here"), (6_000, 8_000, "line two here")],
    );
    let shifted = make_track(
        SourceKind::External,
        &[(3_800, 5_800, "line one here"), (7_800, 9_800, "line two here")],
    );
    let cfg = config(SyncStrategy::FirstLine, 0.5);

    let first = align(
        &reference,
        &shifted,
        &cfg,
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    let second = align(
        &reference,
        &first.shifted,
        &cfg,
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    assert!(second.shift_ms.abs() <= 1, "residual shift {}", second.shift_ms);
}

/// The reference track is structurally untouched by alignment.
#[tokio::test]
async fn test_align_shouldLeaveReferenceUnchanged() {
    let reference = make_track(SourceKind::External, &[(1_000, 3_000, "same words")]);
    let shifted = make_track(SourceKind::External, &[(2_200, 4_200, "same words")]);
    let snapshot = reference.clone();

    let _ = align(
        &reference,
        &shifted,
        &config(SyncStrategy::FirstLine, 0.5),
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    assert_eq!(reference, snapshot);
}

/// Negative shifted timestamps clamp at zero; events pushed wholly
/// before zero are dropped.
#[tokio::test]
async fn test_align_withClampingShift_shouldDropNegativeEvents() {
    let reference = make_track(
        SourceKind::External,
        &[(500, 1_500, "spoken line one"), (3_000, 4_000, "spoken line two")],
    );
    let shifted = make_track(
        SourceKind::External,
        &[
            (100, 900, "prelude credit"),
            (2_000, 3_000, "spoken line one"),
            (4_500, 5_500, "spoken line two"),
        ],
    );
    // Anchor on the matching texts: shift = 500 - 2000 = -1500.
    let outcome = align(
        &reference,
        &shifted,
        &config(SyncStrategy::Scan, 0.5),
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.shift_ms, -1_500);
    // The prelude event [100, 900] lands at [-1400, -600] and is gone.
    assert_eq!(outcome.shifted.events.len(), 2);
    assert_eq!(outcome.shifted.events[0].start_ms, 500);
}

#[tokio::test]
async fn test_align_largeOffsetWithoutPermission_shouldAskForConfirmation() {
    let reference = make_track(SourceKind::External, &[(1_000, 2_000, "matching words")]);
    let shifted = make_track(SourceKind::External, &[(9_000, 10_000, "matching words")]);
    let result = align(
        &reference,
        &shifted,
        &config(SyncStrategy::FirstLine, 0.5),
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await;
    assert!(matches!(
        result,
        Err(AlignmentError::LargeOffsetRequiresConfirmation { shift_ms: -8_000 })
    ));
}

#[tokio::test]
async fn test_align_largeOffsetWithPermission_shouldSucceed() {
    let reference = make_track(SourceKind::External, &[(1_000, 2_000, "matching words")]);
    let shifted = make_track(SourceKind::External, &[(9_000, 10_000, "matching words")]);
    let cfg = AlignerConfig {
        strategy: SyncStrategy::FirstLine,
        min_confidence: 0.5,
        allow_large_offset: true,
        ..AlignerConfig::default()
    };
    let outcome = align(
        &reference,
        &shifted,
        &cfg,
        &AnchorSelector::Auto,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.shift_ms, -8_000);
}

#[tokio::test]
async fn test_align_withDecliningSelector_shouldReportDeclined() {
    let reference = make_track(SourceKind::External, &[(1_000, 2_000, "alpha words")]);
    let shifted = make_track(SourceKind::External, &[(1_500, 2_500, "毫无关系")]);
    let selector = AnchorSelector::from_fn(|_| SelectorChoice::Decline);
    let result = align(
        &reference,
        &shifted,
        &config(SyncStrategy::Scan, 0.9),
        &selector,
        &AnchorContext::untranslated(),
    )
    .await;
    assert!(matches!(result, Err(AlignmentError::SelectionDeclined)));
}

#[tokio::test]
async fn test_align_selectorReceivesAtMostFiveCandidates() {
    let reference = make_track(
        SourceKind::External,
        &[
            (1_000, 2_000, "aa bb cc"),
            (3_000, 4_000, "dd ee ff"),
            (5_000, 6_000, "gg hh ii"),
        ],
    );
    let shifted = make_track(
        SourceKind::External,
        &[
            (1_100, 2_100, "第一行字"),
            (3_100, 4_100, "第二行字"),
            (5_100, 6_100, "第三行字"),
        ],
    );
    let selector = AnchorSelector::from_fn(|candidates| {
        assert!(candidates.len() <= 5);
        SelectorChoice::Pair(0)
    });
    let outcome = align(
        &reference,
        &shifted,
        &config(SyncStrategy::Scan, 0.95),
        &selector,
        &AnchorContext::untranslated(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.shift_ms, -100);
}
