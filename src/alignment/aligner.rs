use log::{debug, info, warn};

use crate::alignment::anchor::{self, AnchorContext, LARGE_OFFSET_MS};
use crate::alignment::{Anchor, AlignmentOutcome, AnchorSelector, SelectorChoice};
use crate::app_config::SyncStrategy;
use crate::errors::AlignmentError;
use crate::merger;
use crate::subtitle_model::Track;

// @module: Global time-shift alignment of the non-reference track

/// Tolerance for reference-boundary reproduction, and the pre-anchor
/// trim epsilon, in milliseconds.
pub const BOUNDARY_TOLERANCE_MS: u64 = 100;

/// Minimum share of reference boundaries that must survive merging.
pub const MIN_PRESERVED_FRACTION: f64 = 0.7;

/// Candidates presented to a selector callback.
const PRESENTED_CANDIDATES: usize = 5;

/// Aligner configuration, resolved from the job options by the caller.
#[derive(Debug, Clone)]
pub struct AlignerConfig {
    /// Confidence floor for automatic adoption
    pub min_confidence: f64,
    /// Permit |shift| > 5 s without confirmation
    pub allow_large_offset: bool,
    /// Drop shifted events that end before the reference begins
    pub enable_pre_anchor_trim: bool,
    /// Anchor strategy (Auto tries them in order)
    pub strategy: SyncStrategy,
    /// Weld distance used for the validation merge
    pub weld_threshold_ms: u64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        AlignerConfig {
            min_confidence: 0.8,
            allow_large_offset: false,
            enable_pre_anchor_trim: false,
            strategy: SyncStrategy::Auto,
            weld_threshold_ms: merger::DEFAULT_WELD_THRESHOLD_MS,
        }
    }
}

// Alignment attempt states, for tracing:
// init -> finding_anchor -> (anchor_ok | anchor_failed) -> shifting
//      -> validating -> (done | rejected)

/// Align `shifted` to `reference` by one global time shift.
///
/// The reference track is never mutated; the returned outcome carries a
/// newly built shifted track. Every rejection reason is a distinct
/// [`AlignmentError`] variant.
pub async fn align(
    reference: &Track,
    shifted: &Track,
    config: &AlignerConfig,
    selector: &AnchorSelector,
    ctx: &AnchorContext<'_>,
) -> Result<AlignmentOutcome, AlignmentError> {
    debug!("Alignment state: finding_anchor ({})", config.strategy);
    let candidates = anchor::find_anchors(
        reference,
        shifted,
        config.strategy,
        config.min_confidence,
        ctx,
    )
    .await;
    if candidates.is_empty() {
        debug!("Alignment state: anchor_failed");
        return Err(AlignmentError::NoAnchorCandidates);
    }

    let chosen = choose_anchor(&candidates, config, selector)?;
    debug!(
        "Alignment state: anchor_ok ({}, {}) via {}",
        chosen.reference_index, chosen.shifted_index, chosen.method
    );

    // The global shift implied by the chosen pair.
    let shift = reference.events[chosen.reference_index].start_ms as i64
        - shifted.events[chosen.shifted_index].start_ms as i64;

    if shift.abs() > LARGE_OFFSET_MS && !config.allow_large_offset {
        return Err(AlignmentError::LargeOffsetRequiresConfirmation { shift_ms: shift });
    }

    debug!("Alignment state: shifting by {} ms", shift);
    let (mut shifted_track, clamped) = apply_shift(shifted, shift);

    let mut trimmed = 0usize;
    if config.enable_pre_anchor_trim {
        trimmed = trim_pre_anchor(&mut shifted_track, reference);
    }
    if clamped > 0 || trimmed > 0 {
        info!(
            "Shifted track: {} event(s) clamped at zero, {} trimmed before the reference start",
            clamped, trimmed
        );
    }

    debug!("Alignment state: validating");
    let preserved = preserved_fraction(reference, &shifted_track, config.weld_threshold_ms);
    if preserved < MIN_PRESERVED_FRACTION {
        warn!(
            "Alignment rejected: only {:.0}% of reference boundaries reproduced",
            preserved * 100.0
        );
        return Err(AlignmentError::ValidationFailed {
            preserved_pct: preserved * 100.0,
        });
    }

    debug!("Alignment state: done");
    Ok(AlignmentOutcome {
        anchor: chosen,
        shift_ms: shift,
        shifted: shifted_track,
        reference_preserved: true,
        trimmed_events: trimmed,
    })
}

/// Adopt the best candidate automatically when allowed, otherwise put
/// the leading candidates to the selector.
fn choose_anchor(
    candidates: &[Anchor],
    config: &AlignerConfig,
    selector: &AnchorSelector,
) -> Result<Anchor, AlignmentError> {
    let best = &candidates[0];

    match selector {
        AnchorSelector::Auto => {
            if best.confidence >= config.min_confidence {
                Ok(best.clone())
            } else {
                Err(AlignmentError::ConfidenceBelowThreshold {
                    confidence: best.confidence,
                    threshold: config.min_confidence,
                })
            }
        }
        AnchorSelector::Callback(callback) => {
            if best.confidence >= config.min_confidence {
                return Ok(best.clone());
            }
            let presented: Vec<Anchor> = candidates
                .iter()
                .take(PRESENTED_CANDIDATES)
                .cloned()
                .collect();
            match callback(&presented) {
                SelectorChoice::Pair(position) => presented
                    .get(position)
                    .cloned()
                    .ok_or(AlignmentError::SelectionDeclined),
                SelectorChoice::Decline => Err(AlignmentError::SelectionDeclined),
                SelectorChoice::Cancel => Err(AlignmentError::Cancelled),
            }
        }
    }
}

/// Build the shifted track: every timestamp moved by `shift_ms`,
/// negative starts clamped to zero, events ending at or before zero
/// dropped. Returns the new track and the count of dropped events.
fn apply_shift(track: &Track, shift_ms: i64) -> (Track, usize) {
    let mut result = track.clone();
    let mut dropped = 0usize;
    result.events = track
        .events
        .iter()
        .filter_map(|event| {
            let start = event.start_ms as i64 + shift_ms;
            let end = event.end_ms as i64 + shift_ms;
            if end <= 0 {
                dropped += 1;
                return None;
            }
            let mut shifted = event.clone();
            shifted.start_ms = start.max(0) as u64;
            shifted.end_ms = end as u64;
            Some(shifted)
        })
        .collect();
    result.normalize();
    (result, dropped)
}

/// Drop shifted events that end before the reference track begins
/// (minus the tolerance epsilon). Returns the number removed.
fn trim_pre_anchor(shifted: &mut Track, reference: &Track) -> usize {
    let reference_start = match reference.first_start_ms() {
        Some(start) => start,
        None => return 0,
    };
    let cutoff = reference_start.saturating_sub(BOUNDARY_TOLERANCE_MS);
    let before = shifted.events.len();
    shifted.events.retain(|e| e.end_ms >= cutoff);
    shifted.normalize();
    before - shifted.events.len()
}

/// Share of reference events whose start boundary reappears within
/// tolerance in the merged output. Callers that skip the shift step
/// still have to clear [`MIN_PRESERVED_FRACTION`] on this measure.
pub fn preserved_fraction(reference: &Track, shifted: &Track, weld_threshold_ms: u64) -> f64 {
    if reference.events.is_empty() {
        return 1.0;
    }
    let merged = merger::merge_interleaved(reference, shifted, weld_threshold_ms);
    let preserved = reference
        .events
        .iter()
        .filter(|event| {
            merged.events.iter().any(|o| {
                (o.start_ms as i64 - event.start_ms as i64).abs()
                    <= BOUNDARY_TOLERANCE_MS as i64
            })
        })
        .count();
    preserved as f64 / reference.events.len() as f64
}
