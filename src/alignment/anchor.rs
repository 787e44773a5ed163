use log::{debug, warn};

use crate::alignment::{similarity, Anchor, AnchorMethod};
use crate::app_config::SyncStrategy;
use crate::subtitle_model::Track;
use crate::translator::JobTranslator;

// @module: Anchor-point discovery between two subtitle tracks

/// Events examined by the standard scan.
pub const SCAN_WINDOW: usize = 10;

/// Events examined in large-offset (semantic) mode.
pub const SEMANTIC_WINDOW: usize = 40;

/// Confidence floor accepted in semantic mode.
pub const SEMANTIC_MIN_CONFIDENCE: f64 = 0.15;

/// Beyond this first-line offset the first_line strategy is discarded.
const FIRST_LINE_MAX_OFFSET_MS: i64 = 2_000;

/// A preliminary offset beyond this requires the semantic strategy.
pub const LARGE_OFFSET_MS: i64 = 5_000;

/// Offsets are compared to the median within this band.
const OFFSET_BAND_MS: f64 = 10_000.0;

/// Candidates kept per scan.
const KEEP_CANDIDATES: usize = 5;

/// Cross-language context for the finder.
pub struct AnchorContext<'a> {
    /// Translator wrapped with the per-job cache and call budget
    pub translator: Option<&'a JobTranslator<'a>>,
    /// Language of the reference track, when known
    pub reference_lang: Option<String>,
    /// Language of the shifted track, when known
    pub shifted_lang: Option<String>,
}

impl AnchorContext<'_> {
    /// No translator, no language hints.
    pub fn untranslated() -> Self {
        AnchorContext {
            translator: None,
            reference_lang: None,
            shifted_lang: None,
        }
    }

    fn cross_language(&self) -> bool {
        match (&self.reference_lang, &self.shifted_lang) {
            (Some(a), Some(b)) => !crate::language_detector::tags_match(a, b),
            _ => true,
        }
    }
}

/// Find anchor candidates between `reference` and `shifted`.
///
/// With `SyncStrategy::Auto` the strategies run in order (first_line,
/// scan, translation-assisted scan, wide-window semantic scan) until
/// one yields a candidate at or above `min_confidence`; everything
/// found along the way stays in the result so a selector can be shown
/// alternatives. A forced strategy runs alone. An empty result means
/// anchoring failed.
pub async fn find_anchors(
    reference: &Track,
    shifted: &Track,
    strategy: SyncStrategy,
    min_confidence: f64,
    ctx: &AnchorContext<'_>,
) -> Vec<Anchor> {
    if reference.events.is_empty() || shifted.events.is_empty() {
        return Vec::new();
    }

    let mut candidates = match strategy {
        // A forced first_line pairs the opening events whatever the
        // offset; the 2 s discard only prunes the automatic chain.
        SyncStrategy::FirstLine => first_line(reference, shifted, ctx, false)
            .await
            .into_iter()
            .collect(),
        SyncStrategy::Scan => scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Scan, ctx, false).await,
        SyncStrategy::Translation => {
            scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Translation, ctx, true).await
        }
        SyncStrategy::Manual => {
            // Gather material for the selector from both scan flavors.
            let mut found =
                scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Scan, ctx, false).await;
            if ctx.translator.is_some() && ctx.cross_language() {
                found.extend(
                    scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Translation, ctx, true)
                        .await,
                );
            }
            found
        }
        SyncStrategy::Auto => auto_strategies(reference, shifted, min_confidence, ctx).await,
    };

    dedup_candidates(&mut candidates);
    candidates.truncate(KEEP_CANDIDATES);
    for anchor in &candidates {
        debug!(
            "Anchor candidate ({}, {}) offset {} ms confidence {:.2} via {}",
            anchor.reference_index,
            anchor.shifted_index,
            anchor.offset_ms,
            anchor.confidence,
            anchor.method
        );
    }
    candidates
}

async fn auto_strategies(
    reference: &Track,
    shifted: &Track,
    min_confidence: f64,
    ctx: &AnchorContext<'_>,
) -> Vec<Anchor> {
    let mut all: Vec<Anchor> = Vec::new();
    let preliminary = preliminary_offset(reference, shifted);
    let large_offset = preliminary.abs() > LARGE_OFFSET_MS;

    if !large_offset {
        if let Some(anchor) = first_line(reference, shifted, ctx, true).await {
            if anchor.confidence >= min_confidence {
                return vec![anchor];
            }
            all.push(anchor);
        }

        let scanned =
            scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Scan, ctx, false).await;
        if best_confidence(&scanned) >= min_confidence {
            return scanned;
        }
        all.extend(scanned);

        if ctx.translator.is_some() && ctx.cross_language() {
            let translated =
                scan(reference, shifted, SCAN_WINDOW, AnchorMethod::Translation, ctx, true).await;
            if best_confidence(&translated) >= min_confidence {
                return translated;
            }
            all.extend(translated);
        }
    }

    // Large-offset mode: widen the window and accept low confidence.
    let semantic = scan(
        reference,
        shifted,
        SEMANTIC_WINDOW,
        AnchorMethod::Semantic,
        ctx,
        ctx.translator.is_some() && ctx.cross_language(),
    )
    .await;
    all.extend(
        semantic
            .into_iter()
            .filter(|a| a.confidence >= SEMANTIC_MIN_CONFIDENCE),
    );

    all
}

/// First events of both tracks paired directly. In the automatic
/// chain the pairing is discarded when the implied offset exceeds 2 s.
async fn first_line(
    reference: &Track,
    shifted: &Track,
    ctx: &AnchorContext<'_>,
    discard_large: bool,
) -> Option<Anchor> {
    let a = reference.events.first()?;
    let b = shifted.events.first()?;
    let offset = a.start_ms as i64 - b.start_ms as i64;
    if discard_large && offset.abs() > FIRST_LINE_MAX_OFFSET_MS {
        return None;
    }

    let compared = match translate_leading(ctx, shifted, 1).await {
        Some(mut texts) => texts.remove(0),
        None => b.text.clone(),
    };
    let sim = similarity::similarity(&a.text, &compared);
    let confidence = if sim >= 0.5 { 0.9 } else { 0.5 };

    Some(Anchor {
        reference_index: 0,
        shifted_index: 0,
        confidence,
        offset_ms: offset,
        method: AnchorMethod::FirstLine,
        reference_text: a.text.clone(),
        shifted_text: b.text.clone(),
    })
}

/// Score every (i, j) pair in the leading window by a blend of text
/// similarity and agreement with the median implied offset, and keep
/// the best few.
async fn scan(
    reference: &Track,
    shifted: &Track,
    window: usize,
    method: AnchorMethod,
    ctx: &AnchorContext<'_>,
    translate: bool,
) -> Vec<Anchor> {
    let ka = window.min(reference.events.len());
    let kb = window.min(shifted.events.len());
    if ka == 0 || kb == 0 {
        return Vec::new();
    }

    let mut translation_used = false;
    let shifted_texts: Vec<String> = if translate {
        match translate_leading(ctx, shifted, kb).await {
            Some(texts) => {
                translation_used = true;
                texts
            }
            None => {
                if method == AnchorMethod::Translation {
                    // Nothing to compare against the reference language.
                    return Vec::new();
                }
                shifted.events.iter().take(kb).map(|e| e.text.clone()).collect()
            }
        }
    } else {
        shifted.events.iter().take(kb).map(|e| e.text.clone()).collect()
    };

    struct Pair {
        i: usize,
        j: usize,
        sim: f64,
        offset: i64,
    }

    let mut pairs = Vec::with_capacity(ka * kb);
    for i in 0..ka {
        for j in 0..kb {
            let sim = similarity::similarity(&reference.events[i].text, &shifted_texts[j]);
            let offset =
                reference.events[i].start_ms as i64 - shifted.events[j].start_ms as i64;
            pairs.push(Pair { i, j, sim, offset });
        }
    }

    // Median implied offset among the top-K pairs by similarity.
    let mut by_sim: Vec<&Pair> = pairs.iter().collect();
    by_sim.sort_by(|x, y| y.sim.partial_cmp(&x.sim).unwrap_or(std::cmp::Ordering::Equal));
    let mut leading_offsets: Vec<i64> =
        by_sim.iter().take(window).map(|p| p.offset).collect();
    leading_offsets.sort_unstable();
    let median_offset = leading_offsets[leading_offsets.len() / 2];

    let offset_agreement = |offset: i64| -> f64 {
        1.0 - (((offset - median_offset).abs() as f64) / OFFSET_BAND_MS).clamp(0.0, 1.0)
    };

    let mut scored: Vec<(f64, &Pair)> = pairs
        .iter()
        .map(|p| (0.6 * p.sim + 0.4 * offset_agreement(p.offset), p))
        .collect();
    scored.sort_by(|x, y| y.0.partial_cmp(&x.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(KEEP_CANDIDATES)
        .map(|(_, p)| Anchor {
            reference_index: p.i,
            shifted_index: p.j,
            confidence: confidence(p.sim, offset_agreement(p.offset), translation_used),
            offset_ms: p.offset,
            method,
            reference_text: reference.events[p.i].text.clone(),
            shifted_text: shifted.events[p.j].text.clone(),
        })
        .collect()
}

/// Rescale a pair's evidence into [0, 1].
fn confidence(sim: f64, offset_agreement: f64, translation_used: bool) -> f64 {
    let translation_term = if translation_used { 1.0 } else { 0.7 };
    (0.5 * sim + 0.3 * offset_agreement + 0.2 * translation_term).clamp(0.0, 1.0)
}

/// Translate the leading `count` shifted-track events into the
/// reference language. `None` when no translator is configured, the
/// languages are unknown, or the service fails (the caller falls back
/// to untranslated comparison).
async fn translate_leading(
    ctx: &AnchorContext<'_>,
    shifted: &Track,
    count: usize,
) -> Option<Vec<String>> {
    let translator = ctx.translator?;
    if !ctx.cross_language() {
        return None;
    }
    let source = ctx.shifted_lang.as_deref()?;
    let target = ctx.reference_lang.as_deref()?;

    let texts: Vec<String> = shifted
        .events
        .iter()
        .take(count)
        .map(|e| e.text.clone())
        .collect();
    match translator.translate(&texts, source, target).await {
        Ok(translated) => Some(translated),
        Err(e) => {
            warn!("Translation-assisted anchoring unavailable: {}", e);
            None
        }
    }
}

/// The crude offset estimate used to decide on large-offset mode.
pub fn preliminary_offset(reference: &Track, shifted: &Track) -> i64 {
    match (reference.first_start_ms(), shifted.first_start_ms()) {
        (Some(a), Some(b)) => a as i64 - b as i64,
        _ => 0,
    }
}

fn best_confidence(candidates: &[Anchor]) -> f64 {
    candidates
        .iter()
        .map(|a| a.confidence)
        .fold(0.0, f64::max)
}

/// Drop duplicate (i, j) pairs, keeping the highest-confidence copy,
/// and order the survivors best-first.
fn dedup_candidates(candidates: &mut Vec<Anchor>) {
    candidates.sort_by(|x, y| {
        y.confidence
            .partial_cmp(&x.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|a| seen.insert((a.reference_index, a.shifted_index)));
}
