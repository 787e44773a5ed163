/*!
 * Main-dialogue track selection.
 *
 * Given the candidate subtitle tracks of a container (or a set of
 * external files), scores each one for "is this the main dialogue
 * track in the target language" and picks a winner. Forced/signs
 * tracks, commentary tracks, and wrong-language tracks score low.
 * Every granted or deducted point is recorded as a reasoning string
 * that surfaces in debug logs and selection warnings.
 */

use log::{debug, warn};

use crate::errors::SelectionError;
use crate::language_detector::{self, Lang};
use crate::subtitle_model::{CodecHint, RoleHint};

/// Score below which no candidate is acceptable.
const ACCEPTANCE_FLOOR: f64 = 25.0;

/// Title keywords that mark a non-dialogue track.
const NEGATIVE_TITLE_KEYWORDS: [&str; 5] =
    ["forced", "signs", "songs", "foreign parts", "commentary"];

/// Title keywords that mark a full dialogue track.
const POSITIVE_TITLE_KEYWORDS: [&str; 3] = ["full", "dialogue", "main"];

/// One candidate track as seen before selection.
#[derive(Debug, Clone)]
pub struct TrackCandidate {
    /// Stream index in source ordering
    pub stream_index: usize,
    /// Codec family
    pub codec: CodecHint,
    /// Container language tag, if any
    pub language_tag: Option<String>,
    /// Stream title or file name; may be empty
    pub title: String,
    /// Container forced-flag
    pub forced: bool,
    /// Container default-flag
    pub default: bool,
    /// Number of events (exact for loaded tracks, probed otherwise)
    pub event_count: usize,
    /// Concatenated text of the leading events, for classification
    pub sample_text: String,
}

/// A scored candidate with its assigned role.
#[derive(Debug, Clone)]
pub struct ScoredTrack {
    pub candidate: TrackCandidate,
    /// Weighted score in [0, 100]
    pub score: f64,
    /// Role the scorer assigned
    pub role_hint: RoleHint,
    /// Why points were granted or deducted
    pub reasoning: Vec<String>,
}

/// Score every candidate for the target language and rank them,
/// best first.
///
/// `remap_override` pins the language decision for a stream index,
/// overriding the classifier (the user's `--remap` escape hatch).
pub fn rank(
    candidates: &[TrackCandidate],
    target_language: &str,
    remap_override: Option<usize>,
) -> Vec<ScoredTrack> {
    let mut scored: Vec<ScoredTrack> = candidates
        .iter()
        .map(|c| score_candidate(c, target_language, remap_override))
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            // Tie-breakers: higher event count, non-forced, source order.
            .then_with(|| b.candidate.event_count.cmp(&a.candidate.event_count))
            .then_with(|| a.candidate.forced.cmp(&b.candidate.forced))
            .then_with(|| a.candidate.stream_index.cmp(&b.candidate.stream_index))
    });

    for track in &scored {
        debug!(
            "Track {} scored {:.0}/100 for {}: {}",
            track.candidate.stream_index,
            track.score,
            target_language,
            track.reasoning.join("; ")
        );
    }
    scored
}

/// Pick the main-dialogue track for the target language.
///
/// Returns `NoAcceptableCandidate` when the best score is below the
/// acceptance floor, instructing the caller to fall back (OCR, an
/// explicit override) or abort with a user-visible error.
pub fn select(
    candidates: &[TrackCandidate],
    target_language: &str,
    remap_override: Option<usize>,
) -> Result<ScoredTrack, SelectionError> {
    let ranked = rank(candidates, target_language, remap_override);
    let best = ranked
        .into_iter()
        .next()
        .ok_or_else(|| SelectionError::NoAcceptableCandidate {
            language: target_language.to_string(),
            best_score: 0.0,
        })?;

    if best.score < ACCEPTANCE_FLOOR {
        warn!(
            "Best {} candidate (track {}) scored only {:.0}/100: {}",
            target_language,
            best.candidate.stream_index,
            best.score,
            best.reasoning.join("; ")
        );
        return Err(SelectionError::NoAcceptableCandidate {
            language: target_language.to_string(),
            best_score: best.score,
        });
    }
    Ok(best)
}

fn score_candidate(
    candidate: &TrackCandidate,
    target_language: &str,
    remap_override: Option<usize>,
) -> ScoredTrack {
    let mut reasoning = Vec::new();
    let mut score = 0.0;

    score += score_language(candidate, target_language, remap_override, &mut reasoning);
    score += score_event_count(candidate.event_count, &mut reasoning);
    score += score_title(candidate, &mut reasoning);
    score += score_content_shape(&candidate.sample_text, &mut reasoning);

    let score = score.clamp(0.0, 100.0);
    let role_hint = assign_role(candidate);

    ScoredTrack {
        candidate: candidate.clone(),
        score,
        role_hint,
        reasoning,
    }
}

/// Language match: 40 for a top-ranked classifier hit, 15 for second
/// place. A remap override grants full marks unconditionally.
fn score_language(
    candidate: &TrackCandidate,
    target: &str,
    remap_override: Option<usize>,
    reasoning: &mut Vec<String>,
) -> f64 {
    if remap_override == Some(candidate.stream_index) {
        reasoning.push("language remap override (+40)".to_string());
        return 40.0;
    }

    // The container tag participates as a filename-style hint; content
    // dominates when they disagree.
    let hint = candidate
        .language_tag
        .as_deref()
        .map(|tag| format!("x.{}.srt", tag));
    let ranked = language_detector::classify(&candidate.sample_text, hint.as_deref());

    let position = ranked
        .iter()
        .position(|entry| entry.lang.matches_tag(target));
    match position {
        Some(0) => {
            reasoning.push(format!("classifier top language matches {} (+40)", target));
            40.0
        }
        Some(1) => {
            reasoning.push(format!("classifier second language matches {} (+15)", target));
            15.0
        }
        _ => {
            // An untagged empty sample gives the tag the benefit of the
            // doubt; a confident mismatch gives nothing.
            if ranked.is_empty()
                && candidate
                    .language_tag
                    .as_deref()
                    .map(|tag| language_detector::tags_match(tag, target))
                    .unwrap_or(false)
            {
                reasoning.push("container tag matches target, no text sample (+15)".to_string());
                15.0
            } else {
                reasoning.push(format!("no {} match (+0)", target));
                0.0
            }
        }
    }
}

/// Event-count credibility: 0 below 20 events (likely forced/signs),
/// linear ramp to 25 points at 300 events.
fn score_event_count(count: usize, reasoning: &mut Vec<String>) -> f64 {
    let points = if count < 20 {
        0.0
    } else if count >= 300 {
        25.0
    } else {
        25.0 * (count as f64 - 20.0) / 280.0
    };
    reasoning.push(format!("{} events (+{:.0})", count, points));
    points
}

/// Title hints: negative keywords or the forced flag cost 20 points;
/// positive keywords grant 10.
fn score_title(candidate: &TrackCandidate, reasoning: &mut Vec<String>) -> f64 {
    let title = candidate.title.to_lowercase();
    let mut points = 0.0;

    if candidate.forced
        || NEGATIVE_TITLE_KEYWORDS.iter().any(|k| title.contains(k))
    {
        reasoning.push("forced/signs/commentary marker (-20)".to_string());
        points -= 20.0;
    }
    if POSITIVE_TITLE_KEYWORDS.iter().any(|k| title.contains(k)) {
        reasoning.push("dialogue marker in title (+10)".to_string());
        points += 10.0;
    }
    points
}

/// Content shape: share of sample lines ending in sentence punctuation,
/// scaled to [0, 15]. Dialogue ends sentences; signs and song lyrics
/// mostly do not.
fn score_content_shape(sample: &str, reasoning: &mut Vec<String>) -> f64 {
    let lines: Vec<&str> = sample
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() {
        reasoning.push("no sample text (+0)".to_string());
        return 0.0;
    }

    let terminated = lines
        .iter()
        .filter(|l| {
            l.chars()
                .last()
                .map(|c| ".!?。！？…\"”".contains(c))
                .unwrap_or(false)
        })
        .count();
    let ratio = terminated as f64 / lines.len() as f64;
    let points = ratio * 15.0;
    reasoning.push(format!(
        "{:.0}% sentence-terminated lines (+{:.0})",
        ratio * 100.0,
        points
    ));
    points
}

fn assign_role(candidate: &TrackCandidate) -> RoleHint {
    let title = candidate.title.to_lowercase();
    if title.contains("commentary") {
        RoleHint::Commentary
    } else if candidate.forced
        || candidate.event_count < 20
        || NEGATIVE_TITLE_KEYWORDS.iter().any(|k| title.contains(k))
    {
        RoleHint::ForcedOrSigns
    } else {
        RoleHint::Main
    }
}

/// Classify the sample text of a candidate, for callers that need the
/// language independent of scoring.
pub fn classify_candidate(candidate: &TrackCandidate) -> Option<Lang> {
    language_detector::classify(&candidate.sample_text, None)
        .first()
        .map(|s| s.lang)
}
