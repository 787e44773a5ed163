/*!
 * Bilingual track alignment.
 *
 * Two tracks covering the same program rarely share a clock: embedded
 * and external sources can differ by seconds to minutes. This module
 * finds an anchor pair of events between the reference track and the
 * shifted track, derives a single global offset from it, applies the
 * offset, and validates that the reference timings survive merging.
 *
 * - `similarity`: text similarity measures used to match candidate pairs
 * - `anchor`: the anchor-finding strategies
 * - `aligner`: shift application, guardrails, and validation
 */

pub mod aligner;
pub mod anchor;
pub mod similarity;

use std::fmt;

use crate::subtitle_model::Track;

/// How an anchor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorMethod {
    /// First events of both tracks paired directly
    FirstLine,
    /// Similarity scan over the leading events
    Scan,
    /// Scan with machine-translated shifted-track text
    Translation,
    /// Human-selected pair
    Manual,
    /// Wide-window scan for large offsets
    Semantic,
}

impl fmt::Display for AnchorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstLine => write!(f, "first_line"),
            Self::Scan => write!(f, "scan"),
            Self::Translation => write!(f, "translation"),
            Self::Manual => write!(f, "manual"),
            Self::Semantic => write!(f, "semantic"),
        }
    }
}

/// A candidate pairing between one reference event and one shifted
/// event, with the global offset it implies.
#[derive(Debug, Clone)]
pub struct Anchor {
    /// Index into the reference track's events (0-based)
    pub reference_index: usize,
    /// Index into the shifted track's events (0-based)
    pub shifted_index: usize,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// reference.start_ms − shifted.start_ms
    pub offset_ms: i64,
    /// Strategy that produced this candidate
    pub method: AnchorMethod,
    /// Reference event text, for display to a selector
    pub reference_text: String,
    /// Shifted event text, for display to a selector
    pub shifted_text: String,
}

/// Outcome of a manual anchor selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorChoice {
    /// Use the candidate at this position in the presented list
    Pair(usize),
    /// None of the candidates is right; alignment fails
    Decline,
    /// Abort the whole job
    Cancel,
}

/// Chooses among presented anchor candidates.
///
/// Tests inject deterministic selectors; a CLI wires an interactive
/// prompt; `Auto` adopts the best candidate when its confidence clears
/// the configured floor.
pub enum AnchorSelector {
    /// Adopt the best candidate automatically
    Auto,
    /// Ask a callback to choose
    Callback(Box<dyn Fn(&[Anchor]) -> SelectorChoice + Send + Sync>),
}

impl AnchorSelector {
    /// Convenience constructor for callback selectors.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&[Anchor]) -> SelectorChoice + Send + Sync + 'static,
    {
        Self::Callback(Box::new(f))
    }
}

impl fmt::Debug for AnchorSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "AnchorSelector::Auto"),
            Self::Callback(_) => write!(f, "AnchorSelector::Callback"),
        }
    }
}

/// Result of a completed alignment: the chosen anchor, the shifted
/// track after offset and trimming, and the preserved reference flag.
#[derive(Debug)]
pub struct AlignmentOutcome {
    /// The adopted anchor
    pub anchor: Anchor,
    /// Global shift applied to the shifted track, in milliseconds
    pub shift_ms: i64,
    /// The shifted track, post-shift, pre-anchor events removed
    pub shifted: Track,
    /// True when the reference track was left untouched (always the
    /// case; recorded for the caller's audit)
    pub reference_preserved: bool,
    /// Events dropped by the pre-anchor trim
    pub trimmed_events: usize,
}
