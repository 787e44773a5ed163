/*!
 * Error types for the bisubs engine.
 *
 * Each pipeline stage returns a success-or-reason value; the controller
 * pattern-matches on the reason to decide between retry strategies,
 * degraded output, and aborting the job. Errors are defined with the
 * thiserror crate.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or decoding an input file.
#[derive(Error, Debug)]
pub enum InputError {
    /// The referenced file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The file extension or content does not match a supported format.
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// Every encoding candidate failed to produce a clean decode.
    #[error("Could not decode {path} after trying {attempts} encodings")]
    DecodeFailed {
        /// Input file path
        path: PathBuf,
        /// Number of encodings attempted
        attempts: usize,
    },

    /// The container has no subtitle streams at all.
    #[error("No subtitle tracks found in {0}")]
    NoCandidateTracks(PathBuf),

    /// A parser consumed the whole input without producing a single event.
    #[error("No valid subtitle events in {0}")]
    EmptyTrack(PathBuf),
}

/// Track selection produced no candidate above the acceptance floor.
///
/// Surfaced as a warning; the caller may supply an explicit track override
/// or abort.
#[derive(Error, Debug)]
pub enum SelectionError {
    /// Best score was below the acceptance threshold.
    #[error("No acceptable {language} dialogue track (best score {best_score:.0}/100)")]
    NoAcceptableCandidate {
        /// Target language that was requested
        language: String,
        /// Score of the best-ranked candidate
        best_score: f64,
    },

    /// An explicit track override referenced a stream that does not exist.
    #[error("Track override {index} does not match any subtitle stream")]
    OverrideNotFound {
        /// The stream index from the override
        index: usize,
    },
}

/// Distinct alignment failure reasons the caller can discriminate.
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// Every anchor strategy came up empty.
    #[error("No anchor candidates found between the two tracks")]
    NoAnchorCandidates,

    /// The best candidate's confidence did not reach the configured floor.
    #[error("Best anchor confidence {confidence:.2} is below threshold {threshold:.2}")]
    ConfidenceBelowThreshold {
        /// Confidence of the best candidate
        confidence: f64,
        /// The configured minimum
        threshold: f64,
    },

    /// |shift| exceeds 5 s and the caller has not allowed large offsets.
    #[error("Computed shift of {shift_ms} ms requires confirmation (allow_large_offset is off)")]
    LargeOffsetRequiresConfirmation {
        /// The computed global shift in milliseconds
        shift_ms: i64,
    },

    /// Fewer than 70% of reference boundaries survived into the merged output.
    #[error("Alignment validation failed: only {preserved_pct:.0}% of reference timings reproduced")]
    ValidationFailed {
        /// Percentage of reference event boundaries reproduced within tolerance
        preserved_pct: f64,
    },

    /// The selector callback declined every presented candidate.
    #[error("Manual anchor selection declined")]
    SelectionDeclined,

    /// The selector callback cancelled the job.
    #[error("Alignment cancelled by selector")]
    Cancelled,

    /// Automatic strategies are exhausted; a human has to pick the anchor.
    #[error("Automatic alignment failed; manual anchor selection required")]
    ManualRequired,
}

/// Failures from external collaborators (translator, container tools, OCR).
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// The collaborator did not answer within its deadline.
    #[error("{name} timed out after {seconds} s")]
    Timeout {
        /// Collaborator name ("translator", "ffmpeg", ...)
        name: &'static str,
        /// Deadline that elapsed
        seconds: u64,
    },

    /// The translation-call budget for one alignment was exhausted.
    #[error("Translation budget of {budget} calls exhausted")]
    BudgetExhausted {
        /// Maximum calls allowed per alignment
        budget: usize,
    },

    /// The collaborator process or service reported a failure.
    #[error("{name} failed: {message}")]
    Failed {
        /// Collaborator name
        name: &'static str,
        /// Failure details
        message: String,
    },

    /// The collaborator is not configured for this job.
    #[error("{0} is not available for this job")]
    Unavailable(&'static str),
}

/// Output-phase failures. Fatal for the job; no partial file survives.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Could not create or fill the temporary file.
    #[error("Failed to write temporary output: {0}")]
    TempWrite(String),

    /// The atomic rename onto the final path failed.
    #[error("Failed to move output into place at {path}: {message}")]
    Rename {
        /// Final destination path
        path: PathBuf,
        /// OS error detail
        message: String,
    },
}

/// Top-level job error wrapping each stage's failure reason.
#[derive(Error, Debug)]
pub enum JobError {
    /// Input loading or decoding failed
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// No usable dialogue track
    #[error("Track selection failed: {0}")]
    Selection(#[from] SelectionError),

    /// Alignment failed with a discriminated reason
    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentError),

    /// An external collaborator failed
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Writing the output failed
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// The job was cancelled by the caller
    #[error("Job cancelled")]
    Cancelled,

    /// Any other error
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for JobError {
    fn from(error: anyhow::Error) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<std::io::Error> for JobError {
    fn from(error: std::io::Error) -> Self {
        Self::Other(error.to_string())
    }
}
