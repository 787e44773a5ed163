/*!
 * # bisubs - Bilingual Subtitle Merger
 *
 * A Rust library for building a single bilingual subtitle track out of
 * two monolingual tracks (typically Chinese and English), whether they
 * come from standalone files or from streams embedded in a video
 * container.
 *
 * ## Features
 *
 * - Parse and write SRT, ASS/SSA and WebVTT with tolerant parsers and
 *   encoding detection (UTF-8/16, GB18030/GBK, Big5, Shift-JIS)
 * - Score candidate tracks to find the main dialogue track and reject
 *   forced/signs/commentary tracks
 * - Globally synchronize two tracks whose clocks differ by seconds to
 *   minutes, via text-similarity anchors with optional machine
 *   translation assistance
 * - Merge aligned tracks into interleaved bilingual SRT (with
 *   anti-flicker welding) or dual-style bilingual ASS
 * - Batch process whole directories over a small worker pool
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: the explicit option record every component reads
 * - `subtitle_model`: events, tracks and their invariants
 * - `formats`: SRT/ASS/VTT adapters
 * - `encoding_detector`: byte-level encoding detection and decoding
 * - `language_detector`: Unicode-block language classification
 * - `track_selector`: main-dialogue track scoring
 * - `alignment`: anchor finding, shifting, and validation
 * - `merger`: the two bilingual merge modes
 * - `container`: ffprobe/ffmpeg collaborator
 * - `ocr`: OCR collaborator seam for image-based streams
 * - `translator`: translation collaborator seam with per-job caching
 * - `app_controller`: per-job orchestration and batch mode
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod container;
pub mod encoding_detector;
pub mod errors;
pub mod file_utils;
pub mod formats;
pub mod language_detector;
pub mod merger;
pub mod ocr;
pub mod subtitle_model;
pub mod track_selector;
pub mod translator;

// Re-export main types for easier usage
pub use alignment::{AlignmentOutcome, Anchor, AnchorMethod, AnchorSelector, SelectorChoice};
pub use app_config::{MergeConfig, OutputFormat, SyncStrategy};
pub use app_controller::{BatchSummary, Controller, JobReport, JobSpec};
pub use errors::{AlignmentError, JobError};
pub use subtitle_model::{Event, Track};
