use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use tempfile::TempDir;

use crate::alignment::aligner::{self, AlignerConfig};
use crate::alignment::anchor::AnchorContext;
use crate::alignment::{AlignmentOutcome, AnchorSelector};
use crate::app_config::{MergeConfig, OutputFormat, ReferencePreference, SyncStrategy};
use crate::container::{self, ExtractCodec, SubtitleStream};
use crate::errors::{AlignmentError, CollaboratorError, InputError, JobError};
use crate::file_utils::FileManager;
use crate::formats::{self, FormatKind};
use crate::language_detector;
use crate::merger;
use crate::ocr::{OcrEngine, OcrLanguage};
use crate::subtitle_model::{SourceKind, Track};
use crate::track_selector::{self, TrackCandidate};
use crate::translator::{JobTranslator, Translator};

/// Application controller module
/// Coordinates one merge job end to end: resolve the two language
/// tracks, align, merge, and write the output atomically. Batch mode
/// fans whole jobs out over a small worker pool.

/// Two standalone files may skip global alignment only when their
/// sampled clocks agree within the merge boundary tolerance (first
/// ten events, index-paired). Anything looser must go through the
/// aligner.
const SYNC_AVG_THRESHOLD_MS: u64 = aligner::BOUNDARY_TOLERANCE_MS;
const SYNC_MAX_THRESHOLD_MS: u64 = aligner::BOUNDARY_TOLERANCE_MS;

/// Inputs for one merge job.
#[derive(Debug, Clone, Default)]
pub struct JobSpec {
    /// Video container supplying embedded tracks and the output name
    pub video: Option<PathBuf>,
    /// Explicit subtitle file for the primary language
    pub primary_subtitle: Option<PathBuf>,
    /// Explicit subtitle file for the secondary language
    pub secondary_subtitle: Option<PathBuf>,
    /// Output path; defaults to `<base>.<primary>-<secondary>.<ext>`
    pub output: Option<PathBuf>,
}

impl JobSpec {
    /// Job for a single video, everything resolved automatically.
    pub fn for_video(video: impl Into<PathBuf>) -> Self {
        JobSpec {
            video: Some(video.into()),
            ..JobSpec::default()
        }
    }

    /// Job for two explicit subtitle files.
    pub fn for_files(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        JobSpec {
            primary_subtitle: Some(primary.into()),
            secondary_subtitle: Some(secondary.into()),
            ..JobSpec::default()
        }
    }

}

/// What a completed job reports back.
#[derive(Debug)]
pub struct JobReport {
    /// Where the merged track was written
    pub output_path: PathBuf,
    /// Adopted anchor method, shift and confidence; `None` when the
    /// tracks were already synchronized
    pub alignment: Option<(String, i64, f64)>,
    /// Events in the merged output
    pub merged_events: usize,
    /// Non-fatal findings surfaced to the caller
    pub warnings: Vec<String>,
    /// True when alignment only succeeded on a retry strategy
    pub degraded: bool,
}

/// Per-input outcome of a batch run.
#[derive(Debug)]
pub enum BatchOutcome {
    Ok(PathBuf),
    OkWithWarnings(PathBuf, usize),
    Skipped,
    Failed(String),
}

/// Batch run summary: one line per input plus counts.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub warned: usize,
    pub skipped: usize,
    pub failed: usize,
    /// `<input>: ok|warning|failure ...` lines in input order
    pub lines: Vec<String>,
}

/// Main controller for the application.
pub struct Controller {
    /// Application configuration
    config: MergeConfig,
    /// Optional translation collaborator
    translator: Option<Arc<dyn Translator>>,
    /// Optional OCR collaborator for bitmap-only containers
    ocr: Option<Arc<dyn OcrEngine>>,
    /// Anchor selector (auto, or a caller-supplied callback)
    selector: AnchorSelector,
    /// Cooperative cancellation flag, checked between phases
    cancel: Arc<AtomicBool>,
}

impl Controller {
    /// Create a controller with the given configuration.
    pub fn with_config(config: MergeConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Controller {
            config,
            translator: None,
            ocr: None,
            selector: AnchorSelector::Auto,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Attach a translation collaborator.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Attach an OCR collaborator.
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrEngine>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    /// Replace the anchor selector.
    pub fn with_selector(mut self, selector: AnchorSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Handle the caller can set to cancel at the next phase boundary.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    fn checkpoint(&self) -> Result<(), JobError> {
        if self.cancel.load(Ordering::SeqCst) {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run one merge job end to end.
    pub async fn run_job(&self, job: &JobSpec) -> Result<JobReport, JobError> {
        let started = std::time::Instant::now();
        let mut warnings: Vec<String> = Vec::new();
        let scratch = TempDir::new().map_err(|e| JobError::Other(e.to_string()))?;

        self.checkpoint()?;
        let (primary, secondary) = self.resolve_tracks(job, &scratch, &mut warnings).await?;
        info!(
            "Resolved tracks: primary {} | secondary {}",
            primary, secondary
        );

        // A sparse track against a dense one smells like forced/signs.
        let (small, large) = if primary.events.len() <= secondary.events.len() {
            (primary.events.len(), secondary.events.len())
        } else {
            (secondary.events.len(), primary.events.len())
        };
        if large > 0 && (small as f64) < (large as f64) * 0.5 {
            let message = format!(
                "Event counts differ sharply ({} vs {}); one side may be a forced/signs track",
                small, large
            );
            warn!("{}", message);
            warnings.push(message);
        }

        self.checkpoint()?;
        let (reference_is_primary, reference, shifted) =
            self.designate_reference(primary, secondary);
        debug!(
            "Reference track: {} ({})",
            if reference_is_primary { "primary" } else { "secondary" },
            reference.source_kind
        );

        let (aligned_shifted, outcome, degraded) =
            self.align_with_retries(&reference, &shifted, &mut warnings).await?;

        self.checkpoint()?;
        let merged = self.merge(&reference, &aligned_shifted, reference_is_primary);
        let merged_events = merged.events.len();

        self.checkpoint()?;
        let output_path = self.output_path(job);
        let kind = match self.config.output_format {
            OutputFormat::Srt => FormatKind::Srt,
            OutputFormat::Ass => FormatKind::Ass,
            OutputFormat::Vtt => FormatKind::Vtt,
        };
        let bytes = formats::serialize(&merged, kind);
        FileManager::write_atomic(&output_path, &bytes).map_err(JobError::Output)?;

        let alignment = outcome
            .as_ref()
            .map(|o| (o.anchor.method.to_string(), o.shift_ms, o.anchor.confidence));
        if let Some((method, shift, confidence)) = &alignment {
            info!(
                "Aligned via {} (shift {} ms, confidence {:.2})",
                method, shift, confidence
            );
        }
        info!(
            "Merged {} events into {:?} in {:.1}s",
            merged_events,
            output_path.file_name().unwrap_or_default(),
            started.elapsed().as_secs_f64()
        );

        Ok(JobReport {
            output_path,
            alignment,
            merged_events,
            warnings,
            degraded,
        })
    }

    /// Process every video under a directory, one whole job per worker.
    pub async fn run_batch(&self, input_dir: &Path) -> anyhow::Result<BatchSummary> {
        let videos = FileManager::find_video_files(input_dir)?;
        if videos.is_empty() {
            warn!("No supported video files found in {:?}", input_dir);
            return Ok(BatchSummary::default());
        }
        info!("Found {} video file(s) to process", videos.len());

        let progress = ProgressBar::new(videos.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );

        let parallel = self.config.effective_parallel_jobs();
        let outcomes: Vec<(String, BatchOutcome)> = stream::iter(videos.into_iter())
            .map(|video| {
                let progress = progress.clone();
                async move {
                    let name = video
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    let outcome = self.run_batch_entry(&video).await;
                    progress.inc(1);
                    progress.set_message(name.clone());
                    (name, outcome)
                }
            })
            .buffer_unordered(parallel)
            .collect()
            .await;
        progress.finish_with_message("batch complete");

        let mut summary = BatchSummary::default();
        for (name, outcome) in outcomes {
            let line = match &outcome {
                BatchOutcome::Ok(path) => {
                    summary.succeeded += 1;
                    format!("{}: ok -> {:?}", name, path.file_name().unwrap_or_default())
                }
                BatchOutcome::OkWithWarnings(path, count) => {
                    summary.warned += 1;
                    format!(
                        "{}: warning ({} finding(s)) -> {:?}",
                        name,
                        count,
                        path.file_name().unwrap_or_default()
                    )
                }
                BatchOutcome::Skipped => {
                    summary.skipped += 1;
                    format!("{}: skipped (output exists)", name)
                }
                BatchOutcome::Failed(reason) => {
                    summary.failed += 1;
                    format!("{}: failure ({})", name, reason)
                }
            };
            info!("{}", line);
            summary.lines.push(line);
        }
        info!(
            "Batch finished: {} ok, {} with warnings, {} skipped, {} failed",
            summary.succeeded, summary.warned, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    async fn run_batch_entry(&self, video: &Path) -> BatchOutcome {
        let job = JobSpec::for_video(video);
        let output = self.output_path(&job);
        if output.exists() {
            debug!("Skipping {:?}, output already present", video.file_name());
            return BatchOutcome::Skipped;
        }
        match self.run_job(&job).await {
            Ok(report) if report.warnings.is_empty() && !report.degraded => {
                BatchOutcome::Ok(report.output_path)
            }
            Ok(report) => {
                let findings = report.warnings.len() + usize::from(report.degraded);
                BatchOutcome::OkWithWarnings(report.output_path, findings)
            }
            Err(e) => BatchOutcome::Failed(e.to_string()),
        }
    }

    /// Resolve the primary- and secondary-language tracks for a job.
    async fn resolve_tracks(
        &self,
        job: &JobSpec,
        scratch: &TempDir,
        warnings: &mut Vec<String>,
    ) -> Result<(Track, Track), JobError> {
        let mut embedded: Option<Vec<EmbeddedCandidate>> = None;

        let primary_language = self.config.primary_language.clone();
        let secondary_language = self.config.secondary_language.clone();

        let (primary, primary_stream) = self
            .resolve_one(
                job,
                &primary_language,
                job.primary_subtitle.as_deref(),
                self.config.track_overrides.primary,
                None,
                scratch,
                &mut embedded,
                warnings,
            )
            .await?;
        // The second language must not land on the stream the first
        // one claimed.
        let (secondary, _) = self
            .resolve_one(
                job,
                &secondary_language,
                job.secondary_subtitle.as_deref(),
                self.config.track_overrides.secondary,
                primary_stream,
                scratch,
                &mut embedded,
                warnings,
            )
            .await?;
        Ok((primary, secondary))
    }

    /// Resolve one language: explicit file, then scored embedded
    /// candidates, then an external sibling file, then OCR of a
    /// bitmap stream.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_one(
        &self,
        job: &JobSpec,
        language: &str,
        explicit: Option<&Path>,
        override_index: Option<usize>,
        exclude_stream: Option<usize>,
        scratch: &TempDir,
        embedded: &mut Option<Vec<EmbeddedCandidate>>,
        warnings: &mut Vec<String>,
    ) -> Result<(Track, Option<usize>), JobError> {
        if let Some(path) = explicit {
            let mut track = formats::parse_file(path, SourceKind::External)?;
            self.fill_language(&mut track, language);
            return Ok((track, None));
        }

        let video = match &job.video {
            Some(video) => video.clone(),
            None => {
                return Err(JobError::Input(InputError::FileNotFound(PathBuf::from(
                    format!("<no source for {}>", language),
                ))))
            }
        };

        // Probe the container once per job.
        if embedded.is_none() {
            *embedded = Some(self.load_embedded_candidates(&video, scratch).await?);
        }
        let candidates = embedded.as_ref().expect("probed above");

        let text_candidates: Vec<TrackCandidate> = candidates
            .iter()
            .filter_map(|c| c.candidate.clone())
            .filter(|c| Some(c.stream_index) != exclude_stream)
            .collect();
        match track_selector::select(&text_candidates, language, override_index) {
            Ok(best) => {
                let chosen = candidates
                    .iter()
                    .find(|c| c.stream.index == best.candidate.stream_index)
                    .and_then(|c| c.track.clone());
                if let Some(mut track) = chosen {
                    debug!(
                        "Selected embedded stream {} for {} ({:?})",
                        best.candidate.stream_index, language, best.role_hint
                    );
                    track.role_hint = best.role_hint;
                    self.fill_language(&mut track, language);
                    return Ok((track, Some(best.candidate.stream_index)));
                }
            }
            Err(e) => {
                warn!("{}; looking for alternatives", e);
                warnings.push(e.to_string());
            }
        }

        // External sibling files beat OCR.
        if let Some(path) = FileManager::find_external_subtitle(&video, language) {
            let mut track = formats::parse_file(&path, SourceKind::External)?;
            self.fill_language(&mut track, language);
            return Ok((track, None));
        }

        let track = self
            .resolve_via_ocr(&video, language, scratch, candidates)
            .await?;
        Ok((track, None))
    }

    async fn resolve_via_ocr(
        &self,
        video: &Path,
        language: &str,
        scratch: &TempDir,
        candidates: &[EmbeddedCandidate],
    ) -> Result<Track, JobError> {
        let engine = match &self.ocr {
            Some(engine) => engine,
            None => {
                return Err(JobError::Collaborator(CollaboratorError::Unavailable("ocr")));
            }
        };
        let bitmap = candidates
            .iter()
            .filter(|c| c.stream.is_bitmap())
            .find(|c| {
                c.stream
                    .language
                    .as_deref()
                    .map(|tag| language_detector::tags_match(tag, language))
                    .unwrap_or(false)
            })
            .or_else(|| candidates.iter().find(|c| c.stream.is_bitmap()))
            .ok_or_else(|| {
                JobError::Input(InputError::NoCandidateTracks(video.to_path_buf()))
            })?;

        info!(
            "No text track for {}; running OCR on bitmap stream {}",
            language, bitmap.stream.index
        );
        let pgs_path = scratch
            .path()
            .join(format!("stream_{}.sup", bitmap.stream.index));
        container::extract_track(video, bitmap.stream.index, &pgs_path, ExtractCodec::Pgs)
            .await?;
        let pgs_bytes =
            std::fs::read(&pgs_path).map_err(|e| JobError::Other(e.to_string()))?;
        let ocr_language = OcrLanguage::from_tag(language).ok_or_else(|| {
            JobError::Collaborator(CollaboratorError::Failed {
                name: "ocr",
                message: format!("no OCR language for tag {}", language),
            })
        })?;
        let srt_bytes = engine.convert_pgs(&pgs_bytes, ocr_language).await?;

        let mut track = formats::parse_bytes(
            &srt_bytes,
            FormatKind::Srt,
            SourceKind::Ocr,
            None,
            &pgs_path,
        )?;
        self.fill_language(&mut track, language);
        Ok(track)
    }

    /// Probe the container and parse every text stream into a scoring
    /// candidate. Bitmap streams are carried without a parsed track.
    async fn load_embedded_candidates(
        &self,
        video: &Path,
        scratch: &TempDir,
    ) -> Result<Vec<EmbeddedCandidate>, JobError> {
        if !video.exists() {
            return Err(JobError::Input(InputError::FileNotFound(
                video.to_path_buf(),
            )));
        }
        let streams = container::list_subtitle_tracks(video).await?;
        if streams.is_empty() {
            return Err(JobError::Input(InputError::NoCandidateTracks(
                video.to_path_buf(),
            )));
        }

        let mut candidates = Vec::with_capacity(streams.len());
        for stream in streams {
            if stream.is_bitmap() {
                candidates.push(EmbeddedCandidate {
                    stream,
                    track: None,
                    candidate: None,
                });
                continue;
            }

            let target = match stream.codec_hint() {
                Some(crate::subtitle_model::CodecHint::Ass)
                | Some(crate::subtitle_model::CodecHint::Ssa) => (ExtractCodec::Ass, "ass"),
                _ => (ExtractCodec::Srt, "srt"),
            };
            let out = scratch
                .path()
                .join(format!("stream_{}.{}", stream.index, target.1));
            if let Err(e) = container::extract_track(video, stream.index, &out, target.0).await
            {
                warn!("Stream {} extraction failed: {}", stream.index, e);
                continue;
            }
            let mut track = match formats::parse_file(&out, SourceKind::Embedded) {
                Ok(track) => track,
                Err(e) => {
                    warn!("Stream {} unparseable: {}", stream.index, e);
                    continue;
                }
            };
            track.language = stream.language.clone();
            track.title = stream.title.clone().unwrap_or_default();

            let candidate = TrackCandidate {
                stream_index: stream.index,
                codec: track.codec_hint,
                language_tag: stream.language.clone(),
                title: track.title.clone(),
                forced: stream.forced,
                default: stream.default,
                event_count: track.events.len(),
                sample_text: track.sample_text(50, 4096),
            };
            candidates.push(EmbeddedCandidate {
                stream,
                track: Some(track),
                candidate: Some(candidate),
            });
        }
        Ok(candidates)
    }

    /// Set the track language: the configured tag, refined by the
    /// classifier when it recognizes the content.
    fn fill_language(&self, track: &mut Track, configured: &str) {
        let sample = track.sample_text(50, 4096);
        let classified = language_detector::classify(&sample, Some(track.title.as_str()))
            .into_iter()
            .find(|s| s.lang.matches_tag(configured));
        track.language = Some(match classified {
            Some(score) => score.lang.tag().to_string(),
            None => configured.to_string(),
        });
    }

    /// Decide which track keeps its timings. Embedded beats external;
    /// equal kinds fall back to the earlier first event. Returns
    /// (reference_is_primary, reference, shifted).
    fn designate_reference(&self, primary: Track, secondary: Track) -> (bool, Track, Track) {
        let primary_wins = match self.config.reference_preference {
            ReferencePreference::PreferEmbedded => {
                match (kind_rank(&primary), kind_rank(&secondary)) {
                    (a, b) if a != b => a < b,
                    _ => earlier_first(&primary, &secondary),
                }
            }
            ReferencePreference::PreferExternal => {
                match (kind_rank(&primary), kind_rank(&secondary)) {
                    (a, b) if a != b => a > b,
                    _ => earlier_first(&primary, &secondary),
                }
            }
            ReferencePreference::Auto => match (kind_rank(&primary), kind_rank(&secondary)) {
                (a, b) if a != b => a < b,
                _ => earlier_first(&primary, &secondary),
            },
        };
        if primary_wins {
            (true, primary, secondary)
        } else {
            (false, secondary, primary)
        }
    }

    /// Run the aligner with the retry ladder: the configured strategy,
    /// then translation-assisted once, then a plain scan, and finally
    /// a `ManualRequired` signal.
    async fn align_with_retries(
        &self,
        reference: &Track,
        shifted: &Track,
        warnings: &mut Vec<String>,
    ) -> Result<(Track, Option<AlignmentOutcome>, bool), JobError> {
        // A pair of standalone files on one clock needs no shift, but
        // the skip is only taken once the merged output demonstrably
        // reproduces the reference boundaries; otherwise it aligns
        // like everything else.
        if reference.source_kind == SourceKind::External
            && shifted.source_kind == SourceKind::External
            && tracks_are_synchronized(reference, shifted)
        {
            let preserved =
                aligner::preserved_fraction(reference, shifted, self.config.time_threshold_ms);
            if preserved >= aligner::MIN_PRESERVED_FRACTION {
                debug!(
                    "Tracks share a clock ({:.0}% boundaries reproduced); skipping global alignment",
                    preserved * 100.0
                );
                return Ok((shifted.clone(), None, false));
            }
            debug!(
                "Clock check passed but only {:.0}% boundaries reproduced; aligning",
                preserved * 100.0
            );
        }

        let mixed = reference.source_kind == SourceKind::Embedded
            && shifted.source_kind == SourceKind::External;
        let base = AlignerConfig {
            min_confidence: self.config.alignment_threshold,
            allow_large_offset: self.config.allow_large_offset
                || (self.config.enable_mixed_realignment && mixed),
            enable_pre_anchor_trim: self.config.enable_mixed_realignment && mixed,
            strategy: self.config.sync_strategy,
            weld_threshold_ms: self.config.time_threshold_ms,
        };

        let translator_guard = self
            .translator
            .as_ref()
            .map(|t| JobTranslator::new(t.as_ref()));

        let mut attempts: Vec<(SyncStrategy, bool)> = Vec::new();
        attempts.push((base.strategy, self.config.use_translation));
        if self.translator.is_some() && base.strategy != SyncStrategy::Translation {
            attempts.push((SyncStrategy::Translation, true));
        }
        if base.strategy != SyncStrategy::Scan {
            attempts.push((SyncStrategy::Scan, false));
        }

        let mut last_error: Option<AlignmentError> = None;
        for (attempt_number, (strategy, use_translation)) in attempts.iter().enumerate() {
            self.checkpoint()?;
            if let Some(job_translator) = &translator_guard {
                job_translator.reset_budget();
            }

            let ctx = AnchorContext {
                translator: if *use_translation {
                    translator_guard.as_ref()
                } else {
                    None
                },
                reference_lang: reference.language.clone(),
                shifted_lang: shifted.language.clone(),
            };
            let config = AlignerConfig {
                strategy: *strategy,
                ..base.clone()
            };

            match aligner::align(reference, shifted, &config, &self.selector, &ctx).await {
                Ok(outcome) => {
                    let degraded = attempt_number > 0;
                    if degraded {
                        let message = format!(
                            "Alignment needed the {} fallback (shift {} ms, confidence {:.2})",
                            strategy, outcome.shift_ms, outcome.anchor.confidence
                        );
                        warn!("{}", message);
                        warnings.push(message);
                    }
                    let aligned = outcome.shifted.clone();
                    return Ok((aligned, Some(outcome), degraded));
                }
                Err(
                    e @ (AlignmentError::LargeOffsetRequiresConfirmation { .. }
                    | AlignmentError::Cancelled
                    | AlignmentError::SelectionDeclined),
                ) => {
                    // Not recoverable by switching strategies.
                    return Err(JobError::Alignment(e));
                }
                Err(e) => {
                    debug!("Alignment attempt {} failed: {}", attempt_number + 1, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(AlignmentError::NoAnchorCandidates) => {
                Err(JobError::Alignment(AlignmentError::NoAnchorCandidates))
            }
            _ => Err(JobError::Alignment(AlignmentError::ManualRequired)),
        }
    }

    fn merge(&self, reference: &Track, shifted: &Track, reference_is_primary: bool) -> Track {
        match self.config.output_format {
            OutputFormat::Srt | OutputFormat::Vtt => {
                let (primary, secondary) = if reference_is_primary {
                    (reference, shifted)
                } else {
                    (shifted, reference)
                };
                merger::merge_interleaved(primary, secondary, self.config.time_threshold_ms)
            }
            OutputFormat::Ass => {
                merger::merge_dual_style(reference, shifted, reference_is_primary)
            }
        }
    }

    fn output_path(&self, job: &JobSpec) -> PathBuf {
        if let Some(path) = &job.output {
            return path.clone();
        }
        let base = job
            .video
            .as_deref()
            .or(job.primary_subtitle.as_deref())
            .or(job.secondary_subtitle.as_deref())
            .unwrap_or_else(|| Path::new("merged"));
        FileManager::default_output_path(
            base,
            &self.config.primary_language,
            &self.config.secondary_language,
            self.config.output_format.extension(),
        )
    }
}

/// One probed container stream with its parsed track (text streams
/// only) and scoring candidate.
struct EmbeddedCandidate {
    stream: SubtitleStream,
    track: Option<Track>,
    candidate: Option<TrackCandidate>,
}

fn kind_rank(track: &Track) -> u8 {
    match track.source_kind {
        SourceKind::Embedded => 0,
        SourceKind::Ocr => 1,
        SourceKind::External => 2,
    }
}

fn earlier_first(primary: &Track, secondary: &Track) -> bool {
    primary.first_start_ms().unwrap_or(u64::MAX) <= secondary.first_start_ms().unwrap_or(u64::MAX)
}

/// Index-paired comparison of the first ten events: tracks count as
/// sharing a clock only when every sampled delta sits inside the
/// merge boundary tolerance.
fn tracks_are_synchronized(a: &Track, b: &Track) -> bool {
    if a.events.is_empty() || b.events.is_empty() {
        return false;
    }
    let sample = 10.min(a.events.len()).min(b.events.len());
    let mut total = 0u64;
    let mut worst = 0u64;
    for i in 0..sample {
        let delta = a.events[i].start_ms.abs_diff(b.events[i].start_ms);
        total += delta;
        worst = worst.max(delta);
    }
    let average = total / sample as u64;
    let synchronized = average <= SYNC_AVG_THRESHOLD_MS && worst <= SYNC_MAX_THRESHOLD_MS;
    debug!(
        "Synchronization check: avg {} ms, max {} ms -> {}",
        average, worst, synchronized
    );
    synchronized
}
