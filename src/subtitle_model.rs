use std::collections::BTreeMap;
use std::fmt;
use anyhow::{anyhow, Result};

// @module: In-memory subtitle event and track model

/// Upper bound for any timestamp: 24 hours in milliseconds.
pub const MAX_TIMESTAMP_MS: u64 = 24 * 3_600_000;

/// Where a track came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Demuxed from a video container
    Embedded,
    /// Standalone subtitle file next to the video
    External,
    /// Produced by OCR of an image-based stream
    Ocr,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded"),
            Self::External => write!(f, "external"),
            Self::Ocr => write!(f, "ocr"),
        }
    }
}

/// Role assigned to a track by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleHint {
    /// Main dialogue track
    Main,
    /// Sparse track carrying only forced/signs/songs lines
    ForcedOrSigns,
    /// Commentary track
    Commentary,
    /// Not yet classified
    #[default]
    Unknown,
}

/// Codec family of the track's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecHint {
    Srt,
    Ass,
    Ssa,
    Vtt,
    /// Image-based stream requiring OCR
    Pgs,
}

impl CodecHint {
    /// Map an ffprobe codec name or file extension to a codec hint.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "srt" | "subrip" => Some(Self::Srt),
            "ass" => Some(Self::Ass),
            "ssa" => Some(Self::Ssa),
            "vtt" | "webvtt" => Some(Self::Vtt),
            "pgs" | "hdmv_pgs_subtitle" => Some(Self::Pgs),
            _ => None,
        }
    }

    /// True for image-based codecs that need OCR before use.
    pub fn is_bitmap(&self) -> bool {
        matches!(self, Self::Pgs)
    }
}

/// ASS Dialogue fields carried through unchanged when an event is
/// copied verbatim to the output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssEventFields {
    pub layer: i32,
    pub name: String,
    pub margin_l: String,
    pub margin_r: String,
    pub margin_v: String,
    pub effect: String,
}

/// Format-specific passthrough attached to an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawAttributes {
    /// ASS layer/margins/effect fields
    pub ass: Option<AssEventFields>,
    /// The text payload exactly as it appeared in the source, override
    /// tags included; emitted verbatim when the event is copied to the
    /// same format
    pub source_text: Option<String>,
    /// WebVTT cue settings (the text after the timing line)
    pub vtt_settings: Option<String>,
    /// Index the event carried in the source file, when it differs from
    /// the normalized one
    pub original_index: Option<usize>,
}

// @struct: Single timed subtitle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// 1-based ordinal, contiguous within a track after normalization
    pub index: usize,
    /// Start time in milliseconds
    pub start_ms: u64,
    /// End time in milliseconds, >= start_ms
    pub end_ms: u64,
    /// Logical text; line breaks are `\n`, markup stripped by the adapter
    pub text: String,
    /// Optional style name within the owning track
    pub style_ref: Option<String>,
    /// Format-specific passthrough
    pub raw: RawAttributes,
}

impl Event {
    /// Create a plain event with no style reference.
    pub fn new(index: usize, start_ms: u64, end_ms: u64, text: impl Into<String>) -> Self {
        Event {
            index,
            start_ms,
            end_ms,
            text: text.into(),
            style_ref: None,
            raw: RawAttributes::default(),
        }
    }

    // @creates: Validated event
    // @validates: Time range and timestamp bounds
    pub fn new_validated(
        index: usize,
        start_ms: u64,
        end_ms: u64,
        text: impl Into<String>,
    ) -> Result<Self> {
        if end_ms < start_ms {
            return Err(anyhow!(
                "Invalid time range: end {} < start {}",
                end_ms,
                start_ms
            ));
        }
        if end_ms > MAX_TIMESTAMP_MS {
            return Err(anyhow!("Timestamp {} exceeds 24 hours", end_ms));
        }
        Ok(Event::new(index, start_ms, end_ms, text))
    }

    /// Duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// True when the event is active at instant `t_ms` (half-open interval).
    pub fn is_active_at(&self, t_ms: u64) -> bool {
        self.start_ms <= t_ms && t_ms < self.end_ms
    }
}

/// Ordered sequence of events plus track-level metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Events sorted by start time
    pub events: Vec<Event>,
    /// Where the track came from
    pub source_kind: SourceKind,
    /// BCP-47-like language tag; `None` when unknown
    pub language: Option<String>,
    /// Track title (stream title or file name); may be empty
    pub title: String,
    /// Codec family of the source
    pub codec_hint: CodecHint,
    /// Role assigned by the selector
    pub role_hint: RoleHint,
    /// ASS style name -> raw style definition (field list after the name)
    pub styles: BTreeMap<String, String>,
    /// ASS `[Script Info]` key/value pairs, in file order
    pub script_info: Vec<(String, String)>,
    /// ASS `Comment:` lines keyed by the event index they precede
    /// (`events.len()` means trailing comments)
    pub ass_comments: Vec<(usize, String)>,
    /// WebVTT NOTE/STYLE/REGION blocks kept for round-trip
    pub vtt_blocks: Vec<String>,
}

impl Track {
    /// Create an empty track.
    pub fn new(source_kind: SourceKind, codec_hint: CodecHint) -> Self {
        Track {
            events: Vec::new(),
            source_kind,
            language: None,
            title: String::new(),
            codec_hint,
            role_hint: RoleHint::default(),
            styles: BTreeMap::new(),
            script_info: Vec::new(),
            ass_comments: Vec::new(),
            vtt_blocks: Vec::new(),
        }
    }

    /// Builder-style language setter.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Builder-style title setter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Start of the earliest event, or `None` for an empty track.
    pub fn first_start_ms(&self) -> Option<u64> {
        self.events.first().map(|e| e.start_ms)
    }

    /// Concatenated text of up to the first `limit` events, truncated to
    /// `max_bytes`, for language sampling.
    pub fn sample_text(&self, limit: usize, max_bytes: usize) -> String {
        let mut sample = String::new();
        for event in self.events.iter().take(limit) {
            if !sample.is_empty() {
                sample.push('\n');
            }
            sample.push_str(&event.text);
            if sample.len() >= max_bytes {
                break;
            }
        }
        // Truncate on a char boundary.
        if sample.len() > max_bytes {
            let mut cut = max_bytes;
            while !sample.is_char_boundary(cut) {
                cut -= 1;
            }
            sample.truncate(cut);
        }
        sample
    }

    /// Restore the track invariants after load or transformation:
    /// events sorted by start time (ties keep input order), timestamps
    /// clamped to [0, 24h], control characters other than `\n` stripped,
    /// indices renumbered 1..N with the original index preserved in the
    /// raw attributes when it changed.
    pub fn normalize(&mut self) {
        for event in &mut self.events {
            event.text = strip_control_chars(&event.text);
            if event.end_ms > MAX_TIMESTAMP_MS {
                event.end_ms = MAX_TIMESTAMP_MS;
            }
            if event.start_ms > event.end_ms {
                event.start_ms = event.end_ms;
            }
        }
        // Stable sort keeps original input order on equal start times.
        self.events.sort_by_key(|e| e.start_ms);
        for (i, event) in self.events.iter_mut().enumerate() {
            let normalized = i + 1;
            if event.index != normalized {
                event.raw.original_index.get_or_insert(event.index);
                event.index = normalized;
            }
        }
    }

    /// Check the invariants without repairing them.
    pub fn invariants_hold(&self) -> bool {
        let sorted = self
            .events
            .windows(2)
            .all(|w| w[0].start_ms <= w[1].start_ms);
        let bounded = self
            .events
            .iter()
            .all(|e| e.start_ms <= e.end_ms && e.end_ms <= MAX_TIMESTAMP_MS);
        let contiguous = self
            .events
            .iter()
            .enumerate()
            .all(|(i, e)| e.index == i + 1);
        sorted && bounded && contiguous
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} track \"{}\": {} events",
            self.source_kind,
            self.language.as_deref().unwrap_or("und"),
            self.title,
            self.events.len()
        )
    }
}

/// Drop control characters except `\n`; normalize `\r\n` and bare `\r`
/// to `\n` first so CRLF input does not lose its line breaks.
pub fn strip_control_chars(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    unified
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .collect()
}

/// Format a millisecond timestamp as `HH:MM:SS,mmm` (SRT style).
pub fn format_srt_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

/// Format a millisecond timestamp as `HH:MM:SS.mmm` (VTT style).
pub fn format_vtt_timestamp(ms: u64) -> String {
    format_srt_timestamp(ms).replace(',', ".")
}

/// Format a millisecond timestamp as `H:MM:SS.cc` (ASS centiseconds).
pub fn format_ass_timestamp(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{}:{:02}:{:02}.{:02}", hours, minutes, seconds, centis)
}
