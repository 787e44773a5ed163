use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::language_detector;

/// Application configuration module
/// Every option the engine recognizes is an explicit field here;
/// nothing is keyed by strings at runtime. Loading, validation and
/// default-file creation live alongside the record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergeConfig {
    /// Language that appears first in merged output (typically Chinese)
    #[serde(default = "default_primary_language")]
    pub primary_language: String,

    /// The other language of the bilingual pair
    #[serde(default = "default_secondary_language")]
    pub secondary_language: String,

    /// Output container format
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Aligner confidence floor in [0, 1]
    #[serde(default = "default_alignment_threshold")]
    pub alignment_threshold: f64,

    /// Anti-flicker fuse distance in milliseconds
    #[serde(default = "default_time_threshold_ms")]
    pub time_threshold_ms: u64,

    /// Anchor strategy; `auto` tries them in order
    #[serde(default)]
    pub sync_strategy: SyncStrategy,

    /// Permit global shifts beyond 5 s without confirmation
    #[serde(default)]
    pub allow_large_offset: bool,

    /// Enable pre-anchor trimming and the large-offset path when the
    /// reference is embedded and the shifted track is external
    #[serde(default)]
    pub enable_mixed_realignment: bool,

    /// Use the translator for anchor matching when available
    #[serde(default)]
    pub use_translation: bool,

    /// Explicit per-language stream index selection
    #[serde(default)]
    pub track_overrides: TrackOverrides,

    /// Which source kind supplies the reference track
    #[serde(default)]
    pub reference_preference: ReferencePreference,

    /// Worker pool size for batch mode; `None` means
    /// min(4, hardware_parallelism)
    #[serde(default)]
    pub max_parallel_jobs: Option<usize>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            primary_language: default_primary_language(),
            secondary_language: default_secondary_language(),
            output_format: OutputFormat::default(),
            alignment_threshold: default_alignment_threshold(),
            time_threshold_ms: default_time_threshold_ms(),
            sync_strategy: SyncStrategy::default(),
            allow_large_offset: false,
            enable_mixed_realignment: false,
            use_translation: false,
            track_overrides: TrackOverrides::default(),
            reference_preference: ReferencePreference::default(),
            max_parallel_jobs: None,
            log_level: LogLevel::default(),
        }
    }
}

fn default_primary_language() -> String {
    "zh".to_string()
}

fn default_secondary_language() -> String {
    "en".to_string()
}

fn default_alignment_threshold() -> f64 {
    0.8
}

fn default_time_threshold_ms() -> u64 {
    100
}

impl MergeConfig {
    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config {:?}: {}", path.as_ref(), e))?;
        let config: MergeConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default configuration to a file and return it.
    pub fn create_default_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = MergeConfig::default();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(config)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alignment_threshold) {
            return Err(anyhow!(
                "alignment_threshold must be within [0, 1], got {}",
                self.alignment_threshold
            ));
        }
        if self.primary_language.trim().is_empty() || self.secondary_language.trim().is_empty() {
            return Err(anyhow!("Both language tags must be set"));
        }
        // Exactly two distinct languages; more is out of scope.
        if language_detector::tags_match(&self.primary_language, &self.secondary_language) {
            return Err(anyhow!(
                "primary_language and secondary_language must differ ({} vs {})",
                self.primary_language,
                self.secondary_language
            ));
        }
        if let Some(jobs) = self.max_parallel_jobs {
            if jobs == 0 {
                return Err(anyhow!("max_parallel_jobs must be at least 1"));
            }
        }
        Ok(())
    }

    /// Worker pool size for batch mode: the configured override, or
    /// min(4, hardware_parallelism).
    pub fn effective_parallel_jobs(&self) -> usize {
        self.max_parallel_jobs.unwrap_or_else(|| {
            let hardware = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            hardware.min(4)
        })
    }
}

/// Overrides pinning the stream index per language.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TrackOverrides {
    /// Stream index to use for the primary language
    #[serde(default)]
    pub primary: Option<usize>,

    /// Stream index to use for the secondary language
    #[serde(default)]
    pub secondary: Option<usize>,
}

/// Output format of the merged track.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Srt,
    Ass,
    Vtt,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Ass => "ass",
            Self::Vtt => "vtt",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "ass" | "ssa" => Ok(Self::Ass),
            "vtt" => Ok(Self::Vtt),
            _ => Err(anyhow!("Invalid output format: {}", s)),
        }
    }
}

/// Anchor strategy selection.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Try first_line, scan, translation, then semantic in order
    #[default]
    Auto,
    FirstLine,
    Scan,
    Translation,
    Manual,
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::FirstLine => "first_line",
            Self::Scan => "scan",
            Self::Translation => "translation",
            Self::Manual => "manual",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for SyncStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "first_line" => Ok(Self::FirstLine),
            "scan" => Ok(Self::Scan),
            "translation" => Ok(Self::Translation),
            "manual" => Ok(Self::Manual),
            _ => Err(anyhow!("Invalid sync strategy: {}", s)),
        }
    }
}

/// Which source kind should keep its timings.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePreference {
    /// Embedded beats external; earlier start breaks same-kind ties
    #[default]
    Auto,
    PreferEmbedded,
    PreferExternal,
}

/// Log verbosity, mirrored onto the log crate's level filter.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}
