use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::errors::OutputError;
use crate::language_detector;

// @module: File and directory utilities

/// Video container extensions handled in batch mode.
pub const VIDEO_EXTENSIONS: [&str; 10] = [
    "mkv", "mp4", "m4v", "mov", "avi", "flv", "ts", "webm", "mpg", "mpeg",
];

/// Subtitle file extensions recognized for external tracks.
pub const SUBTITLE_EXTENSIONS: [&str; 4] = ["srt", "ass", "ssa", "vtt"];

/// Filename tokens that tag a file with a language, checked lowercase.
const CHINESE_TOKENS: [&str; 12] = [
    ".zh", "_zh", ".chi", "_chi", ".chs", "_chs", ".cht", "_cht", ".cn", "_cn",
    ".chinese", "_chinese",
];
const ENGLISH_TOKENS: [&str; 6] = [".en", "_en", ".eng", "_eng", ".english", "_english"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    /// Write output bytes atomically: a temp file in the destination
    /// directory is filled and fsynced first, then renamed over the
    /// final path. A failure at any point leaves the filesystem
    /// untouched.
    pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| OutputError::TempWrite(e.to_string()))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| OutputError::TempWrite(e.to_string()))?;
        temp.write_all(bytes)
            .and_then(|_| temp.flush())
            .map_err(|e| OutputError::TempWrite(e.to_string()))?;

        temp.persist(path).map_err(|e| OutputError::Rename {
            path: path.to_path_buf(),
            message: e.error.to_string(),
        })?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    /// Default output path for a merged track:
    /// `<video_basename>.<primary>-<secondary>.<ext>` next to the input.
    pub fn default_output_path(
        input: &Path,
        primary_language: &str,
        secondary_language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let name = format!(
            "{}.{}-{}.{}",
            stem,
            base_tag(primary_language),
            base_tag(secondary_language),
            extension
        );
        input.with_file_name(name)
    }

    /// Find video files under a directory, sorted by name.
    pub fn find_video_files(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(anyhow!("Not a directory: {:?}", dir));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() {
                if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                    if VIDEO_EXTENSIONS
                        .iter()
                        .any(|v| v.eq_ignore_ascii_case(ext))
                    {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }
        files.sort();
        Ok(files)
    }

    /// Search the video's directory for an external subtitle in the
    /// target language.
    ///
    /// Files named `<basename>*.<sub ext>` are checked for language
    /// tokens first; an untagged `<basename>.<ext>` falls back to
    /// content sniffing. Shorter (more specific) names win ties.
    pub fn find_external_subtitle(video_path: &Path, target_language: &str) -> Option<PathBuf> {
        let dir = video_path.parent()?;
        let base = video_path.file_stem()?.to_string_lossy().to_string();
        let want_chinese = language_detector::tags_match(target_language, "zh");
        let tokens: &[&str] = if want_chinese {
            &CHINESE_TOKENS
        } else {
            &ENGLISH_TOKENS
        };

        let mut candidates: Vec<PathBuf> = Vec::new();
        let entries = fs::read_dir(dir).ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if !name.starts_with(&base) || !path.is_file() {
                continue;
            }
            let lower = name.to_lowercase();
            if !SUBTITLE_EXTENSIONS
                .iter()
                .any(|ext| lower.ends_with(&format!(".{}", ext)))
            {
                continue;
            }
            if tokens.iter().any(|t| lower.contains(t)) {
                candidates.push(path);
            }
        }

        if candidates.is_empty() {
            // An untagged sibling subtitle may still match by content.
            for ext in SUBTITLE_EXTENSIONS {
                let untagged = dir.join(format!("{}.{}", base, ext));
                if untagged.is_file() && content_matches_language(&untagged, target_language) {
                    candidates.push(untagged);
                    break;
                }
            }
        }

        candidates.sort_by_key(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().len())
                .unwrap_or(usize::MAX)
        });
        let found = candidates.into_iter().next();
        if let Some(path) = &found {
            info!(
                "Found external {} subtitle: {:?}",
                target_language,
                path.file_name()
            );
        }
        found
    }
}

fn base_tag(tag: &str) -> String {
    tag.split('-').next().unwrap_or(tag).to_lowercase()
}

/// Sniff up to 4 KiB of a subtitle file and check whether its content
/// classifies as the target language.
fn content_matches_language(path: &Path, target_language: &str) -> bool {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(_) => return false,
    };
    let decoded = match crate::encoding_detector::decode(&bytes, path) {
        Ok(d) => d,
        Err(_) => return false,
    };
    let sample: String = decoded.text.chars().take(4096).collect();
    language_detector::classify(&sample, None)
        .first()
        .map(|top| top.lang.matches_tag(target_language))
        .unwrap_or(false)
}
