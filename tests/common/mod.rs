/*!
 * Common test utilities for the bisubs test suite
 */

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use bisubs::subtitle_model::{CodecHint, Event, SourceKind, Track};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a test file with raw bytes (for encoding tests)
pub fn create_test_file_bytes(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Build a track from (start_ms, end_ms, text) triples
pub fn make_track(kind: SourceKind, events: &[(u64, u64, &str)]) -> Track {
    let mut track = Track::new(kind, CodecHint::Srt);
    for (i, (start, end, text)) in events.iter().enumerate() {
        track.events.push(Event::new(i + 1, *start, *end, *text));
    }
    track
}

/// Render (start_ms, end_ms, text) triples as SRT content
pub fn srt_content(events: &[(u64, u64, &str)]) -> String {
    let mut out = String::new();
    for (i, (start, end, text)) in events.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            srt_timestamp(*start),
            srt_timestamp(*end),
            text
        ));
    }
    out
}

fn srt_timestamp(ms: u64) -> String {
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1_000,
        ms % 1_000
    )
}

/// A small English dialogue sample as SRT
pub fn english_srt() -> String {
    srt_content(&[
        (1_000, 3_000, "Hello"),
        (4_000, 6_000, "How are you today?"),
        (7_000, 9_000, "I am fine, thank you."),
    ])
}

/// The same dialogue in Chinese, on the same clock
pub fn chinese_srt() -> String {
    srt_content(&[
        (1_000, 3_000, "你好"),
        (4_000, 6_000, "你今天好吗？"),
        (7_000, 9_000, "我很好，谢谢。"),
    ])
}
