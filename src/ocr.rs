/*!
 * OCR collaborator seam for image-based subtitle streams.
 *
 * PGS streams carry bitmaps, not text; turning them into SRT requires
 * an OCR engine. The engine itself is external. This module defines
 * the trait the orchestrator consumes, a subprocess binding for a
 * pgsrip-style command-line tool, and a mock for tests.
 */

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::errors::CollaboratorError;

/// Default OCR deadline.
const DEFAULT_OCR_TIMEOUT_SECS: u64 = 600;

/// Languages the OCR collaborator accepts (tesseract-style codes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrLanguage {
    Eng,
    ChiSim,
    ChiTra,
    Jpn,
    Kor,
}

impl OcrLanguage {
    /// Tesseract language code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Eng => "eng",
            Self::ChiSim => "chi_sim",
            Self::ChiTra => "chi_tra",
            Self::Jpn => "jpn",
            Self::Kor => "kor",
        }
    }

    /// Map a BCP-47-like tag onto an OCR language.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lower = tag.to_lowercase();
        match lower.as_str() {
            "zh-hant" | "cht" => Some(Self::ChiTra),
            _ if lower.starts_with("zh") || lower == "chi" || lower == "chs" => {
                Some(Self::ChiSim)
            }
            "en" | "eng" => Some(Self::Eng),
            "ja" | "jpn" => Some(Self::Jpn),
            "ko" | "kor" => Some(Self::Kor),
            _ => None,
        }
    }
}

/// An OCR engine converting a PGS stream into SRT bytes.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Convert raw PGS bytes into SRT bytes for the given language.
    /// Accuracy is the engine's problem; the output must parse as SRT.
    async fn convert_pgs(
        &self,
        pgs_bytes: &[u8],
        language: OcrLanguage,
    ) -> Result<Vec<u8>, CollaboratorError>;
}

/// Subprocess binding to a command-line OCR tool that reads PGS from
/// stdin and writes SRT to stdout (the pgsrip calling convention).
pub struct CommandOcr {
    program: String,
    timeout: Duration,
}

impl CommandOcr {
    /// Bind to the given program with the default deadline.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(DEFAULT_OCR_TIMEOUT_SECS),
        }
    }

    /// Override the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl OcrEngine for CommandOcr {
    async fn convert_pgs(
        &self,
        pgs_bytes: &[u8],
        language: OcrLanguage,
    ) -> Result<Vec<u8>, CollaboratorError> {
        info!(
            "Running OCR ({}) on {} KiB of PGS data",
            language.code(),
            pgs_bytes.len() / 1024
        );

        let mut child = Command::new(&self.program)
            .args(["--language", language.code(), "--output-format", "srt"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CollaboratorError::Failed {
                name: "ocr",
                message: format!("failed to launch {}: {}", self.program, e),
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin
                .write_all(pgs_bytes)
                .await
                .map_err(|e| CollaboratorError::Failed {
                    name: "ocr",
                    message: e.to_string(),
                })?;
        }
        drop(child.stdin.take());

        let output = tokio::select! {
            result = child.wait_with_output() => result.map_err(|e| CollaboratorError::Failed {
                name: "ocr",
                message: e.to_string(),
            })?,
            _ = tokio::time::sleep(self.timeout) => {
                return Err(CollaboratorError::Timeout { name: "ocr", seconds: self.timeout.as_secs() });
            }
        };

        if !output.status.success() {
            return Err(CollaboratorError::Failed {
                name: "ocr",
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        debug!("OCR produced {} bytes of SRT", output.stdout.len());
        Ok(output.stdout)
    }
}

/// Mock OCR engine returning canned SRT, for tests.
pub struct MockOcr {
    srt: Vec<u8>,
}

impl MockOcr {
    /// An engine that always answers with the given SRT bytes.
    pub fn returning(srt: impl Into<Vec<u8>>) -> Self {
        Self { srt: srt.into() }
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn convert_pgs(
        &self,
        _pgs_bytes: &[u8],
        _language: OcrLanguage,
    ) -> Result<Vec<u8>, CollaboratorError> {
        Ok(self.srt.clone())
    }
}
