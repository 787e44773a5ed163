/*!
 * Byte-level encoding detection and decoding for subtitle files.
 *
 * Inputs arrive as UTF-8, UTF-16, or one of the legacy CJK encodings
 * (GB18030/GBK, Big5, Shift-JIS). Detection runs a BOM sniff first,
 * then a statistical detector, then a CJK-biased candidate ladder; a
 * decode that produces replacement characters above a small ratio is
 * rejected and the next candidate tried.
 */

use std::path::Path;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, BIG5, GB18030, SHIFT_JIS, UTF_16BE, UTF_16LE, UTF_8};
use log::debug;

use crate::errors::InputError;

/// Candidates tried in order when the detector's guess is rejected.
const FALLBACK_ENCODINGS: [&Encoding; 6] =
    [UTF_8, GB18030, BIG5, SHIFT_JIS, UTF_16LE, UTF_16BE];

/// Maximum tolerated ratio of U+FFFD replacement characters in a decode.
const MAX_REPLACEMENT_RATIO: f64 = 0.002;

/// A successful decode: the text plus the encoding that produced it.
#[derive(Debug, Clone)]
pub struct DecodedText {
    /// Decoded contents
    pub text: String,
    /// WHATWG name of the winning encoding
    pub encoding: &'static str,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
}

/// Detect the likely encoding of `bytes` without decoding.
///
/// Returns the WHATWG encoding name and a confidence in [0, 1]. A BOM
/// is authoritative; otherwise the statistical detector's guess is
/// scored by how cleanly it decodes.
pub fn detect_encoding(bytes: &[u8]) -> (&'static str, f64) {
    if let Some(encoding) = sniff_bom(bytes) {
        return (encoding.name(), 1.0);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);
    let (decoded, _, had_errors) = guess.decode(bytes);
    let confidence = if had_errors {
        1.0 - replacement_ratio(&decoded)
    } else {
        0.9
    };
    (guess.name(), confidence.clamp(0.0, 1.0))
}

/// Decode `bytes` to UTF-8 text, trying the BOM, the detector's guess,
/// and the fallback ladder in turn.
pub fn decode(bytes: &[u8], path: &Path) -> Result<DecodedText, InputError> {
    if let Some(encoding) = sniff_bom(bytes) {
        let (text, _, _) = encoding.decode(bytes);
        return Ok(DecodedText {
            text: text.into_owned(),
            encoding: encoding.name(),
            confidence: 1.0,
        });
    }

    let mut attempts = 0usize;
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guess = detector.guess(None, true);

    // Strict UTF-8 goes first: a clean UTF-8 decode beats any
    // statistical guess, which can favor a single-byte encoding that
    // never reports errors.
    let mut candidates: Vec<&'static Encoding> = vec![UTF_8, guess];
    for fallback in FALLBACK_ENCODINGS {
        if !candidates.iter().any(|c| *c == fallback) {
            candidates.push(fallback);
        }
    }
    candidates.dedup();

    for encoding in candidates {
        attempts += 1;
        let (text, _, had_errors) = encoding.decode(bytes);
        let ratio = replacement_ratio(&text);
        if !had_errors || ratio <= MAX_REPLACEMENT_RATIO {
            debug!("Decoded {:?} as {}", path.file_name(), encoding.name());
            return Ok(DecodedText {
                text: text.into_owned(),
                encoding: encoding.name(),
                confidence: if had_errors { 1.0 - ratio } else { 0.95 },
            });
        }
    }

    Err(InputError::DecodeFailed {
        path: path.to_path_buf(),
        attempts,
    })
}

fn sniff_bom(bytes: &[u8]) -> Option<&'static Encoding> {
    if bytes.starts_with(b"\xef\xbb\xbf") {
        Some(UTF_8)
    } else if bytes.starts_with(b"\xff\xfe") {
        Some(UTF_16LE)
    } else if bytes.starts_with(b"\xfe\xff") {
        Some(UTF_16BE)
    } else {
        None
    }
}

fn replacement_ratio(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let replacements = text.chars().filter(|c| *c == '\u{fffd}').count();
    replacements as f64 / text.chars().count() as f64
}
