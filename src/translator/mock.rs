/*!
 * Mock translator implementations for testing.
 *
 * - `MockTranslator::working()` - echoes a deterministic translation
 * - `MockTranslator::dictionary(...)` - translates via a fixed phrase map
 * - `MockTranslator::failing()` - always errors
 * - `MockTranslator::slow(...)` - sleeps past the caller's deadline
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::CollaboratorError;
use crate::translator::Translator;

/// Behavior mode for the mock translator.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Succeeds, wrapping each input deterministically
    Working,
    /// Succeeds using a phrase dictionary, passing unknown text through
    Dictionary(HashMap<String, String>),
    /// Always fails
    Failing,
    /// Sleeps for the given time before answering
    Slow(Duration),
}

/// Mock translator for exercising alignment and budget behavior.
pub struct MockTranslator {
    behavior: MockBehavior,
    request_count: AtomicUsize,
}

impl MockTranslator {
    /// Create a mock with the given behavior.
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: AtomicUsize::new(0),
        }
    }

    /// A mock that always succeeds with `[lang] text` outputs.
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// A mock backed by a phrase dictionary.
    pub fn dictionary(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(MockBehavior::Dictionary(map))
    }

    /// A mock that always fails.
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// A mock that answers after `delay`.
    pub fn slow(delay: Duration) -> Self {
        Self::new(MockBehavior::Slow(delay))
    }

    /// Number of service calls received (cache hits never reach here).
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        texts: &[String],
        _source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, CollaboratorError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);

        match &self.behavior {
            MockBehavior::Working => Ok(texts
                .iter()
                .map(|t| format!("[{}] {}", target_lang, t))
                .collect()),
            MockBehavior::Dictionary(map) => Ok(texts
                .iter()
                .map(|t| map.get(t).cloned().unwrap_or_else(|| t.clone()))
                .collect()),
            MockBehavior::Failing => Err(CollaboratorError::Failed {
                name: "translator",
                message: "mock failure".to_string(),
            }),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(texts.to_vec())
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
