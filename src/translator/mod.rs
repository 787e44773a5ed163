/*!
 * Translation collaborator seam.
 *
 * The engine never talks to a translation service directly; it goes
 * through the `Translator` trait. A `JobTranslator` wraps a concrete
 * implementation with the per-job cache, the per-alignment call
 * budget, and the request deadline. Mock implementations for tests
 * live in `mock`.
 */

pub mod mock;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::sync::Mutex;

use crate::errors::CollaboratorError;

/// Default deadline for one translation request.
pub const DEFAULT_TRANSLATION_TIMEOUT_SECS: u64 = 30;

/// Maximum translator calls one alignment may spend.
pub const ALIGNMENT_CALL_BUDGET: usize = 10;

/// A batch-capable translation service.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `texts` from `source_lang` to `target_lang`, returning
    /// one output per input, in order.
    async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, CollaboratorError>;

    /// Human-readable service name for logs.
    fn name(&self) -> &str {
        "translator"
    }
}

/// Per-job wrapper around a translator: caches results for the life of
/// one job, enforces the per-alignment call budget, and applies the
/// request deadline. Cached hits cost no budget.
pub struct JobTranslator<'a> {
    inner: &'a dyn Translator,
    cache: Mutex<HashMap<(String, String, String), String>>,
    calls_used: AtomicUsize,
    budget: usize,
    timeout: Duration,
}

impl<'a> JobTranslator<'a> {
    /// Wrap a translator with the default budget and deadline.
    pub fn new(inner: &'a dyn Translator) -> Self {
        Self::with_limits(
            inner,
            ALIGNMENT_CALL_BUDGET,
            Duration::from_secs(DEFAULT_TRANSLATION_TIMEOUT_SECS),
        )
    }

    /// Wrap a translator with explicit limits.
    pub fn with_limits(inner: &'a dyn Translator, budget: usize, timeout: Duration) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            calls_used: AtomicUsize::new(0),
            budget,
            timeout,
        }
    }

    /// Calls spent so far.
    pub fn calls_used(&self) -> usize {
        self.calls_used.load(Ordering::SeqCst)
    }

    /// Reset the per-alignment budget counter. The cache survives; it
    /// is scoped to the job, not the alignment attempt.
    pub fn reset_budget(&self) {
        self.calls_used.store(0, Ordering::SeqCst);
    }

    /// Translate a batch, serving cached entries without spending
    /// budget and batching the misses into a single service call.
    pub async fn translate(
        &self,
        texts: &[String],
        source_lang: &str,
        target_lang: &str,
    ) -> Result<Vec<String>, CollaboratorError> {
        let mut results: Vec<Option<String>> = vec![None; texts.len()];
        let mut misses: Vec<(usize, String)> = Vec::new();

        {
            let cache = self.cache.lock().await;
            for (i, text) in texts.iter().enumerate() {
                let key = cache_key(text, source_lang, target_lang);
                match cache.get(&key) {
                    Some(hit) => results[i] = Some(hit.clone()),
                    None => misses.push((i, text.clone())),
                }
            }
        }

        if !misses.is_empty() {
            let used = self.calls_used.fetch_add(1, Ordering::SeqCst);
            if used >= self.budget {
                self.calls_used.fetch_sub(1, Ordering::SeqCst);
                return Err(CollaboratorError::BudgetExhausted {
                    budget: self.budget,
                });
            }

            let batch: Vec<String> = misses.iter().map(|(_, t)| t.clone()).collect();
            let translated = tokio::time::timeout(
                self.timeout,
                self.inner.translate(&batch, source_lang, target_lang),
            )
            .await
            .map_err(|_| CollaboratorError::Timeout {
                name: "translator",
                seconds: self.timeout.as_secs(),
            })??;

            if translated.len() != batch.len() {
                return Err(CollaboratorError::Failed {
                    name: "translator",
                    message: format!(
                        "expected {} translations, got {}",
                        batch.len(),
                        translated.len()
                    ),
                });
            }

            let mut cache = self.cache.lock().await;
            for ((i, original), output) in misses.into_iter().zip(translated) {
                cache.insert(
                    cache_key(&original, source_lang, target_lang),
                    output.clone(),
                );
                results[i] = Some(output);
            }
            debug!(
                "Translator call {}/{} ({} texts)",
                used + 1,
                self.budget,
                batch.len()
            );
        }

        Ok(results.into_iter().map(|r| r.unwrap_or_default()).collect())
    }
}

fn cache_key(text: &str, source: &str, target: &str) -> (String, String, String) {
    (text.to_string(), source.to_string(), target.to_string())
}
