/*!
 * Translation caching functionality.
 *
 * This module memoizes translations for the lifetime of the process to
 * avoid sending the same text to the translation service twice. It is not
 * persisted: a new run starts cold, and artifacts already on disk are
 * skipped before any text reaches the cache.
 */

use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Cache key combining the exact source text and the target language
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    /// Source text to translate
    source_text: String,

    /// Target language identifier
    target_language: String,
}

impl CacheKey {
    /// Create a new cache key
    fn new(source_text: &str, target_language: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// Translation cache shared by every caller within a run.
///
/// Cloning is cheap and clones share storage.
#[derive(Clone, Default)]
pub struct TranslationCache {
    /// Internal cache storage
    cache: Arc<RwLock<HashMap<CacheKey, String>>>,

    /// Cache hit counter
    hits: Arc<AtomicUsize>,

    /// Cache miss counter
    misses: Arc<AtomicUsize>,
}

impl TranslationCache {
    /// Create a new, empty translation cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached translation or compute, store and return it.
    ///
    /// `translate_fn` receives the text and target language and runs only
    /// on a miss. Errors are returned unchanged and nothing is stored.
    pub async fn get<F, Fut, E>(&self, source_text: &str, target_language: &str, translate_fn: F) -> Result<String, E>
    where
        F: FnOnce(String, String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        if let Some(hit) = self.lookup(source_text, target_language) {
            return Ok(hit);
        }

        let translated = translate_fn(source_text.to_string(), target_language.to_string()).await?;
        Ok(self.store(source_text, target_language, &translated))
    }

    /// Get a translation from the cache
    pub fn lookup(&self, source_text: &str, target_language: &str) -> Option<String> {
        let key = CacheKey::new(source_text, target_language);
        let cache = self.cache.read();

        match cache.get(&key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for '{}' (-> {})", truncate_text(source_text, 30), target_language);
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a translation unless the key is already present.
    ///
    /// Returns the value held by the cache after the call, which is the
    /// earlier entry if another caller stored the same key first.
    pub fn store(&self, source_text: &str, target_language: &str, translation: &str) -> String {
        let key = CacheKey::new(source_text, target_language);
        let mut cache = self.cache.write();
        cache.entry(key).or_insert_with(|| translation.to_string()).clone()
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
