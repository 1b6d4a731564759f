/*!
 * Core text translation.
 *
 * `TextTranslator` is the one path every piece of course text takes on its
 * way to the translation service: chunk under the token budget, consult the
 * run cache, call the service through the retry loop, re-join.
 */

use log::debug;
use std::sync::Arc;

use crate::errors::TranslationError;
use crate::providers::Translator;
use super::cache::TranslationCache;
use super::chunker::{ChunkMode, TokenAwareChunker};
use super::retry::ServiceCaller;

/// Chunked, cached, retried translation
#[derive(Clone)]
pub struct TextTranslator {
    /// Translation collaborator
    translator: Arc<dyn Translator>,

    /// Process-lifetime memo of (text, language) pairs
    cache: TranslationCache,

    /// Retry loop around each service call
    caller: ServiceCaller,

    /// Splits text under the token budget
    chunker: TokenAwareChunker,
}

impl TextTranslator {
    /// Create a translator from its collaborators
    pub fn new(
        translator: Arc<dyn Translator>,
        cache: TranslationCache,
        caller: ServiceCaller,
        chunker: TokenAwareChunker,
    ) -> Self {
        Self {
            translator,
            cache,
            caller,
            chunker,
        }
    }

    /// The shared translation cache
    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    /// The chunker used to split text
    pub fn chunker(&self) -> &TokenAwareChunker {
        &self.chunker
    }

    /// Translate one chunk, through the cache
    pub async fn translate_chunk(&self, chunk: &str, target_language_name: &str) -> Result<String, TranslationError> {
        let translated = self
            .cache
            .get(chunk, target_language_name, |text, language| async move {
                self.caller.call(|| self.translator.translate(&text, &language)).await
            })
            .await?;
        Ok(translated)
    }

    /// Translate `text`, chunked under `max_tokens` in the given mode.
    ///
    /// Chunks are translated in order and joined with the mode separator.
    /// Blank text is returned unchanged without calling the service.
    pub async fn translate_text(
        &self,
        text: &str,
        target_language_name: &str,
        max_tokens: usize,
        mode: ChunkMode,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let chunks = self.chunker.split_into_chunks(text, max_tokens, mode);
        debug!(
            "Translating {} chars into {} as {} chunk(s)",
            text.chars().count(),
            target_language_name,
            chunks.len()
        );

        let mut translated = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            translated.push(self.translate_chunk(chunk, target_language_name).await?);
        }
        Ok(translated.join(mode.separator()))
    }
}
