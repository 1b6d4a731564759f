/*!
 * Text translation for course content.
 *
 * Everything that sends text to a translation service goes through here.
 * It is split into several submodules:
 *
 * - `core`: chunked, cached, retried translation of a piece of text
 * - `cache`: in-process memo of (text, language) pairs
 * - `chunker`: token-budgeted splitting on paragraph or sentence boundaries
 * - `retry`: transient/fatal classification and bounded retry
 * - `exceptions`: language-tag and version-marker rewrite rules
 * - `presentation`: `<a:t>` run translation inside presentation packages
 */

// Re-export main types for easier usage
pub use self::cache::TranslationCache;
pub use self::chunker::{ChunkMode, EstimatingTokenizer, TokenAwareChunker, Tokenizer};
pub use self::core::TextTranslator;
pub use self::exceptions::ExceptionRules;
pub use self::presentation::{translate_presentation, PresentationDocument};
pub use self::retry::{RetryPolicy, ServiceCaller, Sleeper, TokioSleeper};

// Submodules
pub mod cache;
pub mod chunker;
pub mod core;
pub mod exceptions;
pub mod presentation;
pub mod retry;
