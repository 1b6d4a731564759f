/*!
 * Tests for translation cache functionality
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use course_localizer::providers::mock::{MockBehavior, MockTranslator};
use course_localizer::translation::{
    ChunkMode, RetryPolicy, ServiceCaller, TextTranslator, TokenAwareChunker, TranslationCache,
};

use crate::common::RecordingSleeper;

#[tokio::test]
async fn test_cache_get_withRepeatedKey_shouldComputeOnce() {
    let cache = TranslationCache::new();
    let counter = AtomicUsize::new(0);
    let calls = &counter;

    for _ in 0..3 {
        let value = cache
            .get("hello", "French", |text, language| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(format!("{}:{}", language, text))
            })
            .await
            .unwrap();
        assert_eq!(value, "French:hello");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    let (hits, misses, _) = cache.stats();
    assert_eq!((hits, misses), (2, 1));
}

#[tokio::test]
async fn test_cache_get_withDifferentLanguages_shouldKeepSeparateEntries() {
    let cache = TranslationCache::new();
    cache.store("hello", "French", "bonjour");

    assert_eq!(cache.lookup("hello", "French"), Some("bonjour".to_string()));
    assert_eq!(cache.lookup("hello", "Spanish"), None);
    assert_eq!(cache.lookup("Hello", "French"), None);
}

#[tokio::test]
async fn test_cache_get_withError_shouldNotStoreAnything() {
    let cache = TranslationCache::new();

    let result = cache
        .get("hello", "French", |_, _| async { Err::<String, _>("service down".to_string()) })
        .await;

    assert!(result.is_err());
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_cache_clones_shouldShareStorage() {
    let cache = TranslationCache::new();
    let clone = cache.clone();
    clone.store("hello", "German", "hallo");

    assert_eq!(cache.lookup("hello", "German"), Some("hallo".to_string()));
}

#[tokio::test]
async fn test_text_translator_withRepeatedText_shouldCallServiceOnce() {
    let mock = Arc::new(MockTranslator::working());
    let caller = ServiceCaller::with_sleeper(RetryPolicy::default(), Arc::new(RecordingSleeper::default()));
    let translator = TextTranslator::new(mock.clone(), TranslationCache::new(), caller, TokenAwareChunker::default());

    let first = translator.translate_text("Keep your keys safe.", "French", 1750, ChunkMode::Sentence).await.unwrap();
    let second = translator.translate_text("Keep your keys safe.", "French", 1750, ChunkMode::Sentence).await.unwrap();

    assert_eq!(first, "[French] Keep your keys safe.");
    assert_eq!(first, second);
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn test_text_translator_withExhaustedService_shouldNotCacheFailure() {
    let mock = Arc::new(MockTranslator::new(MockBehavior::TransientFirst(3)));
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = ServiceCaller::with_sleeper(RetryPolicy::new(2, Duration::from_secs(1)), sleeper.clone());
    let translator = TextTranslator::new(mock.clone(), TranslationCache::new(), caller, TokenAwareChunker::default());

    let error = translator.translate_chunk("Hello", "French").await.unwrap_err();
    assert!(error.to_string().contains("2 attempts"));
    assert!(translator.cache().is_empty());

    // Third call fails once more, the fourth succeeds
    let value = translator.translate_chunk("Hello", "French").await.unwrap();
    assert_eq!(value, "[French] Hello");
    assert_eq!(mock.request_count(), 4);
    assert_eq!(sleeper.calls().len(), 2);
}
