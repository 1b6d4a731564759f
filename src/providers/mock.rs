/*!
 * Mock collaborators for testing.
 *
 * Every mock counts its calls and follows a `MockBehavior`:
 * - `MockBehavior::Working` - always succeeds
 * - `MockBehavior::TransientFirst(n)` - the first `n` calls fail with a retryable error
 * - `MockBehavior::Intermittent { fail_every }` - every Nth call fails with a retryable error
 * - `MockBehavior::Failing` - always fails with a fatal error
 * - `MockBehavior::FailOn(marker)` - fails fatally when the input mentions `marker`
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::course::SLIDES_DIR;
use crate::errors::{ServiceError, TransientKind};
use super::{MediaTool, Rasterizer, SpeechSynthesizer, StillSegment, Transcriber, Translator};

/// Behavior mode shared by all mocks
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// The first `n` calls fail with a rate limit
    TransientFirst(usize),
    /// Every Nth call fails with an upstream error
    Intermittent { fail_every: usize },
    /// Always fails fatally
    Failing,
    /// Fails fatally on inputs containing the marker
    FailOn(String),
}

impl MockBehavior {
    /// Outcome of call number `count` (0-based) with `input`
    fn check(&self, count: usize, input: &str) -> Result<(), ServiceError> {
        match self {
            Self::Working => Ok(()),
            Self::TransientFirst(n) if count < *n => Err(ServiceError::transient(
                TransientKind::RateLimit,
                format!("Simulated rate limit (request #{})", count + 1),
            )),
            Self::TransientFirst(_) => Ok(()),
            Self::Intermittent { fail_every } if *fail_every > 0 && count % fail_every == fail_every - 1 => {
                Err(ServiceError::transient(
                    TransientKind::UpstreamServer,
                    format!("Simulated intermittent failure (request #{})", count + 1),
                ))
            }
            Self::Intermittent { .. } => Ok(()),
            Self::Failing => Err(ServiceError::fatal("Simulated provider failure")),
            Self::FailOn(marker) if input.contains(marker.as_str()) => {
                Err(ServiceError::fatal(format!("Simulated failure on '{}'", marker)))
            }
            Self::FailOn(_) => Ok(()),
        }
    }
}

/// Mock translator producing `[<language>] <text>`
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTranslator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Number of translate calls, failed ones included
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Texts received, in call order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target_language_name: &str) -> Result<String, ServiceError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(text.to_string());
        self.behavior.check(count, text)?;
        Ok(format!("[{}] {}", target_language_name, text))
    }
}

/// Mock transcriber returning a fixed text per file stem
#[derive(Debug, Clone)]
pub struct MockTranscriber {
    behavior: MockBehavior,
    request_count: Arc<AtomicUsize>,
    transcribed: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockTranscriber {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            transcribed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Files passed to `transcribe`, in call order
    pub fn transcribed(&self) -> Vec<PathBuf> {
        self.transcribed.lock().clone()
    }
}

#[async_trait]
impl Transcriber for MockTranscriber {
    async fn transcribe(&self, audio: &Path) -> Result<String, ServiceError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.transcribed.lock().push(audio.to_path_buf());
        let stem = audio.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        self.behavior.check(count, &stem)?;
        Ok(format!("Narration of {}.", stem))
    }
}

/// Mock synthesizer that tracks how many calls overlap
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    behavior: MockBehavior,
    delay: Duration,
    request_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockSynthesizer {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            delay: Duration::ZERO,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Hold every call for `delay` so concurrent calls overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls observed running at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ServiceError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let outcome = self.behavior.check(count, text);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        outcome?;
        Ok(format!("{}|{}", voice_id, text).into_bytes())
    }
}

/// Mock rasterizer writing `1.png..=N.png` into the document's slides folder
#[derive(Debug, Clone)]
pub struct MockRasterizer {
    behavior: MockBehavior,
    images: usize,
    request_count: Arc<AtomicUsize>,
}

impl MockRasterizer {
    pub fn new(behavior: MockBehavior, images: usize) -> Self {
        Self {
            behavior,
            images,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working(images: usize) -> Self {
        Self::new(MockBehavior::Working, images)
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Rasterizer for MockRasterizer {
    async fn rasterize(&self, document: &Path) -> Result<(), ServiceError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.behavior.check(count, &document.to_string_lossy())?;

        let slides = document
            .parent()
            .map(|p| p.join(SLIDES_DIR))
            .ok_or_else(|| ServiceError::fatal("Document has no parent directory"))?;
        std::fs::create_dir_all(&slides).map_err(|e| ServiceError::fatal(e.to_string()))?;
        for i in 1..=self.images {
            std::fs::write(slides.join(format!("{}.png", i)), format!("image {}", i))
                .map_err(|e| ServiceError::fatal(e.to_string()))?;
        }
        Ok(())
    }
}

/// Mock media tool with configurable durations and recorded renders
#[derive(Debug, Clone)]
pub struct MockMediaTool {
    /// Durations by file name
    durations: HashMap<String, f64>,
    /// Duration of files without an entry, `None` to fail the probe
    default_duration: Option<f64>,
    renders: Arc<Mutex<Vec<Vec<StillSegment>>>>,
    splits: Arc<AtomicUsize>,
}

impl MockMediaTool {
    pub fn new(default_duration: Option<f64>) -> Self {
        Self {
            durations: HashMap::new(),
            default_duration,
            renders: Arc::new(Mutex::new(Vec::new())),
            splits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Report `seconds` for files named `file_name`
    pub fn with_duration(mut self, file_name: &str, seconds: f64) -> Self {
        self.durations.insert(file_name.to_string(), seconds);
        self
    }

    /// Segment lists passed to `render_segments`, one entry per call
    pub fn renders(&self) -> Vec<Vec<StillSegment>> {
        self.renders.lock().clone()
    }

    /// Number of `split_audio` calls
    pub fn split_count(&self) -> usize {
        self.splits.load(Ordering::SeqCst)
    }

    fn duration_of(&self, audio: &Path) -> Option<f64> {
        let name = audio.file_name()?.to_string_lossy().to_string();
        self.durations.get(&name).copied().or(self.default_duration)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), ServiceError> {
    std::fs::write(path, content).map_err(|e| ServiceError::fatal(format!("{}: {}", path.display(), e)))
}

#[async_trait]
impl MediaTool for MockMediaTool {
    async fn audio_duration(&self, audio: &Path) -> Result<f64, ServiceError> {
        self.duration_of(audio)
            .ok_or_else(|| ServiceError::fatal(format!("No duration for {}", audio.display())))
    }

    async fn split_audio(&self, audio: &Path, segment_secs: f64, out_dir: &Path) -> Result<Vec<PathBuf>, ServiceError> {
        self.splits.fetch_add(1, Ordering::SeqCst);
        let total = self.audio_duration(audio).await?;
        let stem = audio.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let ext = audio.extension().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();

        let count = (total / segment_secs).ceil().max(1.0) as usize;
        let mut parts = Vec::with_capacity(count);
        for i in 0..count {
            let part = out_dir.join(format!("{}_{}.{}", stem, i, ext));
            write_file(&part, format!("part {}", i).as_bytes())?;
            parts.push(part);
        }
        Ok(parts)
    }

    async fn render_segments(&self, segments: &[StillSegment], output: &Path) -> Result<(), ServiceError> {
        self.renders.lock().push(segments.to_vec());
        let description: String = segments
            .iter()
            .map(|s| {
                let image = s.image.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                format!("{} {:.3}\n", image, s.duration)
            })
            .collect();
        write_file(output, description.as_bytes())
    }

    async fn concat(&self, parts: &[PathBuf], output: &Path) -> Result<(), ServiceError> {
        let mut joined = Vec::new();
        for part in parts {
            let bytes = std::fs::read(part).map_err(|e| ServiceError::fatal(format!("{}: {}", part.display(), e)))?;
            joined.extend_from_slice(&bytes);
        }
        write_file(output, &joined)
    }
}
