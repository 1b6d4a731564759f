/*!
 * External collaborators consumed by the pipeline.
 *
 * Each collaborator sits behind a narrow async trait so the orchestrator can
 * be driven by real services or by the mocks in `providers::mock`:
 * - `Translator`: text translation (Anthropic)
 * - `Transcriber`: speech to text (OpenAI Whisper)
 * - `SpeechSynthesizer`: text to speech (ElevenLabs)
 * - `Rasterizer`: presentation to slide images (external script)
 * - `MediaTool`: audio probing, segmenting and video rendering (ffmpeg)
 *
 * Every method reports failures as `ServiceError` so the retry loop can
 * tell transient failures from fatal ones.
 */

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::errors::ServiceError;

/// Translates text into a language given by its English name
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_language_name`
    async fn translate(&self, text: &str, target_language_name: &str) -> Result<String, ServiceError>;
}

/// Transcribes one audio file
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Text spoken in `audio`
    async fn transcribe(&self, audio: &Path) -> Result<String, ServiceError>;
}

/// Synthesizes narration audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Encoded audio for `text` spoken by `voice_id`
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>, ServiceError>;
}

/// Renders a presentation document into per-slide images
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Write the slide images of `document` into the chapter's slides folder
    async fn rasterize(&self, document: &Path) -> Result<(), ServiceError>;
}

/// Portion of an audio file, in seconds
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSpan {
    /// Audio file
    pub path: PathBuf,
    /// Start offset
    pub start: f64,
    /// End offset
    pub end: f64,
}

/// One still image shown for `duration` seconds, optionally with narration
#[derive(Debug, Clone, PartialEq)]
pub struct StillSegment {
    /// Slide image
    pub image: PathBuf,
    /// Narration played over the image
    pub audio: Option<AudioSpan>,
    /// Display time in seconds
    pub duration: f64,
}

/// Audio and video operations
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Duration of an audio file in seconds
    async fn audio_duration(&self, audio: &Path) -> Result<f64, ServiceError>;

    /// Split `audio` into sequential pieces of at most `segment_secs` seconds.
    ///
    /// Pieces are written into `out_dir` as `<stem>_<n>.<ext>` and
    /// returned in playback order.
    async fn split_audio(&self, audio: &Path, segment_secs: f64, out_dir: &Path) -> Result<Vec<PathBuf>, ServiceError>;

    /// Render `segments` in order into one video file
    async fn render_segments(&self, segments: &[StillSegment], output: &Path) -> Result<(), ServiceError>;

    /// Join already rendered videos in order
    async fn concat(&self, parts: &[PathBuf], output: &Path) -> Result<(), ServiceError>;
}

pub mod anthropic;
pub mod elevenlabs;
pub mod media;
pub mod mock;
pub mod openai;
