/*!
 * Source narration transcription.
 *
 * Recordings above the upload limit are split into time segments first.
 * Segments live in a scratch directory outside the course tree and are
 * transcribed in order, then joined with a space.
 */

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{PipelineError, TranscriptionError};
use crate::file_utils::FileManager;
use crate::providers::{MediaTool, Transcriber};
use crate::translation::ServiceCaller;

/// Default upload limit of the transcription service
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Transcript path of a narration file
pub fn transcript_path(audio: &Path) -> PathBuf {
    audio.with_extension("txt")
}

/// Turns source narration into transcripts next to the audio
#[derive(Clone)]
pub struct SourceTranscriber {
    transcriber: Arc<dyn Transcriber>,
    media: Arc<dyn MediaTool>,
    caller: ServiceCaller,
    max_upload_bytes: u64,
}

impl SourceTranscriber {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        media: Arc<dyn MediaTool>,
        caller: ServiceCaller,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            transcriber,
            media,
            caller,
            max_upload_bytes: max_upload_bytes.max(1),
        }
    }

    /// Segment length for oversized recordings.
    ///
    /// Sized so that a segment at 8 bits per millisecond of audio per
    /// kilobyte stays under the upload limit.
    pub fn segment_secs(&self) -> f64 {
        let millis = self.max_upload_bytes * 8 / 1000;
        (millis as f64 / 1000.0).max(1.0)
    }

    /// Transcribe `audio` unless its transcript already exists.
    ///
    /// Returns the transcript path when one was written.
    pub async fn transcribe_file(&self, audio: &Path) -> Result<Option<PathBuf>, PipelineError> {
        let transcript = transcript_path(audio);
        if transcript.exists() {
            debug!("Transcript already present for {}", audio.display());
            return Ok(None);
        }

        let size = fs::metadata(audio)?.len();
        let text = if size > self.max_upload_bytes {
            info!(
                "{} is {} bytes, over the {} byte upload limit, splitting",
                audio.display(),
                size,
                self.max_upload_bytes
            );
            // Removed on drop, so an interrupted run leaves nothing in the slides folder
            let scratch = tempfile::Builder::new().prefix("course-localizer-split-").tempdir()?;
            let parts = self
                .media
                .split_audio(audio, self.segment_secs(), scratch.path())
                .await
                .map_err(TranscriptionError::Segmentation)?;
            self.transcribe_parts(&parts).await?
        } else {
            self.transcribe_one(audio).await?
        };

        FileManager::write_atomic(&transcript, text.as_bytes())?;
        debug!("Wrote transcript {}", transcript.display());
        Ok(Some(transcript))
    }

    async fn transcribe_one(&self, audio: &Path) -> Result<String, TranscriptionError> {
        Ok(self.caller.call(|| self.transcriber.transcribe(audio)).await?)
    }

    async fn transcribe_parts(&self, parts: &[PathBuf]) -> Result<String, TranscriptionError> {
        let mut texts = Vec::with_capacity(parts.len());
        for part in parts {
            texts.push(self.transcribe_one(part).await?);
        }
        Ok(texts.join(" "))
    }
}
