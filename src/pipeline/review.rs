/*!
 * Review pass over an already localized version.
 *
 * Artifacts edited by hand since the previous version are detected by
 * content hash. A changed document is rasterized again, a changed
 * transcript is synthesized again, and any chapter touched this way gets
 * its video rebuilt once every transcript in it has audio.
 */

use log::{debug, error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::course::{Chapter, Version};
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use super::orchestrator::{audio_pending, StageOrchestrator};

/// Work done by a review pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewReport {
    pub documents_rasterized: usize,
    pub audio_synthesized: usize,
    pub videos_assembled: usize,
    /// Failures that were logged and skipped
    pub failures: Vec<String>,
}

impl ReviewReport {
    fn fail(&mut self, action: &str, subject: &Path, error: impl fmt::Display) {
        error!("Review: {} failed for {}: {}", action, subject.display(), error);
        self.failures.push(format!("{}: {}: {}", action, subject.display(), error));
    }
}

impl StageOrchestrator {
    /// Regenerate what depends on artifacts changed since the previous version
    pub async fn review(&self, language: &str, version: Version) -> Result<ReviewReport, PipelineError> {
        let version_dir = self.layout.version_dir(language, version);
        let chapters = self.layout.chapters(&version_dir)?;
        info!("Reviewing {} chapter(s) of {} {}", chapters.len(), language, version);

        let mut report = ReviewReport::default();
        for chapter in &chapters {
            self.review_chapter(chapter, &mut report).await;
        }
        info!(
            "Review of {} {} done: {} rasterized, {} audio, {} videos",
            language, version, report.documents_rasterized, report.audio_synthesized, report.videos_assembled
        );
        Ok(report)
    }

    async fn review_chapter(&self, chapter: &Chapter, report: &mut ReviewReport) {
        let mut modified = false;

        let document = chapter.document_path(&self.options.document_ext);
        match self.detector.has_changed(&document) {
            Ok(true) => {
                info!("{} changed, rasterizing again", document.display());
                match self.collaborators.rasterizer.rasterize(&document).await {
                    Ok(()) => {
                        report.documents_rasterized += 1;
                        modified = true;
                    }
                    Err(e) => report.fail("rasterize", &document, e),
                }
            }
            Ok(false) => {}
            Err(e) => report.fail("compare", &document, e),
        }

        let slides = chapter.slides_dir();
        let transcripts = if slides.is_dir() {
            match FileManager::list_files(&slides, &["txt"]) {
                Ok(files) => files,
                Err(e) => {
                    report.fail("list transcripts", &slides, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let mut changed: Vec<PathBuf> = Vec::new();
        for transcript in transcripts {
            match self.detector.has_changed(&transcript) {
                Ok(true) => changed.push(transcript),
                Ok(false) => {}
                Err(e) => report.fail("compare", &transcript, e),
            }
        }
        if !changed.is_empty() {
            info!("{} transcript(s) changed in {}", changed.len(), chapter.name);
        }

        let mut stale_audio = false;
        let outcomes = self.synthesize_all(changed.clone()).await;
        for (transcript, outcome) in changed.iter().zip(outcomes) {
            match outcome {
                Ok(_) => {
                    report.audio_synthesized += 1;
                    modified = true;
                }
                Err(e) => {
                    report.fail("synthesize", transcript, e);
                    stale_audio = true;
                }
            }
        }

        if !modified {
            debug!("Nothing changed in {}", chapter.name);
            return;
        }
        if stale_audio {
            warn!("Audio of {} is out of date, keeping the current video", chapter.name);
            return;
        }

        match audio_pending(&slides) {
            Ok(0) => {}
            Ok(missing) => {
                warn!("{} transcript(s) in {} have no audio, keeping the current video", missing, chapter.name);
                return;
            }
            Err(e) => {
                report.fail("list transcripts", &slides, e);
                return;
            }
        }

        let video = chapter.video_path();
        match self.assembler.assemble(&slides, &video).await {
            Ok(_) => report.videos_assembled += 1,
            Err(e) => report.fail("assemble", &video, e),
        }
    }
}
