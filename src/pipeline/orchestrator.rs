/*!
 * Stage orchestration.
 *
 * Stages run in order for one target language at a time, each over every
 * chapter. A chapter whose document could not be translated or rasterized
 * is left out of the later stages for that language; any other failure is
 * logged and counted and the run moves on to the next artifact.
 */

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::course::{ArtifactName, ChangeDetector, Chapter, CourseLayout, Version, VersionPolicy};
use crate::errors::{PipelineError, ValidationError};
use crate::file_utils::FileManager;
use crate::language_utils::language_name;
use crate::providers::{MediaTool, Rasterizer, SpeechSynthesizer, Transcriber, Translator};
use crate::translation::{
    translate_presentation, ChunkMode, ExceptionRules, ServiceCaller, TextTranslator, TokenAwareChunker,
    TranslationCache,
};
use crate::voice::Voice;
use super::assembler::{ArtifactAssembler, AssemblyConfig, AUDIO_EXTENSION, IMAGE_EXTENSIONS};
use super::cost::{estimate_synthesis_cost, DEFAULT_PRICE_PER_1K_CHARS};
use super::stage_progress;
use super::transcription::{transcript_path, SourceTranscriber, DEFAULT_MAX_UPLOAD_BYTES};
use super::worker_pool::BoundedWorkerPool;

/// External services the pipeline drives
#[derive(Clone)]
pub struct Collaborators {
    pub translator: Arc<dyn Translator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub media: Arc<dyn MediaTool>,
}

/// Tunables of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Chapters whose name contains this marker are skipped
    pub do_not_translate_marker: String,
    /// Extension of chapter documents
    pub document_ext: String,
    /// Token budget per transcript chunk
    pub max_tokens_transcript: usize,
    /// Token budget per slide text chunk
    pub max_tokens_slide: usize,
    /// Recordings above this size are split before transcription
    pub max_upload_bytes: u64,
    /// Ceiling on concurrent synthesis calls
    pub max_workers: usize,
    /// Synthesis price used for the cost log
    pub price_per_1k_chars: f64,
    pub assembly: AssemblyConfig,
    /// Draw progress bars
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            do_not_translate_marker: "-DNT".to_string(),
            document_ext: "pptx".to_string(),
            max_tokens_transcript: 1750,
            max_tokens_slide: 1000,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_workers: 15,
            price_per_1k_chars: DEFAULT_PRICE_PER_1K_CHARS,
            assembly: AssemblyConfig::default(),
            show_progress: true,
        }
    }
}

/// One localization request
#[derive(Debug, Clone)]
pub struct LocalizeRequest {
    pub source_language: String,
    /// Source version to read; the latest one when `None`
    pub source_version: Option<Version>,
    pub target_languages: Vec<String>,
    pub policy: VersionPolicy,
}

/// Work done per stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub documents_translated: usize,
    pub documents_rasterized: usize,
    pub transcripts_created: usize,
    pub transcripts_translated: usize,
    pub audio_synthesized: usize,
    pub videos_assembled: usize,
}

impl StageCounts {
    /// Total number of artifacts produced
    pub fn total(&self) -> usize {
        self.documents_translated
            + self.documents_rasterized
            + self.transcripts_created
            + self.transcripts_translated
            + self.audio_synthesized
            + self.videos_assembled
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} documents, {} rasterized, {} transcribed, {} transcripts translated, {} audio, {} videos",
            self.documents_translated,
            self.documents_rasterized,
            self.transcripts_created,
            self.transcripts_translated,
            self.audio_synthesized,
            self.videos_assembled
        )
    }
}

/// Outcome of one target language
#[derive(Debug, Clone)]
pub struct LanguageReport {
    pub language: String,
    /// Version directory the language was written into
    pub version_dir: PathBuf,
    pub counts: StageCounts,
    /// Failures that were logged and skipped
    pub failures: Vec<String>,
}

impl LanguageReport {
    fn new(language: &str, version_dir: PathBuf) -> Self {
        Self {
            language: language.to_string(),
            version_dir,
            counts: StageCounts::default(),
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, stage: &str, subject: &Path, error: impl fmt::Display) {
        error!("[{}] {} failed for {}: {}", self.language, stage, subject.display(), error);
        self.failures.push(format!("{}: {}: {}", stage, subject.display(), error));
    }
}

/// Outcome of a whole request
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub languages: Vec<LanguageReport>,
    /// Languages that could not be started, with the reason
    pub aborted: Vec<(String, String)>,
}

impl RunReport {
    /// Whether every language ran and nothing failed
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty() && self.languages.iter().all(|l| l.failures.is_empty())
    }
}

/// Runs the pipeline stages over a course tree
pub struct StageOrchestrator {
    pub(super) layout: CourseLayout,
    pub(super) collaborators: Collaborators,
    pub(super) caller: ServiceCaller,
    pub(super) text: TextTranslator,
    pub(super) transcription: SourceTranscriber,
    pub(super) assembler: ArtifactAssembler,
    pub(super) pool: BoundedWorkerPool,
    pub(super) detector: ChangeDetector,
    pub(super) options: PipelineOptions,
}

impl StageOrchestrator {
    /// Create an orchestrator for the course at `course_root`
    pub fn new(
        course_root: impl Into<PathBuf>,
        collaborators: Collaborators,
        caller: ServiceCaller,
        options: PipelineOptions,
    ) -> Self {
        let layout = CourseLayout::new(course_root, options.do_not_translate_marker.clone());
        let text = TextTranslator::new(
            collaborators.translator.clone(),
            TranslationCache::new(),
            caller.clone(),
            TokenAwareChunker::default(),
        );
        let transcription = SourceTranscriber::new(
            collaborators.transcriber.clone(),
            collaborators.media.clone(),
            caller.clone(),
            options.max_upload_bytes,
        );
        let assembler = ArtifactAssembler::new(collaborators.media.clone(), options.assembly);
        let pool = BoundedWorkerPool::new(options.max_workers);
        let detector = ChangeDetector::new(layout.root());

        Self {
            layout,
            collaborators,
            caller,
            text,
            transcription,
            assembler,
            pool,
            detector,
            options,
        }
    }

    /// Replace the chunker used for text translation
    pub fn with_chunker(mut self, chunker: TokenAwareChunker) -> Self {
        self.text = TextTranslator::new(
            self.collaborators.translator.clone(),
            self.text.cache().clone(),
            self.caller.clone(),
            chunker,
        );
        self
    }

    pub fn layout(&self) -> &CourseLayout {
        &self.layout
    }

    /// Translation memo shared by every language of this orchestrator
    pub fn cache(&self) -> &TranslationCache {
        self.text.cache()
    }

    /// Run every target language of `request`.
    ///
    /// A language that cannot be started (unknown code, missing source
    /// version) is recorded as aborted; the others still run.
    pub async fn run(&self, request: &LocalizeRequest) -> RunReport {
        let mut report = RunReport::default();

        let source_version = match self.source_version(request) {
            Ok(version) => version,
            Err(e) => {
                error!("Cannot read source language {}: {}", request.source_language, e);
                for target in &request.target_languages {
                    report.aborted.push((target.clone(), e.to_string()));
                }
                return report;
            }
        };

        for target in &request.target_languages {
            match self
                .run_language(&request.source_language, source_version, target, request.policy)
                .await
            {
                Ok(language) => {
                    info!("[{}] Done: {}", target, language.counts);
                    if !language.failures.is_empty() {
                        warn!("[{}] {} artifact(s) failed", target, language.failures.len());
                    }
                    report.languages.push(language);
                }
                Err(e) => {
                    error!("[{}] Aborted: {}", target, e);
                    report.aborted.push((target.clone(), e.to_string()));
                }
            }
        }
        report
    }

    fn source_version(&self, request: &LocalizeRequest) -> Result<Version, PipelineError> {
        if let Some(version) = request.source_version {
            return Ok(version);
        }
        self.layout
            .latest_version(&request.source_language)?
            .ok_or_else(|| {
                ValidationError::MissingDirectory(self.layout.language_dir(&request.source_language).display().to_string())
                    .into()
            })
    }

    /// Run all six stages from one source version into one target language
    pub async fn run_language(
        &self,
        source_language: &str,
        source_version: Version,
        target_language: &str,
        policy: VersionPolicy,
    ) -> Result<LanguageReport, PipelineError> {
        let target_name = language_name(target_language)?;
        let target_dir = self
            .layout
            .resolve_target_version_path(source_language, target_language, source_version, policy)?;
        let target_version = version_of(&target_dir)?;
        let source_dir = self.layout.version_dir(source_language, source_version);
        let chapters = self.layout.chapters(&source_dir)?;

        info!(
            "Localizing {} chapter(s) of {} {} into {} ({})",
            chapters.len(),
            source_language,
            source_version,
            target_name,
            target_dir.display()
        );

        let mut report = LanguageReport::new(target_language, target_dir.clone());
        let mut blocked: HashSet<String> = HashSet::new();

        let rules = ExceptionRules::new(source_language, target_language, target_version);
        self.translate_documents(&chapters, &target_dir, &rules, &target_name, &mut report, &mut blocked)
            .await;
        self.transcribe_sources(&chapters, &mut report).await;

        let open: Vec<&Chapter> = chapters.iter().filter(|c| !blocked.contains(&c.name)).collect();
        self.translate_transcripts(&open, &target_dir, &target_name, &mut report).await;

        let targets: Vec<Chapter> = open.iter().map(|c| self.layout.counterpart(c, &target_dir)).collect();
        self.synthesize_missing(&targets, &mut report).await;
        self.assemble_missing(&targets, &mut report).await;

        Ok(report)
    }

    /// Stages 1 and 2: translate missing documents and rasterize them
    async fn translate_documents(
        &self,
        chapters: &[Chapter],
        target_dir: &Path,
        rules: &ExceptionRules,
        target_name: &str,
        report: &mut LanguageReport,
        blocked: &mut HashSet<String>,
    ) {
        let ext = &self.options.document_ext;
        let bar = stage_progress(self.options.show_progress, chapters.len(), "documents");

        for chapter in chapters {
            bar.set_message(chapter.name.clone());
            let source_doc = chapter.document_path(ext);
            let target = self.layout.counterpart(chapter, target_dir);
            let target_doc = target.document_path(ext);

            let mut translated = false;
            if !source_doc.is_file() {
                debug!("No document in {}", chapter.dir.display());
            } else if target_doc.exists() {
                debug!("Skipping existing {}", target_doc.display());
            } else {
                match translate_presentation(
                    &source_doc,
                    &target_doc,
                    &self.text,
                    rules,
                    target_name,
                    self.options.max_tokens_slide,
                )
                .await
                {
                    Ok(_) => {
                        report.counts.documents_translated += 1;
                        translated = true;
                    }
                    Err(e) => {
                        report.fail("translate document", &source_doc, e);
                        blocked.insert(chapter.name.clone());
                        bar.inc(1);
                        continue;
                    }
                }
            }

            // Also picks up documents whose rasterization failed on an earlier run
            if target_doc.is_file() && (translated || !has_images(&target.slides_dir())) {
                match self.collaborators.rasterizer.rasterize(&target_doc).await {
                    Ok(()) => report.counts.documents_rasterized += 1,
                    Err(e) => {
                        report.fail("rasterize", &target_doc, e);
                        blocked.insert(chapter.name.clone());
                    }
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    /// Stage 3: transcribe source narration that has no transcript
    async fn transcribe_sources(&self, chapters: &[Chapter], report: &mut LanguageReport) {
        let mut pending = Vec::new();
        for chapter in chapters {
            let slides = chapter.slides_dir();
            if !slides.is_dir() {
                continue;
            }
            match FileManager::list_files(&slides, &[AUDIO_EXTENSION]) {
                Ok(files) => pending.extend(files.into_iter().filter(|a| !transcript_path(a).exists())),
                Err(e) => report.fail("list narration", &slides, e),
            }
        }

        let bar = stage_progress(self.options.show_progress, pending.len(), "transcriptions");
        for audio in pending {
            match self.transcription.transcribe_file(&audio).await {
                Ok(Some(_)) => report.counts.transcripts_created += 1,
                Ok(None) => {}
                Err(e) => report.fail("transcribe", &audio, e),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    /// Stage 4: translate source transcripts missing in the target
    async fn translate_transcripts(
        &self,
        chapters: &[&Chapter],
        target_dir: &Path,
        target_name: &str,
        report: &mut LanguageReport,
    ) {
        let mut pending: Vec<(PathBuf, PathBuf)> = Vec::new();
        for chapter in chapters {
            let slides = chapter.slides_dir();
            if !slides.is_dir() {
                continue;
            }
            let target_slides = self.layout.counterpart(chapter, target_dir).slides_dir();
            match FileManager::list_files(&slides, &["txt"]) {
                Ok(files) => {
                    for source in files {
                        let Some(file_name) = source.file_name() else { continue };
                        let target = target_slides.join(file_name);
                        if !target.exists() {
                            pending.push((source, target));
                        }
                    }
                }
                Err(e) => report.fail("list transcripts", &slides, e),
            }
        }

        let bar = stage_progress(self.options.show_progress, pending.len(), "transcripts");
        for (source, target) in pending {
            match self.translate_transcript(&source, &target, target_name).await {
                Ok(()) => report.counts.transcripts_translated += 1,
                Err(e) => report.fail("translate transcript", &source, e),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    async fn translate_transcript(&self, source: &Path, target: &Path, target_name: &str) -> Result<(), PipelineError> {
        let text = tokio::fs::read_to_string(source).await?;
        let translated = self
            .text
            .translate_text(&text, target_name, self.options.max_tokens_transcript, ChunkMode::Sentence)
            .await?;
        FileManager::write_atomic(target, translated.as_bytes())?;
        debug!("Wrote {}", target.display());
        Ok(())
    }

    /// Stage 5: synthesize every target transcript without audio
    async fn synthesize_missing(&self, chapters: &[Chapter], report: &mut LanguageReport) {
        match estimate_synthesis_cost(chapters, self.options.price_per_1k_chars) {
            Ok(estimate) if estimate.transcripts > 0 => info!(
                "[{}] Synthesizing {} transcript(s), {} characters, estimated ${:.2}",
                report.language, estimate.transcripts, estimate.characters, estimate.cost
            ),
            Ok(_) => {}
            Err(e) => warn!("[{}] Could not estimate synthesis cost: {}", report.language, e),
        }

        let mut pending = Vec::new();
        for chapter in chapters {
            let slides = chapter.slides_dir();
            if !slides.is_dir() {
                continue;
            }
            match FileManager::list_files(&slides, &["txt"]) {
                Ok(files) => pending.extend(files.into_iter().filter(|t| !t.with_extension(AUDIO_EXTENSION).exists())),
                Err(e) => report.fail("list transcripts", &slides, e),
            }
        }

        let outcomes = self.synthesize_all(pending.clone()).await;
        for (transcript, outcome) in pending.iter().zip(outcomes) {
            match outcome {
                Ok(_) => report.counts.audio_synthesized += 1,
                Err(e) => report.fail("synthesize", transcript, e),
            }
        }
    }

    /// Fan synthesis of `transcripts` out over the worker pool
    pub(super) async fn synthesize_all(&self, transcripts: Vec<PathBuf>) -> Vec<Result<PathBuf, PipelineError>> {
        if transcripts.is_empty() {
            return Vec::new();
        }
        info!(
            "Synthesizing {} transcript(s) with {} worker(s)",
            transcripts.len(),
            self.pool.pool_size(transcripts.len())
        );

        let bar = stage_progress(self.options.show_progress, transcripts.len(), "audio");
        let results = self
            .pool
            .run(transcripts, |transcript| {
                let bar = bar.clone();
                async move {
                    let result = self.synthesize_transcript(&transcript).await;
                    bar.inc(1);
                    result
                }
            })
            .await;
        bar.finish_and_clear();
        results
    }

    /// Synthesize one transcript into its sibling audio file.
    ///
    /// The voice comes from the tag in the transcript's filename.
    pub async fn synthesize_transcript(&self, transcript: &Path) -> Result<PathBuf, PipelineError> {
        let name = ArtifactName::from_path(transcript)?;
        let tag = name
            .voice_tag
            .as_deref()
            .ok_or_else(|| ValidationError::UnknownVoice(name.stem()))?;
        let voice = Voice::from_tag(tag)?;

        let text = tokio::fs::read_to_string(transcript).await?;
        let audio = self
            .caller
            .call(|| self.collaborators.synthesizer.synthesize(&text, voice.id()))
            .await?;

        let output = name.with_extension(AUDIO_EXTENSION).sibling_of(transcript);
        FileManager::write_atomic(&output, &audio)?;
        debug!("Wrote {} ({} bytes, voice {})", output.display(), audio.len(), voice);
        Ok(output)
    }

    /// Stage 6: assemble chapter videos that do not exist yet.
    ///
    /// A chapter with a transcript still lacking audio waits for a later run;
    /// its video is never built from an incomplete slides folder.
    async fn assemble_missing(&self, chapters: &[Chapter], report: &mut LanguageReport) {
        let mut pending: Vec<&Chapter> = Vec::new();
        for chapter in chapters {
            let slides = chapter.slides_dir();
            if chapter.video_path().exists() || !slides.is_dir() {
                continue;
            }
            match audio_pending(&slides) {
                Ok(0) => pending.push(chapter),
                Ok(missing) => warn!(
                    "[{}] {} transcript(s) in {} have no audio yet, not assembling its video",
                    report.language, missing, chapter.name
                ),
                Err(e) => report.fail("list transcripts", &slides, e),
            }
        }
        let bar = stage_progress(self.options.show_progress, pending.len(), "videos");
        for chapter in pending {
            bar.set_message(chapter.name.clone());
            let video = chapter.video_path();
            match self.assembler.assemble(&chapter.slides_dir(), &video).await {
                Ok(_) => report.counts.videos_assembled += 1,
                Err(e) => report.fail("assemble", &video, e),
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
    }
}

/// Version named by the last component of a version directory
fn version_of(version_dir: &Path) -> Result<Version, ValidationError> {
    let name = version_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ValidationError::MalformedVersion(version_dir.display().to_string()))?;
    name.parse()
}

/// Number of transcripts in a slides folder without their sibling audio
pub(super) fn audio_pending(slides_dir: &Path) -> std::io::Result<usize> {
    let transcripts = FileManager::list_files(slides_dir, &["txt"])?;
    Ok(transcripts
        .iter()
        .filter(|t| !t.with_extension(AUDIO_EXTENSION).exists())
        .count())
}

/// Whether a slides folder already holds rendered images
fn has_images(slides_dir: &Path) -> bool {
    FileManager::list_files(slides_dir, IMAGE_EXTENSIONS)
        .map(|images| !images.is_empty())
        .unwrap_or(false)
}
