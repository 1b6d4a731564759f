use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::course::{Chapter, CourseLayout, CourseMetadata, Version, VersionPolicy};
use crate::language_utils;
use crate::pipeline::{
    estimate_synthesis_cost, Collaborators, CostEstimate, LocalizeRequest, PipelineOptions, ReviewReport, RunReport,
    StageOrchestrator,
};
use crate::providers::anthropic::Anthropic;
use crate::providers::elevenlabs::ElevenLabs;
use crate::providers::media::{FfmpegTool, ScriptRasterizer};
use crate::providers::openai::OpenAI;
use crate::translation::ServiceCaller;

// @module: Application controller for course localization

/// What a `localize` run should do
#[derive(Debug, Clone, Default)]
pub struct LocalizeOptions {
    /// Source language; falls back to `course.yml`, then the config
    pub source_language: Option<String>,
    /// Target languages; falls back to the config
    pub target_languages: Vec<String>,
    /// Source version; the latest one when `None`
    pub source_version: Option<Version>,
    /// Start a new target version instead of filling the latest one
    pub new_version: bool,
}

/// Main application controller for course localization
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Collaborators replacing the real services, if any
    collaborators: Option<Collaborators>,

    // @field: Draw progress bars
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators: None,
            show_progress: true,
        })
    }

    /// Controller driving the given collaborators instead of real services
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> Result<Self> {
        let mut controller = Self::with_config(config)?;
        controller.collaborators = Some(collaborators);
        controller.show_progress = false;
        Ok(controller)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pipeline tunables derived from the configuration
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            do_not_translate_marker: self.config.layout.do_not_translate_marker.clone(),
            document_ext: self.config.layout.document_ext.clone(),
            max_tokens_transcript: self.config.translation.max_tokens_transcript,
            max_tokens_slide: self.config.translation.max_tokens_slide,
            max_upload_bytes: self.config.transcription.max_upload_mb * 1024 * 1024,
            max_workers: self.config.concurrency.max_workers,
            price_per_1k_chars: self.config.speech.price_per_1k_chars,
            assembly: self.config.assembly.assembly_config(),
            show_progress: self.show_progress,
        }
    }

    /// Real service clients built from the configuration
    fn service_collaborators(&self) -> Result<Collaborators> {
        self.config.require_api_keys()?;
        let translation = &self.config.translation;
        let transcription = &self.config.transcription;
        let speech = &self.config.speech;
        let assembly = &self.config.assembly;

        Ok(Collaborators {
            translator: Arc::new(Anthropic::new(
                &translation.api_key,
                &translation.endpoint,
                &translation.model,
                translation.temperature,
                translation.max_output_tokens,
                Duration::from_secs(translation.timeout_secs),
            )),
            transcriber: Arc::new(OpenAI::new(
                &transcription.api_key,
                &transcription.endpoint,
                &transcription.model,
                Duration::from_secs(transcription.timeout_secs),
            )),
            synthesizer: Arc::new(ElevenLabs::new(
                &speech.api_key,
                &speech.endpoint,
                &speech.model,
                speech.voice_settings(),
                Duration::from_secs(speech.timeout_secs),
            )),
            rasterizer: Arc::new(ScriptRasterizer::new(
                self.config.layout.rasterize_command.clone(),
                Duration::from_secs(assembly.timeout_secs),
            )),
            media: Arc::new(FfmpegTool::new(assembly.fps, Duration::from_secs(assembly.timeout_secs))),
        })
    }

    /// Orchestrator for the course at `course_root`
    pub fn orchestrator(&self, course_root: &Path) -> Result<StageOrchestrator> {
        let collaborators = match &self.collaborators {
            Some(collaborators) => collaborators.clone(),
            None => self.service_collaborators()?,
        };
        let caller = ServiceCaller::new(self.config.retry.policy());
        Ok(StageOrchestrator::new(course_root, collaborators, caller, self.pipeline_options()))
    }

    /// Course root given on the command line, or the configured one
    pub fn course_root(&self, course: Option<PathBuf>) -> Result<PathBuf> {
        let root = course.unwrap_or_else(|| self.config.course_root.clone());
        if !root.is_dir() {
            return Err(anyhow!("Course directory not found: {}", root.display()));
        }
        Ok(root)
    }

    /// Source language from the request, `course.yml`, or the config, in that order
    pub fn source_language(&self, course_root: &Path, requested: Option<String>) -> Result<String> {
        let language = match requested {
            Some(language) => language,
            None => match CourseMetadata::load(course_root)?.original_language {
                Some(language) => {
                    debug!("Using original language '{}' from course.yml", language);
                    language
                }
                None => self.config.source_language.clone(),
            },
        };
        language_utils::validate_language_code(&language)?;
        Ok(language)
    }

    /// Localize the course at `course_root` into every requested language
    pub async fn localize(&self, course_root: &Path, options: LocalizeOptions) -> Result<RunReport> {
        let source_language = self.source_language(course_root, options.source_language)?;
        let target_languages = if options.target_languages.is_empty() {
            self.config.target_languages.clone()
        } else {
            options.target_languages
        };
        if target_languages.is_empty() {
            return Err(anyhow!("No target language given (use --target or set target_languages in the config)"));
        }
        for target in &target_languages {
            if *target == source_language {
                return Err(anyhow!("Target language '{}' is the source language", target));
            }
            if !language_utils::is_supported(target) {
                warn!("'{}' is not in the course language registry, resolving it as an ISO code", target);
            }
        }

        let policy = if options.new_version {
            VersionPolicy::CreateNew
        } else {
            self.config.layout.version_policy()
        };
        let request = LocalizeRequest {
            source_language,
            source_version: options.source_version,
            target_languages,
            policy,
        };

        info!(
            "Localizing {} from {} into {}",
            course_root.display(),
            request.source_language,
            request.target_languages.join(", ")
        );
        let orchestrator = self.orchestrator(course_root)?;
        let report = orchestrator.run(&request).await;
        let (hits, misses, rate) = orchestrator.cache().stats();
        debug!("Translation cache: {} hits, {} misses ({:.1}% hit rate)", hits, misses, rate * 100.0);

        if !report.is_clean() {
            warn!(
                "Finished with {} aborted language(s) and {} failed artifact(s)",
                report.aborted.len(),
                report.languages.iter().map(|l| l.failures.len()).sum::<usize>()
            );
        }
        Ok(report)
    }

    /// Review one language version, the latest one when `version` is `None`
    pub async fn review(&self, course_root: &Path, language: &str, version: Option<Version>) -> Result<ReviewReport> {
        language_utils::validate_language_code(language)?;
        let orchestrator = self.orchestrator(course_root)?;
        let version = self.resolve_version(orchestrator.layout(), language, version)?;
        Ok(orchestrator.review(language, version).await?)
    }

    /// Price the synthesis still pending in one language version
    pub fn estimate_cost(&self, course_root: &Path, language: &str, version: Option<Version>) -> Result<CostEstimate> {
        let layout = CourseLayout::new(course_root, self.config.layout.do_not_translate_marker.clone());
        let version = self.resolve_version(&layout, language, version)?;
        let chapters: Vec<Chapter> = layout.chapters(&layout.version_dir(language, version))?;
        let estimate = estimate_synthesis_cost(&chapters, self.config.speech.price_per_1k_chars)
            .with_context(|| format!("Failed to read transcripts of {} {}", language, version))?;
        Ok(estimate)
    }

    fn resolve_version(&self, layout: &CourseLayout, language: &str, version: Option<Version>) -> Result<Version> {
        match version {
            Some(version) => Ok(version),
            None => layout
                .latest_version(language)?
                .ok_or_else(|| anyhow!("No version found for language '{}' in {}", language, layout.root().display())),
        }
    }
}
