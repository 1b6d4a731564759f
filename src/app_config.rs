use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::course::VersionPolicy;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::pipeline::AssemblyConfig;
use crate::providers::elevenlabs::VoiceSettings;
use crate::translation::RetryPolicy;

/// Application configuration module
/// This module handles loading, validating and saving `conf.json`.
/// Every field has a default so a partial file is enough.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory holding the courses
    #[serde(default = "default_course_root")]
    pub course_root: PathBuf,

    /// Source language tag, `course.yml` is consulted when empty
    #[serde(default)]
    pub source_language: String,

    /// Target language tags
    #[serde(default)]
    pub target_languages: Vec<String>,

    /// Translation service settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Transcription service settings
    #[serde(default)]
    pub transcription: TranscriptionConfig,

    /// Speech synthesis settings
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Retry loop settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Worker pool settings
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Video assembly settings
    #[serde(default)]
    pub assembly: AssemblySettings,

    /// Course tree conventions
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Service endpoint URL
    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// API key for the service
    #[serde(default)]
    pub api_key: String,

    /// Token budget per transcript chunk
    #[serde(default = "default_max_tokens_transcript")]
    pub max_tokens_transcript: usize,

    /// Token budget per slide text chunk
    #[serde(default = "default_max_tokens_slide")]
    pub max_tokens_slide: usize,

    /// Upper bound on generated tokens per request
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_anthropic_endpoint(),
            model: default_anthropic_model(),
            api_key: String::new(),
            max_tokens_transcript: default_max_tokens_transcript(),
            max_tokens_slide: default_max_tokens_slide(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Transcription service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranscriptionConfig {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_whisper_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: String,

    /// Largest file uploaded in one request, in MB
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: u64,

    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            model: default_whisper_model(),
            api_key: String::new(),
            max_upload_mb: default_max_upload_mb(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SpeechConfig {
    #[serde(default = "default_elevenlabs_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_elevenlabs_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    #[serde(default)]
    pub style: f32,

    #[serde(default = "default_true")]
    pub use_speaker_boost: bool,

    /// Price per 1000 synthesized characters, used for the cost estimate
    #[serde(default = "default_price_per_1k_chars")]
    pub price_per_1k_chars: f64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_elevenlabs_endpoint(),
            model: default_elevenlabs_model(),
            api_key: String::new(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: 0.0,
            use_speaker_boost: true,
            price_per_1k_chars: default_price_per_1k_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SpeechConfig {
    /// Voice parameters sent with every synthesis request
    pub fn voice_settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: self.use_speaker_boost,
        }
    }
}

/// Retry loop configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total attempts per external call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Wait between attempts in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

/// Worker pool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConcurrencyConfig {
    /// Ceiling on concurrently running synthesis units
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

/// Video assembly configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AssemblySettings {
    /// Display time of a slide whose audio reports no duration
    #[serde(default = "default_slide_secs")]
    pub default_slide_secs: f64,

    /// Length of the first slide when it shares the first narration
    #[serde(default = "default_lead_in_secs")]
    pub lead_in_secs: f64,

    /// Segments rendered per group
    #[serde(default = "default_group_size")]
    pub group_size: usize,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Timeout for one media tool invocation in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            default_slide_secs: default_slide_secs(),
            lead_in_secs: default_lead_in_secs(),
            group_size: default_group_size(),
            fps: default_fps(),
            timeout_secs: default_media_timeout_secs(),
        }
    }
}

impl AssemblySettings {
    pub fn assembly_config(&self) -> AssemblyConfig {
        AssemblyConfig {
            default_slide_secs: self.default_slide_secs,
            lead_in_secs: self.lead_in_secs,
            group_size: self.group_size,
        }
    }
}

/// Course tree conventions
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LayoutConfig {
    /// Chapters whose name contains this marker are skipped
    #[serde(default = "default_do_not_translate_marker")]
    pub do_not_translate_marker: String,

    /// Extension of chapter presentation documents
    #[serde(default = "default_document_ext")]
    pub document_ext: String,

    /// Script turning a presentation into slide images
    #[serde(default = "default_rasterize_command")]
    pub rasterize_command: PathBuf,

    /// Whether a target language gets a fresh version on every run
    #[serde(default)]
    pub create_new_version: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            do_not_translate_marker: default_do_not_translate_marker(),
            document_ext: default_document_ext(),
            rasterize_command: default_rasterize_command(),
            create_new_version: false,
        }
    }
}

impl LayoutConfig {
    pub fn version_policy(&self) -> VersionPolicy {
        if self.create_new_version {
            VersionPolicy::CreateNew
        } else {
            VersionPolicy::ReuseLatest
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_course_root() -> PathBuf {
    PathBuf::from("courses")
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-sonnet-20240620".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_elevenlabs_endpoint() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_elevenlabs_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_max_tokens_transcript() -> usize {
    1750
}

fn default_max_tokens_slide() -> usize {
    1000
}

fn default_max_output_tokens() -> u32 {
    5000
}

fn default_temperature() -> f32 {
    0.2
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_transcription_timeout_secs() -> u64 {
    600
}

fn default_max_upload_mb() -> u64 {
    20
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.8
}

fn default_true() -> bool {
    true
}

fn default_price_per_1k_chars() -> f64 {
    0.18
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_max_workers() -> usize {
    15
}

fn default_slide_secs() -> f64 {
    5.0
}

fn default_lead_in_secs() -> f64 {
    3.0
}

fn default_group_size() -> usize {
    20
}

fn default_fps() -> u32 {
    24
}

fn default_media_timeout_secs() -> u64 {
    600
}

fn default_do_not_translate_marker() -> String {
    "-DNT".to_string()
}

fn default_document_ext() -> String {
    "pptx".to_string()
}

fn default_rasterize_command() -> PathBuf {
    PathBuf::from("pptx_2_png.sh")
}

impl Config {
    /// Load `path`, or write and return the defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<(Self, bool)> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok((config, false));
        }

        let config = Config::default();
        config.save(path)?;
        Ok((config, true))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        FileManager::write_atomic(path.as_ref(), json.as_bytes())
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))
    }

    /// Fill empty API keys from the given secret lookup.
    ///
    /// The binary passes the process environment; keys already present in
    /// the file win.
    pub fn with_secrets<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut String, name: &str| {
            if slot.is_empty() {
                if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                    *slot = value;
                }
            }
        };
        fill(&mut self.translation.api_key, "API_KEY_ANTHROPIC");
        fill(&mut self.transcription.api_key, "API_KEY_OPENAI");
        fill(&mut self.speech.api_key, "ELEVENLABS_API_KEY");
        self
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.source_language.is_empty() {
            language_utils::validate_language_code(&self.source_language)?;
        }
        for target in &self.target_languages {
            language_utils::validate_language_code(target)?;
            if *target == self.source_language {
                return Err(anyhow!("Target language '{}' is the source language", target));
            }
        }

        if self.retry.max_retries == 0 {
            return Err(anyhow!("retry.max_retries must be at least 1"));
        }
        if self.concurrency.max_workers == 0 {
            return Err(anyhow!("concurrency.max_workers must be at least 1"));
        }
        if self.assembly.group_size == 0 {
            return Err(anyhow!("assembly.group_size must be at least 1"));
        }
        if self.translation.max_tokens_transcript == 0 || self.translation.max_tokens_slide == 0 {
            return Err(anyhow!("Token budgets must be positive"));
        }
        Ok(())
    }

    /// Check the keys needed by the real collaborators
    pub fn require_api_keys(&self) -> Result<()> {
        if self.translation.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required (translation.api_key or API_KEY_ANTHROPIC)"));
        }
        if self.transcription.api_key.is_empty() {
            return Err(anyhow!("Transcription API key is required (transcription.api_key or API_KEY_OPENAI)"));
        }
        if self.speech.api_key.is_empty() {
            return Err(anyhow!("Speech API key is required (speech.api_key or ELEVENLABS_API_KEY)"));
        }
        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            course_root: default_course_root(),
            source_language: "en".to_string(),
            target_languages: Vec::new(),
            translation: TranslationConfig::default(),
            transcription: TranscriptionConfig::default(),
            speech: SpeechConfig::default(),
            retry: RetryConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            assembly: AssemblySettings::default(),
            layout: LayoutConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
