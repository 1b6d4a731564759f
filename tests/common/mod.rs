/*!
 * Common test utilities for the course-localizer test suite
 */

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use course_localizer::pipeline::{Collaborators, PipelineOptions, StageOrchestrator};
use course_localizer::providers::mock::{
    MockMediaTool, MockRasterizer, MockSynthesizer, MockTranscriber, MockTranslator,
};
use course_localizer::translation::{RetryPolicy, ServiceCaller, Sleeper};

/// Route library logs to the test output
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Sleeper that records requested delays without waiting
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.calls.lock().push(duration);
    }
}

/// Caller with the production policy whose delays are only recorded
pub fn instant_caller() -> (ServiceCaller, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::default());
    let caller = ServiceCaller::with_sleeper(RetryPolicy::default(), sleeper.clone());
    (caller, sleeper)
}

/// Write a minimal presentation package; each inner slice is one slide's text runs
pub fn write_presentation(path: &Path, slides: &[&[&str]]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><Types/>"#)?;
    zip.start_file("ppt/presentation.xml", options)?;
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?><p:presentation xmlns:p="p"/>"#)?;

    for (i, runs) in slides.iter().enumerate() {
        let body: String = runs
            .iter()
            .map(|run| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(run)))
            .collect();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree><p:sp><p:txBody>{}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
            body
        );
        zip.start_file(format!("ppt/slides/slide{}.xml", i + 1), options)?;
        zip.write_all(xml.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Temporary course tree `<tmp>/btc101/...`
pub struct CourseFixture {
    _temp: TempDir,
    pub root: PathBuf,
}

impl CourseFixture {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().join("btc101");
        fs::create_dir_all(&root)?;
        Ok(Self { _temp: temp, root })
    }

    /// Chapter folder (with `slides/`) inside `<language>/<version>`
    pub fn chapter(&self, language: &str, version: &str, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(language).join(version).join(name);
        fs::create_dir_all(dir.join("slides"))?;
        Ok(dir)
    }

    /// Chapter document `<chapter>/<chapter>.pptx`
    pub fn add_document(&self, chapter_dir: &Path, slides: &[&[&str]]) -> Result<PathBuf> {
        let name = chapter_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = chapter_dir.join(format!("{}.pptx", name));
        write_presentation(&path, slides)?;
        Ok(path)
    }

    /// Narration recording in the chapter's slides folder
    pub fn add_narration(&self, chapter_dir: &Path, file_name: &str, size: usize) -> Result<PathBuf> {
        let path = chapter_dir.join("slides").join(file_name);
        fs::write(&path, vec![b'a'; size])?;
        Ok(path)
    }

    /// Text file in the chapter's slides folder
    pub fn add_transcript(&self, chapter_dir: &Path, file_name: &str, text: &str) -> Result<PathBuf> {
        let path = chapter_dir.join("slides").join(file_name);
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Path below the course root
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn write_metadata(&self, original_language: &str) -> Result<()> {
        fs::write(
            self.root.join("course.yml"),
            format!("title: Bitcoin 101\noriginal_language: {}\n", original_language),
        )?;
        Ok(())
    }

    /// English `v001` with two chapters and one do-not-translate chapter:
    /// - `01-intro`: two slides, two recordings without transcripts
    /// - `02-keys`: one slide, one recording that already has a transcript
    /// - `03-extra-DNT`: never localized
    pub fn standard() -> Result<Self> {
        let fixture = Self::new()?;

        let intro = fixture.chapter("en", "v001", "01-intro")?;
        fixture.add_document(&intro, &[&["Welcome to Bitcoin", "Bitcoin 101 - EN"], &["Edition V.001"]])?;
        fixture.add_narration(&intro, "1_Rogzy.mp3", 64)?;
        fixture.add_narration(&intro, "2_Rogzy.mp3", 64)?;

        let keys = fixture.chapter("en", "v001", "02-keys")?;
        fixture.add_document(&keys, &[&["Private keys"]])?;
        fixture.add_narration(&keys, "1_Giacomo.mp3", 64)?;
        fixture.add_transcript(&keys, "1_Giacomo.txt", "Keys are secret. Keep them safe.")?;

        let extra = fixture.chapter("en", "v001", "03-extra-DNT")?;
        fixture.add_document(&extra, &[&["Internal notes"]])?;
        fixture.add_narration(&extra, "1_Rogzy.mp3", 64)?;

        Ok(fixture)
    }
}

/// Mock collaborators kept around for assertions
#[derive(Clone)]
pub struct MockServices {
    pub translator: Arc<MockTranslator>,
    pub transcriber: Arc<MockTranscriber>,
    pub synthesizer: Arc<MockSynthesizer>,
    pub rasterizer: Arc<MockRasterizer>,
    pub media: Arc<MockMediaTool>,
}

impl MockServices {
    /// Working mocks; the rasterizer renders `images` slides per document
    pub fn working(images: usize) -> Self {
        Self {
            translator: Arc::new(MockTranslator::working()),
            transcriber: Arc::new(MockTranscriber::working()),
            synthesizer: Arc::new(MockSynthesizer::working()),
            rasterizer: Arc::new(MockRasterizer::working(images)),
            media: Arc::new(MockMediaTool::new(Some(4.0))),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            translator: self.translator.clone(),
            transcriber: self.transcriber.clone(),
            synthesizer: self.synthesizer.clone(),
            rasterizer: self.rasterizer.clone(),
            media: self.media.clone(),
        }
    }

    /// Calls made to every collaborator so far
    pub fn total_calls(&self) -> usize {
        self.translator.request_count()
            + self.transcriber.request_count()
            + self.synthesizer.request_count()
            + self.rasterizer.request_count()
            + self.media.renders().len()
    }
}

/// Pipeline options for tests: no progress bars
pub fn test_options() -> PipelineOptions {
    PipelineOptions {
        show_progress: false,
        max_workers: 4,
        ..PipelineOptions::default()
    }
}

/// Orchestrator over `root` driving `services` with instant retries
pub fn orchestrator(root: &Path, services: &MockServices, options: PipelineOptions) -> StageOrchestrator {
    let (caller, _) = instant_caller();
    StageOrchestrator::new(root, services.collaborators(), caller, options)
}

/// Copy a directory tree, files included
pub fn copy_dir_all(source: &Path, target: &Path) -> Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let destination = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &destination)?;
        } else {
            fs::copy(entry.path(), destination)?;
        }
    }
    Ok(())
}
