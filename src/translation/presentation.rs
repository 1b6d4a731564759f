/*!
 * Presentation document translation.
 *
 * Chapter documents are Office Open XML presentations: zip packages whose
 * slide parts (`ppt/slides/slide<N>.xml`) hold the visible text in `<a:t>`
 * runs. Runs are collected, translated (exception rules first, then the
 * cached translator) and written back into a copy of the package. Every
 * other part is copied through untouched.
 */

use log::{debug, info};
use quick_xml::events::{BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::errors::TranslationError;
use crate::file_utils::FileManager;
use super::chunker::ChunkMode;
use super::core::TextTranslator;
use super::exceptions::ExceptionRules;

/// Element holding slide text
const TEXT_RUN: &[u8] = b"a:t";

/// Folder of slide parts inside the package
const SLIDES_PREFIX: &str = "ppt/slides/slide";

fn document_error(context: &str, error: impl std::fmt::Display) -> TranslationError {
    TranslationError::Document(format!("{}: {}", context, error))
}

/// One entry of the zip package
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: zip::DateTime,
    unix_mode: Option<u32>,
    is_dir: bool,
}

impl PackageEntry {
    /// Slide number of a `ppt/slides/slide<N>.xml` part
    fn slide_number(&self) -> Option<u32> {
        self.name
            .strip_prefix(SLIDES_PREFIX)?
            .strip_suffix(".xml")?
            .parse()
            .ok()
    }
}

/// An opened presentation package
pub struct PresentationDocument {
    path: PathBuf,
    entries: Vec<PackageEntry>,
}

impl PresentationDocument {
    /// Read the package at `path`
    pub fn open(path: &Path) -> Result<Self, TranslationError> {
        let file = File::open(path).map_err(|e| document_error(&format!("open {}", path.display()), e))?;
        let mut zip = ZipArchive::new(file).map_err(|e| document_error("read zip", e))?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).map_err(|e| document_error("zip entry", e))?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).map_err(|e| document_error("read zip entry", e))?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Slide parts ordered by slide number
    fn slides(&self) -> Vec<&PackageEntry> {
        let mut slides: Vec<(u32, &PackageEntry)> = self
            .entries
            .iter()
            .filter_map(|e| e.slide_number().map(|n| (n, e)))
            .collect();
        slides.sort_by_key(|(n, _)| *n);
        slides.into_iter().map(|(_, e)| e).collect()
    }

    /// Number of slides in the package
    pub fn slide_count(&self) -> usize {
        self.slides().len()
    }

    /// Distinct non-blank text runs, in slide order
    pub fn text_runs(&self) -> Result<Vec<String>, TranslationError> {
        let mut runs = Vec::new();
        for slide in self.slides() {
            for run in collect_runs(&slide.data).map_err(|e| document_error(&slide.name, e))? {
                if !run.trim().is_empty() && !runs.contains(&run) {
                    runs.push(run);
                }
            }
        }
        Ok(runs)
    }

    /// Write a copy of the package to `output` with every run found in
    /// `translations` replaced.
    ///
    /// The package is written to a temporary file beside `output` and
    /// renamed into place once complete.
    pub fn write_translated(&self, output: &Path, translations: &HashMap<String, String>) -> Result<(), TranslationError> {
        let temp = FileManager::temp_file_beside(output, ".pptx").map_err(|e| document_error("create temp file", e))?;

        {
            let mut zout = ZipWriter::new(temp.as_file());
            for entry in &self.entries {
                let mut opts = SimpleFileOptions::default()
                    .compression_method(entry.compression)
                    .last_modified_time(entry.last_modified);
                if let Some(mode) = entry.unix_mode {
                    opts = opts.unix_permissions(mode);
                }

                if entry.is_dir || entry.name.ends_with('/') {
                    zout.add_directory(entry.name.as_str(), opts)
                        .map_err(|e| document_error(&entry.name, e))?;
                    continue;
                }

                let data = if entry.slide_number().is_some() {
                    rewrite_runs(&entry.data, translations).map_err(|e| document_error(&entry.name, e))?
                } else {
                    entry.data.clone()
                };
                zout.start_file(entry.name.as_str(), opts)
                    .map_err(|e| document_error(&entry.name, e))?;
                zout.write_all(&data).map_err(|e| document_error(&entry.name, e))?;
            }
            zout.finish().map_err(|e| document_error("finish zip", e))?;
        }

        temp.as_file().sync_all().map_err(|e| document_error("sync", e))?;
        temp.persist(output).map_err(|e| document_error("persist", e.error))?;
        debug!("Wrote {} from {}", output.display(), self.path.display());
        Ok(())
    }
}

/// Texts of the `<a:t>` elements of one slide part
fn collect_runs(xml: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);

    let mut runs = Vec::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(s) if s.name().as_ref() == TEXT_RUN => current = Some(String::new()),
            Event::Text(t) => {
                if let Some(run) = current.as_mut() {
                    run.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(t) => {
                if let Some(run) = current.as_mut() {
                    run.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(e) if e.name().as_ref() == TEXT_RUN => {
                if let Some(run) = current.take() {
                    runs.push(run);
                }
            }
            _ => {}
        }
    }
    Ok(runs)
}

/// Copy a slide part, replacing the content of translated `<a:t>` runs
fn rewrite_runs(xml: &[u8], translations: &HashMap<String, String>) -> Result<Vec<u8>, String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    let mut current: Option<String> = None;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|e| e.to_string())?;
        match event {
            Event::Eof => break,
            Event::Start(ref s) if s.name().as_ref() == TEXT_RUN => {
                current = Some(String::new());
                writer.write_event(event.borrow()).map_err(|e| e.to_string())?;
            }
            Event::Text(ref t) if current.is_some() => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                if let Some(run) = current.as_mut() {
                    run.push_str(&text);
                }
            }
            Event::CData(ref t) if current.is_some() => {
                let text = String::from_utf8_lossy(t).to_string();
                if let Some(run) = current.as_mut() {
                    run.push_str(&text);
                }
            }
            Event::End(ref e) if e.name().as_ref() == TEXT_RUN => {
                if let Some(run) = current.take() {
                    let replacement = translations.get(&run).map(String::as_str).unwrap_or(&run);
                    writer
                        .write_event(Event::Text(BytesText::new(replacement)))
                        .map_err(|e| e.to_string())?;
                }
                writer.write_event(event.borrow()).map_err(|e| e.to_string())?;
            }
            other => {
                writer.write_event(other).map_err(|e| e.to_string())?;
            }
        }
    }
    Ok(writer.into_inner())
}

/// Translate the presentation at `source` into `output`.
///
/// Runs matching an exception rule are rewritten locally; the others go
/// through `translator` in paragraph mode. Returns the number of distinct
/// runs handled.
pub async fn translate_presentation(
    source: &Path,
    output: &Path,
    translator: &TextTranslator,
    rules: &ExceptionRules,
    target_language_name: &str,
    max_tokens: usize,
) -> Result<usize, TranslationError> {
    let document = PresentationDocument::open(source)?;
    let runs = document.text_runs()?;

    let mut translations = HashMap::with_capacity(runs.len());
    for run in &runs {
        let translated = match rules.apply(run) {
            Some(rewritten) => rewritten,
            None => {
                translator
                    .translate_text(run, target_language_name, max_tokens, ChunkMode::Paragraph)
                    .await?
            }
        };
        translations.insert(run.clone(), translated);
    }

    document.write_translated(output, &translations)?;
    info!(
        "Translated {} ({} slides, {} text runs) into {}",
        source.display(),
        document.slide_count(),
        runs.len(),
        target_language_name
    );
    Ok(runs.len())
}
