/*!
 * Chapter video assembly.
 *
 * Slide images and narration files are ordered by the numeric index at the
 * start of their names and paired by count:
 * - as many images as audio files: one image per narration
 * - one image more than audio files: the first narration is split at the
 *   lead-in mark and shared between the first two images
 * - anything else is a `MismatchError`
 *
 * Rendering happens in groups that are concatenated progressively, so only
 * one group of clips exists at a time.
 */

use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::course::{ArtifactName, SlideIndex};
use crate::errors::{MismatchError, PipelineError, ValidationError};
use crate::file_utils::FileManager;
use crate::providers::{AudioSpan, MediaTool, StillSegment};

/// Image extensions produced by the rasterizer
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Narration audio extension
pub const AUDIO_EXTENSION: &str = "mp3";

/// Assembly tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssemblyConfig {
    /// Display time when an audio file reports no usable duration
    pub default_slide_secs: f64,
    /// Length of the first image when it shares the first narration
    pub lead_in_secs: f64,
    /// Segments rendered per group
    pub group_size: usize,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            default_slide_secs: 5.0,
            lead_in_secs: 3.0,
            group_size: 20,
        }
    }
}

/// Narration file with its probed duration
#[derive(Debug, Clone, PartialEq)]
pub struct Narration {
    pub path: PathBuf,
    /// `None` when probing failed
    pub duration: Option<f64>,
}

/// Ordered images and narration of one chapter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideMedia {
    pub images: Vec<PathBuf>,
    pub audio: Vec<PathBuf>,
}

/// List and order the images and narration in a `slides/` folder
pub fn collect_media(slides_dir: &Path) -> Result<SlideMedia, PipelineError> {
    if !slides_dir.is_dir() {
        return Err(ValidationError::MissingDirectory(slides_dir.display().to_string()).into());
    }

    let images = order_by_index(FileManager::list_files(slides_dir, IMAGE_EXTENSIONS)?)?;
    let audio = order_by_index(FileManager::list_files(slides_dir, &[AUDIO_EXTENSION])?)?;
    Ok(SlideMedia { images, audio })
}

/// Sort paths by their numeric slide index, rejecting names without one
fn order_by_index(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>, ValidationError> {
    let mut indexed: Vec<(SlideIndex, PathBuf)> = Vec::with_capacity(paths.len());
    for path in paths {
        let name = ArtifactName::from_path(&path)?;
        let index = name
            .index()
            .ok_or_else(|| ValidationError::MalformedArtifactName(name.to_string()))?;
        indexed.push((index, path));
    }
    indexed.sort();
    Ok(indexed.into_iter().map(|(_, path)| path).collect())
}

/// Usable display time of a narration
fn effective_duration(narration: &Narration, config: &AssemblyConfig) -> f64 {
    match narration.duration {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => seconds,
        _ => {
            warn!(
                "No duration for {}, showing slide for {}s",
                narration.path.display(),
                config.default_slide_secs
            );
            config.default_slide_secs
        }
    }
}

fn paired(image: &Path, narration: &Narration, config: &AssemblyConfig) -> StillSegment {
    let duration = effective_duration(narration, config);
    StillSegment {
        image: image.to_path_buf(),
        audio: Some(AudioSpan {
            path: narration.path.clone(),
            start: 0.0,
            end: duration,
        }),
        duration,
    }
}

/// Pair ordered images with ordered narration
pub fn plan_segments(
    images: &[PathBuf],
    narration: &[Narration],
    config: &AssemblyConfig,
) -> Result<Vec<StillSegment>, MismatchError> {
    if images.len() == narration.len() {
        return Ok(images
            .iter()
            .zip(narration)
            .map(|(image, audio)| paired(image, audio, config))
            .collect());
    }

    if images.len() == narration.len() + 1 && !narration.is_empty() {
        let first = &narration[0];
        let total = effective_duration(first, config);
        let lead_in = config.lead_in_secs.min(total);

        let mut segments = Vec::with_capacity(images.len());
        segments.push(StillSegment {
            image: images[0].clone(),
            audio: Some(AudioSpan {
                path: first.path.clone(),
                start: 0.0,
                end: lead_in,
            }),
            duration: lead_in,
        });

        let remainder = total - lead_in;
        if remainder > 0.0 {
            segments.push(StillSegment {
                image: images[1].clone(),
                audio: Some(AudioSpan {
                    path: first.path.clone(),
                    start: lead_in,
                    end: total,
                }),
                duration: remainder,
            });
        } else {
            warn!(
                "{} is shorter than the {}s lead-in, showing {} silently",
                first.path.display(),
                config.lead_in_secs,
                images[1].display()
            );
            segments.push(StillSegment {
                image: images[1].clone(),
                audio: None,
                duration: config.default_slide_secs,
            });
        }

        segments.extend(
            images[2..]
                .iter()
                .zip(&narration[1..])
                .map(|(image, audio)| paired(image, audio, config)),
        );
        return Ok(segments);
    }

    Err(MismatchError {
        images: images.len(),
        audio: narration.len(),
    })
}

/// Builds chapter videos through a `MediaTool`
#[derive(Clone)]
pub struct ArtifactAssembler {
    media: Arc<dyn MediaTool>,
    config: AssemblyConfig,
}

impl ArtifactAssembler {
    pub fn new(media: Arc<dyn MediaTool>, config: AssemblyConfig) -> Self {
        Self { media, config }
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// Probe every narration and pair it with the chapter's images
    pub async fn plan(&self, slides_dir: &Path) -> Result<Vec<StillSegment>, PipelineError> {
        let media = collect_media(slides_dir)?;
        if media.images.is_empty() && media.audio.is_empty() {
            return Err(ValidationError::EmptyChapter(slides_dir.display().to_string()).into());
        }

        let mut narration = Vec::with_capacity(media.audio.len());
        for path in media.audio {
            let duration = match self.media.audio_duration(&path).await {
                Ok(seconds) => Some(seconds),
                Err(e) => {
                    debug!("Duration probe failed for {}: {}", path.display(), e);
                    None
                }
            };
            narration.push(Narration { path, duration });
        }

        Ok(plan_segments(&media.images, &narration, &self.config)?)
    }

    /// Render the chapter in `slides_dir` into `output`.
    ///
    /// Groups are rendered into a scratch folder beside `output`, folded into
    /// a running concatenation, and the result is renamed over `output`.
    /// Returns the number of segments rendered.
    pub async fn assemble(&self, slides_dir: &Path, output: &Path) -> Result<usize, PipelineError> {
        let segments = self.plan(slides_dir).await?;
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        FileManager::ensure_dir(parent)?;
        let scratch = tempfile::Builder::new().prefix(".assemble-").tempdir_in(parent)?;

        let group_size = self.config.group_size.max(1);
        let mut combined: Option<PathBuf> = None;
        for (i, group) in segments.chunks(group_size).enumerate() {
            let group_file = scratch.path().join(format!("group_{:03}.mp4", i));
            self.media.render_segments(group, &group_file).await?;

            combined = Some(match combined {
                None => group_file,
                Some(previous) => {
                    let next = scratch.path().join(format!("combined_{:03}.mp4", i));
                    self.media.concat(&[previous.clone(), group_file.clone()], &next).await?;
                    fs::remove_file(&previous)?;
                    fs::remove_file(&group_file)?;
                    next
                }
            });
            debug!("Rendered group {} ({} segments) for {}", i + 1, group.len(), output.display());
        }

        if let Some(result) = combined {
            fs::rename(&result, output)?;
        }
        info!("Assembled {} ({} segments)", output.display(), segments.len());
        Ok(segments.len())
    }
}
