/*!
 * Process-backed collaborators: the slide rasterizer script and ffmpeg.
 *
 * Both shell out through `tokio::process` with a timeout; a non-zero exit
 * is reported as a fatal `ServiceError` carrying the filtered stderr.
 */

use async_trait::async_trait;
use log::{debug, error};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use crate::errors::{ServiceError, TransientKind};
use crate::file_utils::FileManager;
use super::{MediaTool, Rasterizer, StillSegment};

/// Run an external program and return its stdout
async fn run_tool(program: &str, args: &[String], timeout: Duration) -> Result<String, ServiceError> {
    debug!("Running {} {}", program, args.join(" "));
    let future = Command::new(program).args(args).kill_on_drop(true).output();

    let output = tokio::select! {
        result = future => {
            result.map_err(|e| ServiceError::fatal(format!("Failed to execute {}: {}", program, e)))?
        },
        _ = tokio::time::sleep(timeout) => {
            return Err(ServiceError::transient(
                TransientKind::Timeout,
                format!("{} timed out after {:?}", program, timeout),
            ));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let filtered = filter_stderr(&stderr);
        error!("{} failed: {}", program, filtered);
        return Err(ServiceError::fatal(format!("{} failed: {}", program, filtered)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Keep the lines of tool stderr that describe the failure
fn filter_stderr(stderr: &str) -> String {
    let relevant: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("error") || lower.contains("invalid") || lower.contains("no such")
        })
        .collect();

    if relevant.is_empty() {
        stderr.lines().last().unwrap_or("").trim().to_string()
    } else {
        relevant.join("; ")
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Renders a presentation by invoking a shell script with the document path
#[derive(Debug, Clone)]
pub struct ScriptRasterizer {
    script: PathBuf,
    timeout: Duration,
}

impl ScriptRasterizer {
    pub fn new(script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Rasterizer for ScriptRasterizer {
    async fn rasterize(&self, document: &Path) -> Result<(), ServiceError> {
        let args = vec![path_arg(&self.script), path_arg(document)];
        run_tool("/bin/bash", &args, self.timeout).await?;
        Ok(())
    }
}

/// `ffmpeg`/`ffprobe` backed media operations
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    fps: u32,
    timeout: Duration,
}

impl FfmpegTool {
    pub fn new(fps: u32, timeout: Duration) -> Self {
        Self { fps, timeout }
    }

    /// Arguments rendering one still image (with or without narration) to a clip
    fn clip_args(&self, segment: &StillSegment, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-y".into(),
            "-loop".into(),
            "1".into(),
            "-framerate".into(),
            self.fps.to_string(),
            "-i".into(),
            path_arg(&segment.image),
        ];

        match &segment.audio {
            Some(span) => {
                args.extend([
                    "-ss".into(),
                    format!("{:.3}", span.start),
                    "-to".into(),
                    format!("{:.3}", span.end),
                    "-i".into(),
                    path_arg(&span.path),
                ]);
            }
            None => {
                args.extend([
                    "-f".into(),
                    "lavfi".into(),
                    "-i".into(),
                    "anullsrc=channel_layout=stereo:sample_rate=44100".into(),
                ]);
            }
        }

        args.extend([
            "-t".into(),
            format!("{:.3}", segment.duration),
            "-vf".into(),
            "scale=trunc(iw/2)*2:trunc(ih/2)*2".into(),
            "-c:v".into(),
            "libx264".into(),
            "-tune".into(),
            "stillimage".into(),
            "-pix_fmt".into(),
            "yuv420p".into(),
            "-r".into(),
            self.fps.to_string(),
            "-c:a".into(),
            "aac".into(),
            "-ar".into(),
            "44100".into(),
            "-ac".into(),
            "2".into(),
            path_arg(output),
        ]);
        args
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn audio_duration(&self, audio: &Path) -> Result<f64, ServiceError> {
        let args = vec![
            "-v".into(),
            "error".into(),
            "-show_entries".into(),
            "format=duration".into(),
            "-of".into(),
            "default=noprint_wrappers=1:nokey=1".into(),
            path_arg(audio),
        ];
        let stdout = run_tool("ffprobe", &args, self.timeout).await?;
        stdout
            .trim()
            .parse::<f64>()
            .map_err(|_| ServiceError::fatal(format!("ffprobe reported no duration for {}", audio.display())))
    }

    async fn split_audio(&self, audio: &Path, segment_secs: f64, out_dir: &Path) -> Result<Vec<PathBuf>, ServiceError> {
        if segment_secs <= 0.0 {
            return Err(ServiceError::fatal("Segment length must be positive"));
        }
        let total = self.audio_duration(audio).await?;
        let stem = audio.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let ext = audio.extension().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "mp3".into());

        let count = (total / segment_secs).ceil().max(1.0) as usize;
        let mut parts = Vec::with_capacity(count);
        for i in 0..count {
            let part = out_dir.join(format!("{}_{}.{}", stem, i, ext));
            let args = vec![
                "-y".into(),
                "-i".into(),
                path_arg(audio),
                "-ss".into(),
                format!("{:.3}", i as f64 * segment_secs),
                "-t".into(),
                format!("{:.3}", segment_secs),
                "-c".into(),
                "copy".into(),
                path_arg(&part),
            ];
            run_tool("ffmpeg", &args, self.timeout).await?;
            parts.push(part);
        }
        Ok(parts)
    }

    async fn render_segments(&self, segments: &[StillSegment], output: &Path) -> Result<(), ServiceError> {
        let parent = output.parent().unwrap_or_else(|| Path::new("."));
        let work = tempfile::Builder::new()
            .prefix(".render-")
            .tempdir_in(parent)
            .map_err(|e| ServiceError::fatal(format!("Cannot create render directory: {}", e)))?;

        let mut clips = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let clip = work.path().join(format!("clip_{:04}.mp4", i));
            run_tool("ffmpeg", &self.clip_args(segment, &clip), self.timeout).await?;
            clips.push(clip);
        }

        self.concat(&clips, output).await
    }

    async fn concat(&self, parts: &[PathBuf], output: &Path) -> Result<(), ServiceError> {
        if parts.is_empty() {
            return Err(ServiceError::fatal("Nothing to concatenate"));
        }

        let listing: String = parts
            .iter()
            .map(|p| format!("file '{}'\n", path_arg(p).replace('\'', r"'\''")))
            .collect();
        let list_file = FileManager::temp_file_beside(output, ".txt")
            .map_err(|e| ServiceError::fatal(format!("Cannot create concat list: {}", e)))?;
        std::fs::write(list_file.path(), listing)
            .map_err(|e| ServiceError::fatal(format!("Cannot write concat list: {}", e)))?;

        let args = vec![
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            path_arg(list_file.path()),
            "-c".into(),
            "copy".into(),
            path_arg(output),
        ];
        run_tool("ffmpeg", &args, self.timeout).await?;
        Ok(())
    }
}
