/*!
 * The localization pipeline.
 *
 * `StageOrchestrator` runs the six stages for each target language:
 * 1. translate chapter documents
 * 2. rasterize newly translated documents into slide images
 * 3. transcribe source narration
 * 4. translate transcripts
 * 5. synthesize narration (bounded fan-out)
 * 6. assemble chapter videos
 *
 * Every stage skips artifacts that already exist, so rerunning the pipeline
 * only produces what is missing.
 */

use indicatif::{ProgressBar, ProgressStyle};

pub use self::assembler::{collect_media, plan_segments, ArtifactAssembler, AssemblyConfig, Narration, SlideMedia};
pub use self::cost::{estimate_synthesis_cost, CostEstimate, DEFAULT_PRICE_PER_1K_CHARS};
pub use self::orchestrator::{
    Collaborators, LanguageReport, LocalizeRequest, PipelineOptions, RunReport, StageCounts, StageOrchestrator,
};
pub use self::review::ReviewReport;
pub use self::transcription::{transcript_path, SourceTranscriber, DEFAULT_MAX_UPLOAD_BYTES};
pub use self::worker_pool::BoundedWorkerPool;

pub mod assembler;
pub mod cost;
pub mod orchestrator;
pub mod review;
pub mod transcription;
pub mod worker_pool;

/// Progress bar for one stage, hidden when progress display is off
pub(crate) fn stage_progress(visible: bool, len: usize, unit: &str) -> ProgressBar {
    if !visible || len == 0 {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
        unit
    );
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░");
    bar.set_style(style);
    bar
}
