/*!
 * Tests for chapter video assembly
 */

use std::fs;
use std::sync::Arc;

use course_localizer::errors::{MismatchError, PipelineError, ValidationError};
use course_localizer::pipeline::{ArtifactAssembler, AssemblyConfig};
use course_localizer::providers::mock::MockMediaTool;

use crate::common::create_temp_dir;

fn slides_with(dir: &std::path::Path, images: usize, audio: usize) {
    fs::create_dir_all(dir).unwrap();
    for i in 1..=images {
        fs::write(dir.join(format!("{}.png", i)), b"png").unwrap();
    }
    for i in 1..=audio {
        fs::write(dir.join(format!("{}_Rogzy.mp3", i)), b"mp3").unwrap();
        fs::write(dir.join(format!("{}_Rogzy.txt", i)), b"text").unwrap();
    }
}

#[tokio::test]
async fn test_assemble_withGroups_shouldRenderEachGroupAndConcatenate() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("01-intro/slides");
    slides_with(&slides, 5, 5);
    let output = temp.path().join("01-intro/01-intro.mp4");

    let media = Arc::new(MockMediaTool::new(Some(2.0)));
    let config = AssemblyConfig {
        group_size: 2,
        ..AssemblyConfig::default()
    };
    let assembler = ArtifactAssembler::new(media.clone(), config);

    let segments = assembler.assemble(&slides, &output).await.unwrap();

    assert_eq!(segments, 5);
    let renders = media.renders();
    let group_sizes: Vec<usize> = renders.iter().map(|r| r.len()).collect();
    assert_eq!(group_sizes, vec![2, 2, 1]);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "1.png 2.000\n2.png 2.000\n3.png 2.000\n4.png 2.000\n5.png 2.000\n"
    );

    let leftovers: Vec<_> = fs::read_dir(temp.path().join("01-intro"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with('.'))
        .collect();
    assert!(leftovers.is_empty(), "scratch files left behind: {:?}", leftovers);
}

#[tokio::test]
async fn test_assemble_withExtraImage_shouldShareFirstNarration() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("slides");
    slides_with(&slides, 3, 2);
    let output = temp.path().join("chapter.mp4");

    let media = Arc::new(MockMediaTool::new(Some(2.0)).with_duration("1_Rogzy.mp3", 8.0));
    let assembler = ArtifactAssembler::new(media.clone(), AssemblyConfig::default());

    assembler.assemble(&slides, &output).await.unwrap();

    let plan = &media.renders()[0];
    let durations: Vec<f64> = plan.iter().map(|s| s.duration).collect();
    assert_eq!(durations, vec![3.0, 5.0, 2.0]);
    let second = plan[1].audio.as_ref().unwrap();
    assert!(second.path.ends_with("1_Rogzy.mp3"));
    assert_eq!((second.start, second.end), (3.0, 8.0));
}

#[tokio::test]
async fn test_assemble_withShortLeadIn_shouldShowSecondImageSilently() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("slides");
    slides_with(&slides, 2, 1);

    let media = Arc::new(MockMediaTool::new(Some(2.5)));
    let assembler = ArtifactAssembler::new(media.clone(), AssemblyConfig::default());
    assembler.assemble(&slides, &temp.path().join("out.mp4")).await.unwrap();

    let plan = &media.renders()[0];
    assert_eq!(plan[0].duration, 2.5);
    assert!(plan[1].audio.is_none());
    assert_eq!(plan[1].duration, 5.0);
}

#[tokio::test]
async fn test_assemble_withMismatch_shouldFailWithoutOutput() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("slides");
    slides_with(&slides, 4, 7);
    let output = temp.path().join("chapter.mp4");

    let media = Arc::new(MockMediaTool::new(Some(2.0)));
    let assembler = ArtifactAssembler::new(media.clone(), AssemblyConfig::default());

    let result = assembler.assemble(&slides, &output).await;

    assert!(matches!(
        result,
        Err(PipelineError::Mismatch(MismatchError { images: 4, audio: 7 }))
    ));
    assert!(!output.exists());
    assert!(media.renders().is_empty());
}

#[tokio::test]
async fn test_assemble_withEmptySlides_shouldReportEmptyChapter() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("slides");
    fs::create_dir_all(&slides).unwrap();

    let assembler = ArtifactAssembler::new(Arc::new(MockMediaTool::new(Some(2.0))), AssemblyConfig::default());
    let result = assembler.assemble(&slides, &temp.path().join("out.mp4")).await;

    assert!(matches!(
        result,
        Err(PipelineError::Validation(ValidationError::EmptyChapter(_)))
    ));
}

#[tokio::test]
async fn test_assemble_withFailingProbe_shouldUseDefaultDuration() {
    let temp = create_temp_dir().unwrap();
    let slides = temp.path().join("slides");
    slides_with(&slides, 2, 2);

    let media = Arc::new(MockMediaTool::new(None).with_duration("2_Rogzy.mp3", 7.0));
    let assembler = ArtifactAssembler::new(media.clone(), AssemblyConfig::default());
    assembler.assemble(&slides, &temp.path().join("out.mp4")).await.unwrap();

    let durations: Vec<f64> = media.renders()[0].iter().map(|s| s.duration).collect();
    assert_eq!(durations, vec![5.0, 7.0]);
}
