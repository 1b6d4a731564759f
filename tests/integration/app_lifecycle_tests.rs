/*!
 * Controller lifecycle: configuration, localize, review and cost estimate
 */

use std::fs;

use course_localizer::app_config::Config;
use course_localizer::course::Version;
use course_localizer::{Controller, LocalizeOptions};

use crate::common::{copy_dir_all, init_logging, CourseFixture, MockServices};

fn controller(services: &MockServices) -> Controller {
    let mut config = Config::default();
    config.source_language = "es".to_string();
    config.target_languages = vec!["fr".to_string()];
    Controller::with_collaborators(config, services.collaborators()).unwrap()
}

#[tokio::test]
async fn test_localize_withCourseMetadata_shouldUseOriginalLanguage() {
    init_logging();
    let fixture = CourseFixture::standard().unwrap();
    fixture.write_metadata("en").unwrap();
    let services = MockServices::working(2);
    let controller = controller(&services);

    let report = controller.localize(&fixture.root, LocalizeOptions::default()).await.unwrap();

    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.languages.len(), 1);
    assert_eq!(report.languages[0].language, "fr");
    assert!(fixture.path("fr/v001/01-intro/01-intro.mp4").exists());
    assert!(!fixture.path("es").exists());
}

#[tokio::test]
async fn test_localize_withNewVersion_shouldCreateNextTargetVersion() {
    let fixture = CourseFixture::standard().unwrap();
    fixture.write_metadata("en").unwrap();
    let services = MockServices::working(2);
    let controller = controller(&services);
    controller.localize(&fixture.root, LocalizeOptions::default()).await.unwrap();

    let options = LocalizeOptions {
        new_version: true,
        ..LocalizeOptions::default()
    };
    let report = controller.localize(&fixture.root, options).await.unwrap();

    assert_eq!(report.languages[0].version_dir, fixture.path("fr/v002"));
    assert!(fixture.path("fr/v002/02-keys/02-keys.mp4").exists());
    assert!(fixture.path("fr/v001/02-keys/02-keys.mp4").exists());
}

#[tokio::test]
async fn test_localize_withTargetEqualToSource_shouldRefuse() {
    let fixture = CourseFixture::standard().unwrap();
    let services = MockServices::working(2);
    let controller = controller(&services);
    let options = LocalizeOptions {
        source_language: Some("en".to_string()),
        target_languages: vec!["en".to_string()],
        ..LocalizeOptions::default()
    };

    assert!(controller.localize(&fixture.root, options).await.is_err());
    assert_eq!(services.total_calls(), 0);
}

#[tokio::test]
async fn test_estimate_cost_shouldPriceTranscriptsWithoutAudio() {
    let fixture = CourseFixture::standard().unwrap();
    fixture.write_metadata("en").unwrap();
    let services = MockServices::working(2);
    let controller = controller(&services);
    controller.localize(&fixture.root, LocalizeOptions::default()).await.unwrap();

    let complete = controller.estimate_cost(&fixture.root, "fr", None).unwrap();
    assert_eq!(complete.transcripts, 0);

    fs::remove_file(fixture.path("fr/v001/01-intro/slides/1_Rogzy.mp3")).unwrap();
    let estimate = controller.estimate_cost(&fixture.root, "fr", None).unwrap();

    let expected_chars = "[French] Narration of 1_Rogzy.".chars().count();
    assert_eq!(estimate.transcripts, 1);
    assert_eq!(estimate.characters, expected_chars);
    assert!((estimate.cost - expected_chars as f64 / 1000.0 * 0.18).abs() < 1e-9);
}

#[tokio::test]
async fn test_review_throughController_shouldPickLatestVersion() {
    let fixture = CourseFixture::standard().unwrap();
    fixture.write_metadata("en").unwrap();
    let services = MockServices::working(2);
    let controller = controller(&services);
    controller.localize(&fixture.root, LocalizeOptions::default()).await.unwrap();

    copy_dir_all(&fixture.path("fr/v001"), &fixture.path("fr/v002")).unwrap();
    fs::write(fixture.path("fr/v002/01-intro/slides/2_Rogzy.txt"), "Deuxième diapositive.").unwrap();

    let report = controller.review(&fixture.root, "fr", None).await.unwrap();

    assert_eq!(report.audio_synthesized, 1);
    assert_eq!(report.videos_assembled, 1);

    let explicit = controller.review(&fixture.root, "fr", Some(Version::FIRST)).await.unwrap();
    assert_eq!(explicit.audio_synthesized, 0);
}

#[test]
fn test_course_root_withMissingDirectory_shouldFail() {
    let services = MockServices::working(1);
    let controller = controller(&services);
    assert!(controller.course_root(Some("/nonexistent/course".into())).is_err());
}
