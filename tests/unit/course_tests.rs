/*!
 * Tests for the course tree model: versions, layout and change detection
 */

use std::fs;

use course_localizer::course::{
    latest_version, next_version, ArtifactName, ChangeDetector, ChangeRecord, CourseLayout, Version, VersionPolicy,
};
use course_localizer::errors::{PipelineError, ValidationError};

use crate::common::{create_temp_dir, CourseFixture};

#[test]
fn test_next_version_shouldIncrementAndPad() {
    assert_eq!(next_version("v004").unwrap().to_string(), "v005");
    assert_eq!(next_version("v099").unwrap().to_string(), "v100");
}

#[test]
fn test_next_version_withLastVersion_shouldOverflow() {
    assert!(matches!(next_version("v999"), Err(ValidationError::VersionOverflow(_))));
}

#[test]
fn test_next_version_withMalformedName_shouldFail() {
    for name in ["v1", "version2", "v0001", "V002", "v000"] {
        assert!(next_version(name).is_err(), "{} should be rejected", name);
    }
}

#[test]
fn test_latest_version_shouldIgnoreNonVersionFolders() {
    let fixture = CourseFixture::new().unwrap();
    for dir in ["fr/v001", "fr/v003", "fr/v002", "fr/drafts", "fr/v04"] {
        fs::create_dir_all(fixture.path(dir)).unwrap();
    }
    fs::write(fixture.path("fr/v009"), b"a file, not a version").unwrap();

    assert_eq!(latest_version(fixture.path("fr")).unwrap(), Some(Version::new(3).unwrap()));
}

#[test]
fn test_resolve_withoutTargetLanguage_shouldCreateFirstVersionSkeleton() {
    let fixture = CourseFixture::standard().unwrap();
    let layout = CourseLayout::new(&fixture.root, "-DNT");

    let path = layout
        .resolve_target_version_path("en", "fr", Version::FIRST, VersionPolicy::ReuseLatest)
        .unwrap();

    assert_eq!(path, fixture.path("fr/v001"));
    assert!(fixture.path("fr/v001/01-intro/slides").is_dir());
    assert!(fixture.path("fr/v001/02-keys/slides").is_dir());
    assert!(!fixture.path("fr/v001/03-extra-DNT").exists());
    assert!(!fixture.path("fr/v001/01-intro/01-intro.pptx").exists());
}

#[test]
fn test_resolve_withExistingTarget_shouldFollowPolicy() {
    let fixture = CourseFixture::standard().unwrap();
    fs::create_dir_all(fixture.path("fr/v001/01-intro")).unwrap();
    fs::create_dir_all(fixture.path("fr/v002/01-intro")).unwrap();
    let layout = CourseLayout::new(&fixture.root, "-DNT");

    let reused = layout
        .resolve_target_version_path("en", "fr", Version::FIRST, VersionPolicy::ReuseLatest)
        .unwrap();
    assert_eq!(reused, fixture.path("fr/v002"));

    let created = layout
        .resolve_target_version_path("en", "fr", Version::FIRST, VersionPolicy::CreateNew)
        .unwrap();
    assert_eq!(created, fixture.path("fr/v003"));
    assert!(fixture.path("fr/v003/02-keys/slides").is_dir());
}

#[test]
fn test_resolve_withMissingSourceVersion_shouldFail() {
    let fixture = CourseFixture::standard().unwrap();
    let layout = CourseLayout::new(&fixture.root, "-DNT");

    let result = layout.resolve_target_version_path("en", "fr", Version::new(7).unwrap(), VersionPolicy::ReuseLatest);

    assert!(matches!(result, Err(PipelineError::Validation(ValidationError::MissingDirectory(_)))));
    assert!(!fixture.path("fr").exists());
}

#[test]
fn test_chapters_shouldSkipDoNotTranslateMarker() {
    let fixture = CourseFixture::standard().unwrap();
    let layout = CourseLayout::new(&fixture.root, "-DNT");

    let chapters = layout.chapters(&fixture.path("en/v001")).unwrap();
    let names: Vec<&str> = chapters.iter().map(|c| c.name.as_str()).collect();

    assert_eq!(names, vec!["01-intro", "02-keys"]);
    assert_eq!(chapters[0].document_path("pptx"), fixture.path("en/v001/01-intro/01-intro.pptx"));
    assert_eq!(chapters[0].video_path(), fixture.path("en/v001/01-intro/01-intro.mp4"));
}

#[test]
fn test_change_detector_shouldCompareWithPreviousVersion() {
    let fixture = CourseFixture::new().unwrap();
    let v1 = fixture.chapter("fr", "v001", "01-intro").unwrap();
    let v2 = fixture.chapter("fr", "v002", "01-intro").unwrap();
    fixture.add_transcript(&v1, "1_Rogzy.txt", "Bonjour.").unwrap();
    fixture.add_transcript(&v1, "2_Rogzy.txt", "Salut.").unwrap();
    let same = fixture.add_transcript(&v2, "1_Rogzy.txt", "Bonjour.").unwrap();
    let edited = fixture.add_transcript(&v2, "2_Rogzy.txt", "Salut tout le monde.").unwrap();
    let added = fixture.add_transcript(&v2, "3_Rogzy.txt", "Nouveau.").unwrap();

    let detector = ChangeDetector::new(&fixture.root);
    assert!(!detector.has_changed(&same).unwrap());
    assert!(detector.has_changed(&edited).unwrap());
    assert_eq!(detector.compare(&added).unwrap(), ChangeRecord::Incomparable);
    assert!(!detector.has_changed(&added).unwrap());
}

#[test]
fn test_change_detector_withFirstVersion_shouldReportUnchanged() {
    let fixture = CourseFixture::new().unwrap();
    let v1 = fixture.chapter("fr", "v001", "01-intro").unwrap();
    let transcript = fixture.add_transcript(&v1, "1_Rogzy.txt", "Bonjour.").unwrap();

    assert!(!ChangeDetector::new(&fixture.root).has_changed(&transcript).unwrap());
}

#[test]
fn test_change_detector_withVersionFolderAboveRoot_shouldStillDetectEdits() {
    let temp = create_temp_dir().unwrap();
    let root = temp.path().join("v001").join("btc");
    let v1 = root.join("en/v001/01-intro/slides");
    let v2 = root.join("en/v002/01-intro/slides");
    fs::create_dir_all(&v1).unwrap();
    fs::create_dir_all(&v2).unwrap();
    fs::write(v1.join("1_Rogzy.txt"), "Hello.").unwrap();
    fs::write(v2.join("1_Rogzy.txt"), "Hello everyone.").unwrap();

    let detector = ChangeDetector::new(&root);

    assert_eq!(detector.compare(v2.join("1_Rogzy.txt")).unwrap(), ChangeRecord::Changed);
}

#[test]
fn test_artifact_name_shouldMapTranscriptToAudio() {
    let name = ArtifactName::parse("03-01_David St-onge.txt").unwrap();
    assert_eq!(name.base, "03-01");
    assert_eq!(name.voice_tag.as_deref(), Some("David St-onge"));
    assert_eq!(name.with_extension("mp3").to_string(), "03-01_David St-onge.mp3");
}
