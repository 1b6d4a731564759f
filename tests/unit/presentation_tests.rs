/*!
 * Tests for presentation document translation
 */

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use course_localizer::course::Version;
use course_localizer::providers::mock::{MockBehavior, MockTranslator};
use course_localizer::translation::{
    translate_presentation, ExceptionRules, PresentationDocument, TextTranslator, TokenAwareChunker, TranslationCache,
};

use crate::common::{create_temp_dir, instant_caller, write_presentation};

fn text_translator(mock: Arc<MockTranslator>) -> TextTranslator {
    let (caller, _) = instant_caller();
    TextTranslator::new(mock, TranslationCache::new(), caller, TokenAwareChunker::default())
}

#[test]
fn test_text_runs_shouldBeDistinctAndInSlideOrder() {
    let temp = create_temp_dir().unwrap();
    let path = temp.path().join("deck.pptx");
    write_presentation(&path, &[&["Title", "Shared"], &["Second", "Shared", " "]]).unwrap();

    let document = PresentationDocument::open(&path).unwrap();

    assert_eq!(document.slide_count(), 2);
    assert_eq!(document.text_runs().unwrap(), vec!["Title", "Shared", "Second"]);
}

#[tokio::test]
async fn test_translate_presentation_shouldApplyExceptionRulesBeforeService() {
    let temp = create_temp_dir().unwrap();
    let source = temp.path().join("en.pptx");
    let output = temp.path().join("fr.pptx");
    write_presentation(&source, &[&["Bitcoin 101 - EN", "Welcome & thanks"], &["Edition V.001", "Welcome & thanks"]])
        .unwrap();

    let mock = Arc::new(MockTranslator::working());
    let translator = text_translator(mock.clone());
    let rules = ExceptionRules::new("en", "fr", Version::new(2).unwrap());

    let handled = translate_presentation(&source, &output, &translator, &rules, "French", 1000)
        .await
        .unwrap();

    assert_eq!(handled, 3);
    assert_eq!(mock.requests(), vec!["Welcome & thanks"]);

    let runs = PresentationDocument::open(&output).unwrap().text_runs().unwrap();
    assert_eq!(runs, vec!["Bitcoin 101 - FR", "[French] Welcome & thanks", "Edition v002"]);
}

#[tokio::test]
async fn test_translate_presentation_shouldCopyOtherPartsUnchanged() {
    let temp = create_temp_dir().unwrap();
    let source = temp.path().join("en.pptx");
    let output = temp.path().join("fr.pptx");
    write_presentation(&source, &[&["Hello"]]).unwrap();

    let translator = text_translator(Arc::new(MockTranslator::working()));
    let rules = ExceptionRules::new("en", "fr", Version::FIRST);
    translate_presentation(&source, &output, &translator, &rules, "French", 1000)
        .await
        .unwrap();

    let read_part = |path: &std::path::Path, name: &str| {
        let mut archive = zip::ZipArchive::new(std::fs::File::open(path).unwrap()).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    };
    assert_eq!(
        read_part(&source, "ppt/presentation.xml"),
        read_part(&output, "ppt/presentation.xml")
    );
    assert!(read_part(&output, "ppt/slides/slide1.xml").contains("<a:t>[French] Hello</a:t>"));
}

#[tokio::test]
async fn test_translate_presentation_withFailingService_shouldLeaveNoOutput() {
    let temp = create_temp_dir().unwrap();
    let source = temp.path().join("en.pptx");
    let output = temp.path().join("fr.pptx");
    write_presentation(&source, &[&["Hello"]]).unwrap();

    let translator = text_translator(Arc::new(MockTranslator::new(MockBehavior::Failing)));
    let rules = ExceptionRules::new("en", "fr", Version::FIRST);

    let result = translate_presentation(&source, &output, &translator, &rules, "French", 1000).await;

    assert!(result.is_err());
    assert!(!output.exists());
}

#[test]
fn test_write_translated_withEmptyMap_shouldKeepText() {
    let temp = create_temp_dir().unwrap();
    let source = temp.path().join("en.pptx");
    let output = temp.path().join("copy.pptx");
    write_presentation(&source, &[&["Keep me"]]).unwrap();

    let document = PresentationDocument::open(&source).unwrap();
    document.write_translated(&output, &HashMap::new()).unwrap();

    assert_eq!(PresentationDocument::open(&output).unwrap().text_runs().unwrap(), vec!["Keep me"]);
}
