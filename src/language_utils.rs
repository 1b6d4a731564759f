use isolang::Language;

use crate::errors::ValidationError;

/// Language utilities for course language tags
///
/// Course folders are named after short language tags (`fr`, `zh-Hans`).
/// The registry below lists the languages the courses ship in; other ISO
/// 639-1 or 639-3 codes are resolved through `isolang`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("cs", "Czech"),
    ("de", "German"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("vi", "Vietnamese"),
    ("zh-Hans", "Simplified Chinese"),
];

/// Whether a tag is in the course language registry
pub fn is_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES.iter().any(|(c, _)| *c == code.trim())
}

/// Look a code up in the ISO tables
fn iso_language(code: &str) -> Option<Language> {
    let normalized = code.trim().to_lowercase();
    match normalized.len() {
        2 => Language::from_639_1(&normalized),
        3 => Language::from_639_3(&normalized),
        _ => None,
    }
}

/// English name passed to the translator for a language tag
pub fn language_name(code: &str) -> Result<String, ValidationError> {
    let trimmed = code.trim();
    if let Some((_, name)) = SUPPORTED_LANGUAGES.iter().find(|(c, _)| *c == trimmed) {
        return Ok(name.to_string());
    }

    iso_language(trimmed)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| ValidationError::UnknownLanguage(code.to_string()))
}

/// Validate a language tag (registry first, then ISO 639-1/639-3)
pub fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    language_name(code).map(|_| ())
}
