/*!
 * Rewrite rules applied to slide text runs before generic translation.
 *
 * Language-tag markers such as `Course - EN` and version markers such as
 * `V.002` are rewritten locally; a run that matches either rule never
 * reaches the translation service.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::course::Version;

static VERSION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"V\.\d{3}").expect("version marker pattern is valid")
});

/// Exception rules for one (source, target, version) combination
#[derive(Debug, Clone)]
pub struct ExceptionRules {
    language_marker: Regex,
    target_tag: String,
    target_version: String,
}

impl ExceptionRules {
    /// Build the rules for translating `source_language` into `target_language`
    /// inside `target_version`
    pub fn new(source_language: &str, target_language: &str, target_version: Version) -> Self {
        let pattern = format!(r"(-\s*){}\b", regex::escape(&source_language.to_uppercase()));
        Self {
            language_marker: Regex::new(&pattern).expect("escaped language marker compiles"),
            target_tag: target_language.to_uppercase(),
            target_version: target_version.to_string(),
        }
    }

    /// Rewrite `text` if any rule matches, `None` otherwise
    pub fn apply(&self, text: &str) -> Option<String> {
        let language_hit = self.language_marker.is_match(text);
        let version_hit = VERSION_MARKER.is_match(text);
        if !language_hit && !version_hit {
            return None;
        }

        let mut rewritten = text.to_string();
        if language_hit {
            rewritten = self
                .language_marker
                .replace_all(&rewritten, |caps: &Captures| format!("{}{}", &caps[1], self.target_tag))
                .into_owned();
        }
        if version_hit {
            rewritten = VERSION_MARKER
                .replace_all(&rewritten, self.target_version.as_str())
                .into_owned();
        }
        Some(rewritten)
    }
}
