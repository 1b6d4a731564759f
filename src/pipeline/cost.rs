/*!
 * Synthesis cost estimate.
 *
 * Prices the transcripts of a language version that still have no audio,
 * at a flat rate per 1000 characters.
 */

use std::fs;
use std::io;

use crate::course::Chapter;
use crate::file_utils::FileManager;

/// Default synthesis price in dollars per 1000 characters
pub const DEFAULT_PRICE_PER_1K_CHARS: f64 = 0.18;

/// Characters still waiting for synthesis and their price
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEstimate {
    /// Transcripts without audio
    pub transcripts: usize,
    /// Total characters in those transcripts
    pub characters: usize,
    /// Estimated price
    pub cost: f64,
}

/// Price the transcripts of `chapters` that have no sibling audio yet
pub fn estimate_synthesis_cost(chapters: &[Chapter], price_per_1k_chars: f64) -> io::Result<CostEstimate> {
    let mut transcripts = 0;
    let mut characters = 0;

    for chapter in chapters {
        let slides = chapter.slides_dir();
        if !slides.is_dir() {
            continue;
        }
        for transcript in FileManager::list_files(&slides, &["txt"])? {
            if transcript.with_extension("mp3").exists() {
                continue;
            }
            transcripts += 1;
            characters += fs::read_to_string(&transcript)?.chars().count();
        }
    }

    Ok(CostEstimate {
        transcripts,
        characters,
        cost: characters as f64 / 1000.0 * price_per_1k_chars,
    })
}
