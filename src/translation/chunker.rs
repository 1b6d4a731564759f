/*!
 * Token-aware text chunking.
 *
 * Long text is split on paragraph or sentence boundaries into pieces whose
 * token count stays under a budget before it is sent to a text service.
 * Units are never cut in half: a single unit larger than the budget becomes
 * its own oversized chunk.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.\s+").expect("sentence boundary pattern is valid")
});

/// Counts tokens in a string
pub trait Tokenizer: Send + Sync {
    /// Number of tokens `text` encodes to
    fn count_tokens(&self, text: &str) -> usize;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn count_tokens(&self, text: &str) -> usize {
        self(text)
    }
}

/// Rough estimate of ~4 characters per token
#[derive(Debug, Default, Clone, Copy)]
pub struct EstimatingTokenizer;

impl Tokenizer for EstimatingTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

/// Unit of accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkMode {
    /// Line-delimited paragraphs, joined with a newline (slide text)
    Paragraph,
    /// Sentences ending at a `. ` boundary, joined with a space (narration)
    Sentence,
}

impl ChunkMode {
    /// Separator placed between units of a chunk and between chunks
    pub fn separator(&self) -> &'static str {
        match self {
            Self::Paragraph => "\n",
            Self::Sentence => " ",
        }
    }

    /// Split text into units; sentence units keep their terminating period
    fn units<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Self::Paragraph => text.lines().collect(),
            Self::Sentence => {
                let mut units = Vec::new();
                let mut start = 0;
                for boundary in SENTENCE_BOUNDARY.find_iter(text) {
                    units.push(&text[start..boundary.start() + 1]);
                    start = boundary.end();
                }
                if start < text.len() {
                    units.push(&text[start..]);
                }
                units
            }
        }
    }
}

/// Greedy, boundary-preserving chunker
#[derive(Clone)]
pub struct TokenAwareChunker {
    tokenizer: Arc<dyn Tokenizer>,
}

impl TokenAwareChunker {
    /// Create a chunker over the given tokenizer
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// Split `text` into chunks of at most `max_tokens` tokens.
    ///
    /// Units are appended while `tokens(current) + tokens(unit) <= max_tokens`.
    /// Chunks are trimmed and empty chunks are dropped, so joining the result
    /// with `mode.separator()` reproduces the text up to whitespace at chunk
    /// boundaries.
    pub fn split_into_chunks(&self, text: &str, max_tokens: usize, mode: ChunkMode) -> Vec<String> {
        let separator = mode.separator();
        let mut chunks = Vec::new();
        let mut current = String::new();

        for unit in mode.units(text) {
            if current.is_empty() {
                current.push_str(unit);
                continue;
            }

            let fits = self.tokenizer.count_tokens(&current) + self.tokenizer.count_tokens(unit) <= max_tokens;
            if fits {
                current.push_str(separator);
                current.push_str(unit);
            } else {
                push_chunk(&mut chunks, &current);
                current.clear();
                current.push_str(unit);
            }
        }
        push_chunk(&mut chunks, &current);

        chunks
    }

    /// Token count of a string under this chunker's tokenizer
    pub fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer.count_tokens(text)
    }
}

impl Default for TokenAwareChunker {
    fn default() -> Self {
        Self::new(Arc::new(EstimatingTokenizer))
    }
}

fn push_chunk(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
