use super::{
    sentence::{SentenceDetector, UnicodeSentences},
    ChunkerError,
};
use tracing::debug;

const PASSAGE_WINDOW_DEFAULT_LIMIT: usize = 400;

/// Packs whole sentences into passages that fit an embedding model's input.
///
/// A passage starts with the next unprocessed sentence and keeps taking
/// sentences while its char count plus the char count of the next
/// sentence stays below `limit`. Sentences are never split, so a single
/// sentence longer than `limit` becomes its own oversized passage.
#[derive(Debug, Clone)]
pub struct PassageWindow {
    limit: usize,
}

impl PassageWindow {
    /// Create a new `PassageWindow` chunker.
    /// Errors if `limit` is 0.
    pub fn new(limit: usize) -> Result<Self, ChunkerError> {
        if limit == 0 {
            return Err(ChunkerError::InvalidArgument(
                "passage limit must be greater than 0".to_string(),
            ));
        }
        Ok(Self { limit })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Chunk using the [UnicodeSentences] detector.
    pub fn chunk(&self, input: &str) -> Vec<String> {
        self.chunk_with(input, &UnicodeSentences)
    }

    pub fn chunk_with<D>(&self, input: &str, detector: &D) -> Vec<String>
    where
        D: SentenceDetector + ?Sized,
    {
        let mut sentences = detector.sentences(input).into_iter().peekable();
        let mut passages = vec![];

        while let Some(first) = sentences.next() {
            let mut passage = first.to_string();
            let mut passage_len = first.chars().count();

            while let Some(next) = sentences.peek() {
                let next_len = next.chars().count();
                if passage_len + next_len >= self.limit {
                    break;
                }
                passage.push(' ');
                passage.push_str(next);
                passage_len += next_len + 1;
                sentences.next();
            }

            passages.push(passage);
        }

        debug!("Packed {} passages", passages.len());

        passages
    }
}

impl Default for PassageWindow {
    fn default() -> Self {
        Self {
            limit: PASSAGE_WINDOW_DEFAULT_LIMIT,
        }
    }
}
