use super::ChunkerError;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

const SENTENCE_WINDOW_DEFAULT_SIZE: usize = 3;

/// Implement on types that can split text into sentences.
///
/// Implementations must return the sentences in document order and must
/// not return empty or whitespace only sentences.
pub trait SentenceDetector {
    fn sentences<'a>(&self, input: &'a str) -> Vec<&'a str>;
}

/// Sentence detector based on the Unicode sentence boundary rules (UAX #29).
///
/// A full stop followed by whitespace and a lowercase letter is not treated
/// as a boundary, so common abbreviations (e.g., i.e.) stay in one sentence.
/// Abbreviations followed by an uppercase letter (Dr. Smith) will split.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSentences;

impl SentenceDetector for UnicodeSentences {
    fn sentences<'a>(&self, input: &'a str) -> Vec<&'a str> {
        input
            .split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Groups consecutive sentences into chunks.
///
/// `size` is the amount of sentences in every chunk, only the last one
/// can have less. The sentences of a chunk are joined with a single space.
#[derive(Debug, Clone)]
pub struct SentenceWindow {
    size: usize,
}

impl SentenceWindow {
    /// Create a new `SentenceWindow` chunker.
    /// Errors if `size` is 0.
    pub fn new(size: usize) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::InvalidArgument(
                "max sentences must be greater than 0".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Chunk using the [UnicodeSentences] detector.
    pub fn chunk(&self, input: &str) -> Vec<String> {
        self.chunk_with(input, &UnicodeSentences)
    }

    pub fn chunk_with<D>(&self, input: &str, detector: &D) -> Vec<String>
    where
        D: SentenceDetector + ?Sized,
    {
        let sentences = detector.sentences(input);

        let chunks = sentences
            .chunks(self.size)
            .map(|batch| batch.join(" "))
            .collect::<Vec<_>>();

        debug!(
            "Grouped {} sentences into {} chunks",
            sentences.len(),
            chunks.len()
        );

        chunks
    }
}

impl Default for SentenceWindow {
    fn default() -> Self {
        Self {
            size: SENTENCE_WINDOW_DEFAULT_SIZE,
        }
    }
}
