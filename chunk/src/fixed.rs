use super::ChunkerError;
use tracing::debug;

const FIXED_WINDOW_DEFAULT_SIZE: usize = 512;
const FIXED_WINDOW_DEFAULT_OVERLAP: usize = 256;

/// The most basic of chunkers.
///
/// `size` is the maximum amount of characters in every chunk and
/// `overlap` is the amount of characters each chunk shares with
/// the one before it.
///
/// Both are measured in chars, not bytes or tokens, so chunk sizes
/// are not comparable to the ones of [TokenWindow][crate::TokenWindow].
#[derive(Debug, Clone)]
pub struct FixedWindow {
    size: usize,
    overlap: usize,
}

impl FixedWindow {
    /// Create a new `FixedWindow` chunker.
    /// Errors if `size` is 0 or `overlap` is not less than `size`.
    pub fn new(size: usize, overlap: usize) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::InvalidArgument(
                "size must be greater than 0".to_string(),
            ));
        }
        if overlap >= size {
            return Err(ChunkerError::InvalidArgument(format!(
                "overlap ({overlap}) must be less than size ({size})"
            )));
        }
        Ok(Self { size, overlap })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// The amount of chars between the starts of two consecutive chunks.
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }
}

impl Default for FixedWindow {
    fn default() -> Self {
        Self {
            size: FIXED_WINDOW_DEFAULT_SIZE,
            overlap: FIXED_WINDOW_DEFAULT_OVERLAP,
        }
    }
}

impl FixedWindow {
    pub fn chunk<'a>(&self, input: &'a str) -> Vec<&'a str> {
        if input.is_empty() {
            return vec![];
        }

        // Byte offset of every char, plus the end of input
        let bounds = input
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(input.len()))
            .collect::<Vec<_>>();

        let char_count = bounds.len() - 1;
        let step = self.step();

        let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
        let mut start = 0;

        while start < char_count {
            let end = (start + self.size).min(char_count);
            chunks.push(&input[bounds[start]..bounds[end]]);
            start += step;
        }

        debug!(
            "Chunked {} chunks, avg chunk size: {}",
            chunks.len(),
            chunks.iter().fold(0, |acc, el| acc + el.len()) / chunks.len()
        );

        chunks
    }
}
