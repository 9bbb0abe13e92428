pub mod config;
pub mod fixed;
pub mod paragraph;
pub mod passage;
pub mod sentence;
pub mod token;

pub use config::{ChunkConfig, ChunkedDocument, Chunker};
pub use fixed::FixedWindow;
pub use paragraph::ParagraphWindow;
pub use passage::PassageWindow;
pub use sentence::{SentenceDetector, SentenceWindow, UnicodeSentences};
pub use token::{Encoding, TokenWindow, Tokenizer};

#[derive(Debug, thiserror::Error)]
pub enum ChunkerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The BPE tokenizer could not be loaded or could not decode its own output.
    #[error("tokenizer: {0}")]
    Tokenizer(String),
}
