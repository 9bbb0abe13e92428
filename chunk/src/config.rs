use super::{
    ChunkerError, Encoding, FixedWindow, ParagraphWindow, PassageWindow, SentenceWindow,
    TokenWindow, Tokenizer,
};
use serde::{Deserialize, Serialize};

/// Serializable description of a chunker. Use [Chunker::from_config] to
/// obtain a chunker able to process documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkConfig {
    Fixed(FixedWindowConfig),
    Sentence(SentenceWindowConfig),
    Paragraph,
    Token(TokenWindowConfig),
    Passage(PassageWindowConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedWindowConfig {
    pub size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceWindowConfig {
    pub max_sentences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenWindowConfig {
    pub max_tokens: usize,
    #[serde(default)]
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageWindowConfig {
    pub limit: usize,
}

impl ChunkConfig {
    /// * `size`: Maximum chars per chunk.
    /// * `overlap`: Chars shared between consecutive chunks.
    pub fn fixed(size: usize, overlap: usize) -> Self {
        Self::Fixed(FixedWindowConfig { size, overlap })
    }

    pub fn fixed_default() -> Self {
        let window = FixedWindow::default();
        Self::fixed(window.size(), window.overlap())
    }

    /// * `max_sentences`: Sentences per chunk.
    pub fn sentence(max_sentences: usize) -> Self {
        Self::Sentence(SentenceWindowConfig { max_sentences })
    }

    pub fn sentence_default() -> Self {
        Self::sentence(SentenceWindow::default().size())
    }

    /// * `max_tokens`: Maximum tokens per chunk.
    /// * `encoding`: BPE scheme used to count tokens.
    pub fn token(max_tokens: usize, encoding: Encoding) -> Self {
        Self::Token(TokenWindowConfig {
            max_tokens,
            encoding,
        })
    }

    pub fn token_default() -> Self {
        Self::token(512, Encoding::default())
    }

    /// * `limit`: Char limit a passage of multiple sentences must stay below.
    pub fn passage(limit: usize) -> Self {
        Self::Passage(PassageWindowConfig { limit })
    }

    pub fn passage_default() -> Self {
        Self::passage(PassageWindow::default().limit())
    }
}

impl std::fmt::Display for ChunkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(_) => write!(f, "FixedWindow"),
            Self::Sentence(_) => write!(f, "SentenceWindow"),
            Self::Paragraph => write!(f, "ParagraphWindow"),
            Self::Token(_) => write!(f, "TokenWindow"),
            Self::Passage(_) => write!(f, "PassageWindow"),
        }
    }
}

/// A validated chunker with its collaborators loaded.
#[derive(Debug, Clone)]
pub enum Chunker {
    Fixed(FixedWindow),
    Sentence(SentenceWindow),
    Paragraph(ParagraphWindow),
    Token(TokenWindow),
    Passage(PassageWindow),
}

impl Chunker {
    /// Validate the config and load whatever the chunker needs.
    /// The token chunker loads its tokenizer here, once.
    pub fn from_config(config: &ChunkConfig) -> Result<Self, ChunkerError> {
        Ok(match config {
            ChunkConfig::Fixed(FixedWindowConfig { size, overlap }) => {
                Self::Fixed(FixedWindow::new(*size, *overlap)?)
            }
            ChunkConfig::Sentence(SentenceWindowConfig { max_sentences }) => {
                Self::Sentence(SentenceWindow::new(*max_sentences)?)
            }
            ChunkConfig::Paragraph => Self::Paragraph(ParagraphWindow),
            ChunkConfig::Token(TokenWindowConfig {
                max_tokens,
                encoding,
            }) => Self::Token(TokenWindow::new(*max_tokens, Tokenizer::new(*encoding)?)?),
            ChunkConfig::Passage(PassageWindowConfig { limit }) => {
                Self::Passage(PassageWindow::new(*limit)?)
            }
        })
    }

    pub fn chunk<'a>(&self, input: &'a str) -> ChunkedDocument<'a> {
        match self {
            Self::Fixed(chunker) => ChunkedDocument::Ref(chunker.chunk(input)),
            Self::Sentence(chunker) => ChunkedDocument::Owned(chunker.chunk(input)),
            Self::Paragraph(chunker) => ChunkedDocument::Ref(chunker.chunk(input)),
            Self::Token(chunker) => ChunkedDocument::Owned(chunker.chunk(input)),
            Self::Passage(chunker) => ChunkedDocument::Owned(chunker.chunk(input)),
        }
    }
}

impl std::fmt::Display for Chunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(_) => write!(f, "FixedWindow"),
            Self::Sentence(_) => write!(f, "SentenceWindow"),
            Self::Paragraph(_) => write!(f, "ParagraphWindow"),
            Self::Token(_) => write!(f, "TokenWindow"),
            Self::Passage(_) => write!(f, "PassageWindow"),
        }
    }
}

/// The result of chunking a document.
/// Some chunkers do not allocate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkedDocument<'content> {
    Ref(Vec<&'content str>),
    Owned(Vec<String>),
}

impl<'content> ChunkedDocument<'content> {
    pub fn len(&self) -> usize {
        match self {
            Self::Ref(chunks) => chunks.len(),
            Self::Owned(chunks) => chunks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::Ref(chunks) => Box::new(chunks.iter().copied()),
            Self::Owned(chunks) => Box::new(chunks.iter().map(String::as_str)),
        }
    }

    pub fn into_owned(self) -> Vec<String> {
        match self {
            Self::Ref(chunks) => chunks.into_iter().map(String::from).collect(),
            Self::Owned(chunks) => chunks,
        }
    }
}
