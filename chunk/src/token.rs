use super::ChunkerError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::{debug, info};

const TOKEN_WINDOW_DEFAULT_SIZE: usize = 512;

/// Named byte pair encoding schemes the [Tokenizer] can load.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Cl100kBase,
    P50kBase,
    R50kBase,
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cl100kBase => write!(f, "cl100k_base"),
            Self::P50kBase => write!(f, "p50k_base"),
            Self::R50kBase => write!(f, "r50k_base"),
        }
    }
}

/// A loaded BPE tokenizer.
///
/// Loading builds the whole rank table, so construct it once and reuse it.
/// Clones share the loaded table.
#[derive(Clone)]
pub struct Tokenizer {
    encoding: Encoding,
    bpe: Arc<CoreBPE>,
}

impl Tokenizer {
    pub fn new(encoding: Encoding) -> Result<Self, ChunkerError> {
        info!("Loading {encoding} tokenizer");

        let bpe = match encoding {
            Encoding::Cl100kBase => tiktoken_rs::cl100k_base(),
            Encoding::P50kBase => tiktoken_rs::p50k_base(),
            Encoding::R50kBase => tiktoken_rs::r50k_base(),
        }
        .map_err(|e| ChunkerError::Tokenizer(format!("unable to load {encoding}: {e}")))?;

        Ok(Self {
            encoding,
            bpe: Arc::new(bpe),
        })
    }

    pub fn cl100k_base() -> Result<Self, ChunkerError> {
        Self::new(Encoding::Cl100kBase)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Encode `input` treating special token text as ordinary text.
    pub fn encode(&self, input: &str) -> Vec<usize> {
        self.bpe.encode_ordinary(input)
    }

    /// Errors if the tokens do not form valid UTF-8, which happens
    /// when they end in the middle of a multibyte character.
    pub fn decode(&self, tokens: &[usize]) -> Result<String, ChunkerError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| ChunkerError::Tokenizer(e.to_string()))
    }

    /// Decode `tokens`, replacing invalid UTF-8 with `U+FFFD`.
    pub fn decode_lossy(&self, tokens: &[usize]) -> String {
        String::from_utf8_lossy(&self.bpe._decode_native(tokens)).into_owned()
    }
}

impl std::fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// Chunks text by token count.
///
/// The input is encoded with the `tokenizer`, the tokens are split into
/// consecutive groups of at most `size` tokens and every group is decoded
/// on its own. Chunk boundaries are token boundaries, so a chunk can start
/// or end in the middle of a word.
///
/// A group that would end inside a multibyte character is shortened and
/// its trailing tokens start the next group. When a single character needs
/// more tokens than fit in a group, its pieces are decoded with `U+FFFD`
/// replacement characters.
#[derive(Debug, Clone)]
pub struct TokenWindow {
    size: usize,
    tokenizer: Tokenizer,
}

impl TokenWindow {
    /// Create a new `TokenWindow` chunker.
    /// Errors if `size` is 0.
    pub fn new(size: usize, tokenizer: Tokenizer) -> Result<Self, ChunkerError> {
        if size == 0 {
            return Err(ChunkerError::InvalidArgument(
                "max tokens must be greater than 0".to_string(),
            ));
        }
        Ok(Self { size, tokenizer })
    }

    /// Create a `TokenWindow` of 512 tokens using `cl100k_base`.
    pub fn try_default() -> Result<Self, ChunkerError> {
        Self::new(TOKEN_WINDOW_DEFAULT_SIZE, Tokenizer::cl100k_base()?)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn chunk(&self, input: &str) -> Vec<String> {
        self.split(input).into_iter().map(|(_, s)| s).collect()
    }

    /// The token groups backing each chunk returned by [TokenWindow::chunk].
    pub fn split_tokens(&self, input: &str) -> Vec<Vec<usize>> {
        self.split(input).into_iter().map(|(t, _)| t).collect()
    }

    fn split(&self, input: &str) -> Vec<(Vec<usize>, String)> {
        let tokens = self.tokenizer.encode(input);

        let mut groups = vec![];
        let mut start = 0;

        while start < tokens.len() {
            let max_end = (start + self.size).min(tokens.len());
            let (end, text) = self.decode_prefix(&tokens[start..max_end]);
            groups.push((tokens[start..start + end].to_vec(), text));
            start += end;
        }

        debug!(
            "Chunked {} tokens into {} chunks using {}",
            tokens.len(),
            groups.len(),
            self.tokenizer.encoding()
        );

        groups
    }

    /// Decode the longest prefix of `group` that forms valid text.
    /// If no prefix does, the whole group is decoded lossily.
    fn decode_prefix(&self, group: &[usize]) -> (usize, String) {
        for end in (1..=group.len()).rev() {
            if let Ok(text) = self.tokenizer.decode(&group[..end]) {
                return (end, text);
            }
        }

        debug!(
            "{} token(s) split a multibyte char, decoding with replacement chars",
            group.len()
        );

        (group.len(), self.tokenizer.decode_lossy(group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = "Artificial Intelligence (AI) is transforming industries worldwide. From healthcare to finance, AI applications are revolutionizing how we interact with technology.
    Large Language Models (LLMs) like GPT-4 have shown significant progress in natural language understanding and generation.";

    fn window(size: usize) -> TokenWindow {
        TokenWindow::new(size, Tokenizer::cl100k_base().unwrap()).unwrap()
    }

    #[test]
    fn tokenizer_round_trips() {
        let tokenizer = Tokenizer::cl100k_base().unwrap();
        for input in [INPUT, "", "hello world", "Ünïcödé 日本語 🦀 <|endoftext|>"] {
            let tokens = tokenizer.encode(input);
            assert_eq!(input, tokenizer.decode(&tokens).unwrap());
        }
        assert_eq!(2, tokenizer.encode("hello world").len());
    }

    #[test]
    fn token_window_groups_reproduce_encoding() {
        let tokenizer = Tokenizer::cl100k_base().unwrap();
        let encoded = tokenizer.encode(INPUT);

        for size in [1, 2, 7, 16, 512] {
            let window = window(size);
            let groups = window.split_tokens(INPUT);

            assert!(groups.iter().all(|g| !g.is_empty() && g.len() <= size));
            assert_eq!(encoded, groups.concat());
            assert_eq!(encoded.len().div_ceil(size), groups.len());

            let chunks = window.chunk(INPUT);
            assert_eq!(groups.len(), chunks.len());
        }
    }

    #[test]
    fn token_window_splits_on_token_boundaries() {
        let chunks = window(1).chunk("hello world");

        // The whitespace belongs to the second token, so trimming
        // chunks would not give back the original text.
        assert_eq!(vec!["hello", " world"], chunks);
    }

    #[test]
    fn token_window_default_fits_small_input() {
        let chunks = TokenWindow::try_default().unwrap().chunk(INPUT);
        assert_eq!(vec![INPUT.to_string()], chunks);
    }

    #[test]
    fn token_window_multibyte_boundaries() {
        let input = "Ünïcödé 日本語のテキスト 🦀🦀🦀 crabs everywhere, ĉiuj ŝatas krabojn. ".repeat(8);
        let tokenizer = Tokenizer::cl100k_base().unwrap();

        for size in [8, 13, 32] {
            let window = window(size);
            let groups = window.split_tokens(&input);
            let chunks = window.chunk(&input);

            assert!(groups.iter().all(|g| g.len() <= size));
            assert_eq!(tokenizer.encode(&input), groups.concat());
            assert_eq!(input, chunks.concat());
        }
    }

    #[test]
    fn token_window_single_token_splits_emoji() {
        let input = "I like 🦀";
        let tokenizer = Tokenizer::cl100k_base().unwrap();
        let encoded = tokenizer.encode(input);

        let window = window(1);
        let groups = window.split_tokens(input);
        let chunks = window.chunk(input);

        // The crab needs more than one token, so its pieces cannot be decoded alone
        assert_eq!(encoded, groups.concat());
        assert_eq!(encoded.len(), chunks.len());
        assert_eq!("I", chunks[0]);
        assert!(chunks.iter().any(|c| c.contains('\u{FFFD}')));

        let chunks = TokenWindow::new(4, tokenizer).unwrap().chunk(input);
        assert_eq!(input, chunks.concat());
    }

    #[test]
    fn token_window_empty() {
        assert!(window(4).chunk("").is_empty());
    }

    #[test]
    fn token_window_rejects_zero() {
        let tokenizer = Tokenizer::cl100k_base().unwrap();
        assert!(matches!(
            TokenWindow::new(0, tokenizer.clone()),
            Err(ChunkerError::InvalidArgument(_))
        ));

        let window = TokenWindow::new(3, tokenizer).unwrap();
        assert_eq!(3, window.size());
        assert_eq!(Encoding::Cl100kBase, window.tokenizer().encoding());
    }

    #[test]
    fn encoding_serializes_by_name() {
        let encoding: Encoding = serde_json::from_str("\"p50k_base\"").unwrap();
        assert_eq!(Encoding::P50kBase, encoding);
        assert_eq!("p50k_base", encoding.to_string());
    }
}
