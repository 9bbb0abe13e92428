use ragprep_chunk::ChunkerError;
use ragprep_embedders::error::EmbeddingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RagprepError {
    #[error("Chunking; {0}")]
    Chunker(#[from] ChunkerError),

    #[error("Embedding; {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Config; {0}")]
    Config(String),
}

/// Coarse classification of a [RagprepError], independent of the component it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A parameter, input or configuration value was rejected.
    InvalidArgument,

    /// A model, tokenizer or remote service could not be loaded or reached.
    CollaboratorUnavailable,

    /// The remote backend has no usable credential.
    AuthenticationRequired,

    /// Reading or writing a local file failed.
    Io,
}

impl RagprepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Chunker(ChunkerError::InvalidArgument(_)) => ErrorKind::InvalidArgument,
            Self::Chunker(ChunkerError::Tokenizer(_)) => ErrorKind::CollaboratorUnavailable,
            Self::Embedding(e) => match e {
                EmbeddingError::InvalidModel(_)
                | EmbeddingError::InvalidInput(_)
                | EmbeddingError::UnknownBackend(_) => ErrorKind::InvalidArgument,
                EmbeddingError::AuthenticationRequired(_) => ErrorKind::AuthenticationRequired,
                EmbeddingError::Io(_) => ErrorKind::Io,
                _ => ErrorKind::CollaboratorUnavailable,
            },
            Self::IO(_) => ErrorKind::Io,
            Self::SerdeJson(_) | Self::Config(_) => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragprep_embedders::Backend;

    #[test]
    fn chunker_error_kinds() {
        let e = RagprepError::from(ChunkerError::InvalidArgument("overlap".to_string()));
        assert_eq!(ErrorKind::InvalidArgument, e.kind());

        let e = RagprepError::from(ChunkerError::Tokenizer("bpe".to_string()));
        assert_eq!(ErrorKind::CollaboratorUnavailable, e.kind());
    }

    #[test]
    fn embedding_error_kinds() {
        let e = RagprepError::from(EmbeddingError::AuthenticationRequired("key".to_string()));
        assert_eq!(ErrorKind::AuthenticationRequired, e.kind());

        let e = RagprepError::from(EmbeddingError::InvalidInput("empty".to_string()));
        assert_eq!(ErrorKind::InvalidArgument, e.kind());

        let e = RagprepError::from(EmbeddingError::BackendDisabled("candle".to_string()));
        assert_eq!(ErrorKind::CollaboratorUnavailable, e.kind());

        let e = RagprepError::from("gpu".parse::<Backend>().unwrap_err());
        assert_eq!(ErrorKind::InvalidArgument, e.kind());
    }

    #[test]
    fn io_and_config_kinds() {
        let e = RagprepError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(ErrorKind::Io, e.kind());

        let e = RagprepError::from(serde_json::from_str::<u8>("nope").unwrap_err());
        assert_eq!(ErrorKind::InvalidArgument, e.kind());

        let e = RagprepError::Config("no strategy".to_string());
        assert_eq!(ErrorKind::InvalidArgument, e.kind());
        assert_eq!("Config; no strategy", e.to_string());
    }
}
