use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("backend not enabled: {0}")]
    BackendDisabled(String),

    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    #[cfg(feature = "fe-local")]
    #[error("fastembed error: {0}")]
    Fastembed(#[from] fastembed::Error),

    #[cfg(feature = "candle")]
    #[error("candle error: {0}")]
    Candle(#[from] candle_core::Error),

    #[cfg(feature = "candle")]
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[cfg(feature = "candle")]
    #[error("model hub error: {0}")]
    Hub(#[from] hf_hub::api::sync::ApiError),

    #[error("model config: {0}")]
    ModelConfig(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "openai")]
    #[error("http client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[cfg(feature = "openai")]
    #[error(transparent)]
    OpenAi(#[from] crate::openai::OpenAiError),
}
