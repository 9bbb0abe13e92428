use error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::{future::Future, str::FromStr};

#[cfg(not(any(feature = "openai", feature = "fe-local", feature = "candle")))]
compile_error!("at least one of `openai`, `fe-local` or `candle` must be enabled");

/// Embedder implementation for BERT models running locally with candle.
#[cfg(feature = "candle")]
pub mod bert;

pub mod error;

/// Embedder implementations for fastembed.
pub mod fastembed;

/// Embedder implementation for the OpenAI embeddings API.
#[cfg(feature = "openai")]
pub mod openai;

/// Implement on types that can produce a fixed length embedding for a text.
pub trait Embed {
    /// Get the vector for `input`. The input can be a user's query,
    /// a chunk of a document or any other non-empty text.
    fn embed(&self, input: &str) -> impl Future<Output = Result<Vec<f64>, EmbeddingError>>;

    /// The length of every vector returned by [Embed::embed].
    fn dimensions(&self) -> usize;
}

/// An embedding model name and the size of its vectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub name: String,
    pub dimensions: usize,
}

impl EmbeddingModel {
    pub fn new(name: &str, dimensions: usize) -> Self {
        Self {
            name: name.to_string(),
            dimensions,
        }
    }
}

/// The recognized embedding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// OpenAI embeddings API. Requires network access and an API key.
    RemoteApi,
    /// Sentence model running locally with fastembed.
    LocalSentenceModel,
    /// BERT model running locally with candle.
    LocalTransformerModel,
}

impl Backend {
    pub const ALL: [Backend; 3] = [
        Self::RemoteApi,
        Self::LocalSentenceModel,
        Self::LocalTransformerModel,
    ];

    /// The model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::RemoteApi => "text-embedding-3-small",
            Self::LocalSentenceModel => "all-MiniLM-L6-v2",
            Self::LocalTransformerModel => "BAAI/bge-base-en-v1.5",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteApi => "remote-api",
            Self::LocalSentenceModel => "local-sentence-model",
            Self::LocalTransformerModel => "local-transformer-model",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Backend {
    type Err = EmbeddingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| {
                EmbeddingError::UnknownBackend(format!(
                    "'{s}', expected one of: remote-api, local-sentence-model, local-transformer-model"
                ))
            })
    }
}

/// Selects an embedding backend and the model it loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedderConfig {
    pub backend: Backend,

    /// Defaults to [Backend::default_model].
    #[serde(default)]
    pub model_name: Option<String>,

    /// Overrides the API endpoint of the `remote-api` backend.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl EmbedderConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            model_name: None,
            endpoint: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    pub fn model_name(&self) -> &str {
        self.model_name
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// A loaded embedding backend.
#[derive(Debug)]
pub enum Embedder {
    #[cfg(feature = "openai")]
    Remote(openai::OpenAiEmbeddings),

    #[cfg(feature = "fe-local")]
    Sentence(crate::fastembed::local::LocalFastEmbedder),

    #[cfg(feature = "candle")]
    Transformer(bert::BertEmbedder),
}

impl Embedder {
    /// Load the backend described by `config`. Local backends download their
    /// model on first use, so this can take a while.
    ///
    /// `api_key` is only used by the `remote-api` backend, which fails with
    /// [EmbeddingError::AuthenticationRequired] if it is missing.
    #[allow(unused_variables)]
    pub fn from_config(
        config: &EmbedderConfig,
        api_key: Option<&str>,
    ) -> Result<Self, EmbeddingError> {
        let model = config.model_name();

        tracing::info!("Loading {} embedder with '{model}'", config.backend);

        match config.backend {
            #[cfg(feature = "openai")]
            Backend::RemoteApi => {
                let key = api_key.ok_or_else(|| {
                    EmbeddingError::AuthenticationRequired(
                        "the remote-api backend needs an API key".to_string(),
                    )
                })?;
                let embedder = match config.endpoint {
                    Some(ref endpoint) => {
                        openai::OpenAiEmbeddings::with_endpoint(endpoint, key, model)?
                    }
                    None => openai::OpenAiEmbeddings::new(key, model)?,
                };
                Ok(Self::Remote(embedder))
            }

            #[cfg(feature = "fe-local")]
            Backend::LocalSentenceModel => Ok(Self::Sentence(
                crate::fastembed::local::LocalFastEmbedder::new(model)?,
            )),

            #[cfg(feature = "candle")]
            Backend::LocalTransformerModel => {
                Ok(Self::Transformer(bert::BertEmbedder::new(model)?))
            }

            #[allow(unreachable_patterns)]
            backend => Err(EmbeddingError::BackendDisabled(format!(
                "{backend} is not enabled in this build"
            ))),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "openai")]
            Self::Remote(_) => Backend::RemoteApi,
            #[cfg(feature = "fe-local")]
            Self::Sentence(_) => Backend::LocalSentenceModel,
            #[cfg(feature = "candle")]
            Self::Transformer(_) => Backend::LocalTransformerModel,
        }
    }
}

impl Embed for Embedder {
    async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        match self {
            #[cfg(feature = "openai")]
            Self::Remote(e) => e.embed(input).await,
            #[cfg(feature = "fe-local")]
            Self::Sentence(e) => e.embed(input),
            #[cfg(feature = "candle")]
            Self::Transformer(e) => e.embed(input),
        }
    }

    fn dimensions(&self) -> usize {
        match self {
            #[cfg(feature = "openai")]
            Self::Remote(e) => Embed::dimensions(e),
            #[cfg(feature = "fe-local")]
            Self::Sentence(e) => Embed::dimensions(e),
            #[cfg(feature = "candle")]
            Self::Transformer(e) => Embed::dimensions(e),
        }
    }
}
