use crate::{error::EmbeddingError, Embed, EmbeddingModel};
use fastembed::{EmbeddingModel as FastembedModel, ModelInfo};
use ort::execution_providers::CPUExecutionProvider;
#[cfg(feature = "cuda")]
use ort::execution_providers::CUDAExecutionProvider;

pub const DEFAULT_SENTENCE_MODEL: &str = "all-MiniLM-L6-v2";

/// A single fastembed sentence model, loaded once and reused for every call.
pub struct LocalFastEmbedder {
    model: ModelInfo<FastembedModel>,
    embedding: fastembed::TextEmbedding,
}

impl LocalFastEmbedder {
    /// Initialize the embedder with the model matching `model`, downloading
    /// its weights to the fastembed cache if they are not there yet.
    ///
    /// `model` is either a fastembed model code (`Qdrant/all-MiniLM-L6-v2-onnx`)
    /// or the last segment of one without the `-onnx` suffix (`all-MiniLM-L6-v2`).
    pub fn new(model: &str) -> Result<Self, EmbeddingError> {
        tracing::info!("Initializing local Fastembed");
        #[cfg(feature = "cuda")]
        {
            use ort::execution_providers::ExecutionProvider;
            tracing::info!(
                "Using CUDA: {:?}",
                ExecutionProvider::is_available(&CUDAExecutionProvider::default())
            );
        }

        let info = find_model(model).ok_or_else(|| {
            EmbeddingError::InvalidModel(format!("model '{model}' not supported by fastembed"))
        })?;

        tracing::info!("Setting up text embedding model: {}", info.model_code);

        let embedding = fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(info.model.clone())
                .with_execution_providers(vec![
                    #[cfg(feature = "cuda")]
                    CUDAExecutionProvider::default().into(),
                    CPUExecutionProvider::default().into(),
                ])
                .with_show_download_progress(true),
        )?;

        Ok(Self {
            model: info,
            embedding,
        })
    }

    pub fn list_models(&self) -> Vec<EmbeddingModel> {
        list_models()
            .into_iter()
            .map(|m| EmbeddingModel::new(&m.model_code, m.dim))
            .collect()
    }

    pub fn embed(&self, content: &str) -> Result<Vec<f64>, EmbeddingError> {
        if content.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let embeddings = self.embedding.embed(vec![content], None)?;

        debug_assert_eq!(embeddings.len(), 1, "Expected exactly one embedding");

        embeddings
            .into_iter()
            .next()
            .map(|e| e.into_iter().map(|e| e as f64).collect())
            .ok_or_else(|| EmbeddingError::InvalidInput("fastembed returned no embedding".into()))
    }
}

impl Embed for LocalFastEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        LocalFastEmbedder::embed(self, input)
    }

    fn dimensions(&self) -> usize {
        self.model.dim
    }
}

/// The sentence models this embedder accepts.
fn list_models() -> Vec<ModelInfo<FastembedModel>> {
    const MODEL_LIST: &[FastembedModel] = &[
        FastembedModel::AllMiniLML6V2,
        FastembedModel::AllMiniLML12V2,
        FastembedModel::BGESmallENV15,
        FastembedModel::BGEBaseENV15,
        FastembedModel::BGELargeENV15,
    ];

    fastembed::TextEmbedding::list_supported_models()
        .into_iter()
        .filter(|model| MODEL_LIST.contains(&model.model))
        .collect()
}

fn find_model(name: &str) -> Option<ModelInfo<FastembedModel>> {
    let models = list_models();

    if let Some(i) = models.iter().position(|m| m.model_code == name) {
        return models.into_iter().nth(i);
    }

    let short = short_name(name);
    models
        .into_iter()
        .find(|m| short_name(&m.model_code).eq_ignore_ascii_case(short))
}

/// `Qdrant/all-MiniLM-L6-v2-onnx` -> `all-MiniLM-L6-v2`
fn short_name(model_code: &str) -> &str {
    let name = model_code.rsplit('/').next().unwrap_or(model_code);
    name.strip_suffix("-onnx").unwrap_or(name)
}

impl std::fmt::Debug for LocalFastEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalFastEmbedder")
            .field("model", &self.model.model_code)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!("all-MiniLM-L6-v2", short_name("Qdrant/all-MiniLM-L6-v2-onnx"));
        assert_eq!("bge-base-en-v1.5", short_name("Xenova/bge-base-en-v1.5"));
        assert_eq!("bge-small-en-v1.5", short_name("bge-small-en-v1.5"));
    }

    #[test]
    fn finds_models_by_code_and_short_name() {
        let by_short = find_model(DEFAULT_SENTENCE_MODEL).unwrap();
        assert_eq!(FastembedModel::AllMiniLML6V2, by_short.model);
        assert_eq!(384, by_short.dim);

        let by_code = find_model(&by_short.model_code).unwrap();
        assert_eq!(by_short.model, by_code.model);

        assert!(find_model("not-a-model").is_none());
    }

    #[test]
    fn rejects_unknown_model() {
        assert!(matches!(
            LocalFastEmbedder::new("not-a-model"),
            Err(EmbeddingError::InvalidModel(_))
        ));
    }

    #[test]
    #[ignore = "downloads model weights"]
    fn embeds_with_model_dimensions() {
        let embedder = LocalFastEmbedder::new(DEFAULT_SENTENCE_MODEL).unwrap();
        let embedding = embedder
            .embed("Artificial Intelligence (AI) is transforming industries worldwide.")
            .unwrap();

        assert_eq!(384, Embed::dimensions(&embedder));
        assert_eq!(384, embedding.len());
    }
}
