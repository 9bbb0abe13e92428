use crate::{error::EmbeddingError, Embed, EmbeddingModel};
use candle_core::{Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config, DTYPE};
use hf_hub::{api::sync::Api, Repo, RepoType};
use std::path::Path;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

pub const DEFAULT_TRANSFORMER_MODEL: &str = "BAAI/bge-base-en-v1.5";

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Text embedder running a BERT model from the Hugging Face hub with candle.
///
/// The embedding is the last hidden state of the `[CLS]` token, without
/// normalization. Inputs longer than the model's position embeddings are
/// truncated.
pub struct BertEmbedder {
    name: String,
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dimensions: usize,
}

impl BertEmbedder {
    /// Load `model` from the hub, downloading its files to the local
    /// hub cache on first use.
    pub fn new(model: &str) -> Result<Self, EmbeddingError> {
        info!("Fetching {model} from the Hugging Face hub");

        let api = Api::new()?;
        let repo = api.repo(Repo::with_revision(
            model.to_string(),
            RepoType::Model,
            "main".to_string(),
        ));

        let config = repo.get(CONFIG_FILE)?;
        let tokenizer = repo.get(TOKENIZER_FILE)?;
        let weights = repo.get(WEIGHTS_FILE)?;

        Self::from_files(model, &config, &tokenizer, &weights)
    }

    /// Load a model from files already on disk.
    ///
    /// * `config`: The model's `config.json`.
    /// * `tokenizer`: The model's `tokenizer.json`.
    /// * `weights`: The model's `.safetensors` weights.
    pub fn from_files(
        name: &str,
        config: &Path,
        tokenizer: &Path,
        weights: &Path,
    ) -> Result<Self, EmbeddingError> {
        let config: Config = serde_json::from_str(&std::fs::read_to_string(config)?)?;
        let tokenizer = load_tokenizer(tokenizer, config.max_position_embeddings)?;

        // Always CPU, no accelerator features are enabled for candle
        let device = Device::Cpu;

        info!("Loading model weights from {}", weights.display());

        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[weights], DTYPE, &device)? };
        let model = BertModel::load(vb, &config)?;

        debug!("Loaded {name} with {} dimensions", config.hidden_size);

        Ok(Self {
            name: name.to_string(),
            model,
            tokenizer,
            device,
            dimensions: config.hidden_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        if input.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let encoding = self
            .tokenizer
            .encode(input, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let token_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = token_ids.zeros_like()?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;

        let hidden = self
            .model
            .forward(&token_ids, &token_type_ids, Some(&attention_mask))?;

        // (batch, tokens, hidden) -> the first token of the only batch entry
        let cls = hidden.i((0, 0))?.to_vec1::<f32>()?;

        debug!(
            "Embedded {} tokens with {}",
            encoding.get_ids().len(),
            self.name
        );

        Ok(cls.into_iter().map(|e| e as f64).collect())
    }
}

impl Embed for BertEmbedder {
    async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        BertEmbedder::embed(self, input)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

impl std::fmt::Debug for BertEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEmbedder")
            .field("name", &self.name)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

/// Models known to work with this embedder. Any BERT model on the hub with
/// safetensors weights can be loaded, these are only listed for reference.
pub fn list_models() -> Vec<EmbeddingModel> {
    vec![
        EmbeddingModel::new("BAAI/bge-small-en-v1.5", 384),
        EmbeddingModel::new("BAAI/bge-base-en-v1.5", 768),
        EmbeddingModel::new("BAAI/bge-large-en-v1.5", 1024),
        EmbeddingModel::new("sentence-transformers/all-MiniLM-L6-v2", 384),
    ]
}

fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, EmbeddingError> {
    let mut tokenizer =
        Tokenizer::from_file(path).map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

    Ok(tokenizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_files() {
        let missing = Path::new("does/not/exist.json");
        let result = BertEmbedder::from_files("missing", missing, missing, missing);
        assert!(matches!(result, Err(EmbeddingError::Io(_))));
    }

    #[test]
    fn known_models_have_dimensions() {
        let models = list_models();
        let default = models
            .iter()
            .find(|m| m.name == DEFAULT_TRANSFORMER_MODEL)
            .unwrap();
        assert_eq!(768, default.dimensions);
    }

    #[test]
    #[ignore = "downloads model weights"]
    fn embeds_with_model_dimensions() {
        let embedder = BertEmbedder::new(DEFAULT_TRANSFORMER_MODEL).unwrap();
        let embedding = embedder
            .embed("Large Language Models (LLMs) like GPT-4 have shown significant progress.")
            .unwrap();

        assert_eq!(768, Embed::dimensions(&embedder));
        assert_eq!(768, embedding.len());

        let long = "word ".repeat(2000);
        assert_eq!(768, embedder.embed(&long).unwrap().len());
    }
}
