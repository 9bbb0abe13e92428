use crate::{cli::Execute, error::RagprepError};
use clap::Parser;
use ragprep_chunk::ChunkConfig;
use ragprep_embedders::EmbedderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the credential for the `remote-api` backend.
pub const OPENAI_KEY_VAR: &str = "OPENAI_KEY";

#[derive(Debug, Parser)]
#[command(name = "ragprep", version = "0.1", about = "Chunk and embed documents", long_about = None)]
pub struct StartArgs {
    /// RUST_LOG string to use as the env filter.
    #[arg(short, long)]
    log: Option<String>,

    /// Path to a JSON file with the chunker and embedder configuration.
    /// Command line flags take precedence over it.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// If using the `remote-api` embedding backend, set its endpoint.
    #[arg(long)]
    openai_endpoint: Option<String>,

    /// Defaults to `demo`.
    #[command(subcommand)]
    pub command: Option<Execute>,
}

/// Implement a getter method on [StartArgs], using the `$var` environment variable as a fallback
/// and either defaulting or returning `None` if neither the argument nor the variable is set.
macro_rules! arg {
    ($id:ident, $var:literal, default $value:expr) => {
        impl StartArgs {
            pub fn $id(&self) -> String {
                match &self.$id {
                    Some(val) => val.to_string(),
                    None => match std::env::var($var) {
                        Ok(val) => val,
                        Err(_) => $value,
                    },
                }
            }
        }
    };
    ($id:ident, $var:literal, optional) => {
        impl StartArgs {
            pub fn $id(&self) -> Option<String> {
                match &self.$id {
                    Some(val) => Some(val.to_string()),
                    None => std::env::var($var).ok(),
                }
            }
        }
    };
}

impl StartArgs {
    /// The API key for the `remote-api` backend. Blank values count as missing.
    pub fn openai_key(&self) -> Option<String> {
        std::env::var(OPENAI_KEY_VAR)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Read the file passed with `--config`, or an empty configuration if none was passed.
    pub fn file_config(&self) -> Result<Config, RagprepError> {
        match &self.config {
            Some(path) => Config::read(path),
            None => Ok(Config::default()),
        }
    }
}

arg!(log,             "RUST_LOG",        default  "info".to_string());
arg!(openai_endpoint, "OPENAI_ENDPOINT", optional);

/// Contents of the `--config` file. Every section is optional.
///
/// ```json
/// {
///   "chunker": { "token": { "maxTokens": 256, "encoding": "cl100k_base" } },
///   "embedder": { "backend": "local-transformer-model", "modelName": "BAAI/bge-small-en-v1.5" }
/// }
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunker: Option<ChunkConfig>,

    #[serde(default)]
    pub embedder: Option<EmbedderConfig>,
}

impl Config {
    pub fn read(path: &Path) -> Result<Self, RagprepError> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}
