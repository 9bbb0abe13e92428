use crate::{
    config::{Config, StartArgs},
    demo,
    error::RagprepError,
};
use clap::{Args, Subcommand, ValueEnum};
use ragprep_chunk::{ChunkConfig, Chunker};
use ragprep_embedders::{Backend, Embed, Embedder, EmbedderConfig};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum Execute {
    /// Print the output of every chunking strategy for the sample document,
    /// followed by its embeddings from the local backends.
    Demo(DemoArgs),

    /// Chunk a document.
    Chunk(ChunkArgs),

    /// Embed the start of a document.
    Embed(EmbedArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DemoArgs {
    /// Also embed with the `remote-api` backend. Requires OPENAI_KEY.
    #[arg(long, action)]
    pub remote: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    Fixed,
    Sentence,
    Paragraph,
    Token,
    Passage,
}

impl Strategy {
    fn default_config(self) -> ChunkConfig {
        match self {
            Self::Fixed => ChunkConfig::fixed_default(),
            Self::Sentence => ChunkConfig::sentence_default(),
            Self::Paragraph => ChunkConfig::Paragraph,
            Self::Token => ChunkConfig::token_default(),
            Self::Passage => ChunkConfig::passage_default(),
        }
    }

    fn matches(self, config: &ChunkConfig) -> bool {
        matches!(
            (self, config),
            (Self::Fixed, ChunkConfig::Fixed(_))
                | (Self::Sentence, ChunkConfig::Sentence(_))
                | (Self::Paragraph, ChunkConfig::Paragraph)
                | (Self::Token, ChunkConfig::Token(_))
                | (Self::Passage, ChunkConfig::Passage(_))
        )
    }
}

#[derive(Debug, Args, Default, Clone)]
pub struct ChunkArgs {
    /// Chunking strategy. Falls back to the `chunker` of the config file.
    #[arg(long, short, value_enum)]
    pub strategy: Option<Strategy>,

    /// Fixed: maximum chars per chunk.
    #[arg(long)]
    pub size: Option<usize>,

    /// Fixed: chars shared by consecutive chunks.
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Sentence: sentences per chunk.
    #[arg(long)]
    pub max_sentences: Option<usize>,

    /// Token: maximum tokens per chunk.
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Passage: char limit of a passage.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Document to chunk. Defaults to the sample document.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// If given, writes the chunks as a JSON array to the path.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

impl ChunkArgs {
    /// Resolve the chunker configuration. Flags override the values from `file`,
    /// which is only used when it configures the same strategy.
    pub fn chunk_config(&self, file: Option<&ChunkConfig>) -> Result<ChunkConfig, RagprepError> {
        let base = match (self.strategy, file) {
            (Some(strategy), Some(config)) if strategy.matches(config) => config.clone(),
            (Some(strategy), _) => strategy.default_config(),
            (None, Some(config)) => config.clone(),
            (None, None) => {
                return Err(RagprepError::Config(
                    "no chunking strategy; pass --strategy or set `chunker` in the config file"
                        .to_string(),
                ))
            }
        };

        let config = match base {
            ChunkConfig::Fixed(c) => ChunkConfig::fixed(
                self.size.unwrap_or(c.size),
                self.overlap.unwrap_or(c.overlap),
            ),
            ChunkConfig::Sentence(c) => {
                ChunkConfig::sentence(self.max_sentences.unwrap_or(c.max_sentences))
            }
            ChunkConfig::Paragraph => ChunkConfig::Paragraph,
            ChunkConfig::Token(c) => {
                ChunkConfig::token(self.max_tokens.unwrap_or(c.max_tokens), c.encoding)
            }
            ChunkConfig::Passage(c) => ChunkConfig::passage(self.limit.unwrap_or(c.limit)),
        };

        for (flag, used) in self.flags() {
            if used && !flag_applies(flag, &config) {
                warn!("--{flag} has no effect on {config}");
            }
        }

        Ok(config)
    }

    fn flags(&self) -> [(&'static str, bool); 5] {
        [
            ("size", self.size.is_some()),
            ("overlap", self.overlap.is_some()),
            ("max-sentences", self.max_sentences.is_some()),
            ("max-tokens", self.max_tokens.is_some()),
            ("limit", self.limit.is_some()),
        ]
    }
}

fn flag_applies(flag: &str, config: &ChunkConfig) -> bool {
    matches!(
        (flag, config),
        ("size" | "overlap", ChunkConfig::Fixed(_))
            | ("max-sentences", ChunkConfig::Sentence(_))
            | ("max-tokens", ChunkConfig::Token(_))
            | ("limit", ChunkConfig::Passage(_))
    )
}

#[derive(Debug, Args, Default, Clone)]
pub struct EmbedArgs {
    /// Embedding backend: remote-api, local-sentence-model or local-transformer-model.
    /// Falls back to the `embedder` of the config file.
    #[arg(long, short, value_parser = parse_backend)]
    pub backend: Option<Backend>,

    /// Model to load. Defaults to the backend's default model.
    #[arg(long, short)]
    pub model: Option<String>,

    /// Document to embed. Defaults to the sample document.
    /// Only its first 512 chars are embedded.
    #[arg(long, short)]
    pub input: Option<PathBuf>,
}

impl EmbedArgs {
    /// Resolve the embedder configuration. Flags override the values from `file`,
    /// which is only used when it configures the same backend.
    pub fn embedder_config(
        &self,
        file: Option<&EmbedderConfig>,
        endpoint: Option<String>,
    ) -> Result<EmbedderConfig, RagprepError> {
        let mut config = match (self.backend, file) {
            (Some(backend), Some(config)) if backend == config.backend => config.clone(),
            (Some(backend), _) => EmbedderConfig::new(backend),
            (None, Some(config)) => config.clone(),
            (None, None) => {
                return Err(RagprepError::Config(
                    "no embedding backend; pass --backend or set `embedder` in the config file"
                        .to_string(),
                ))
            }
        };

        if let Some(ref model) = self.model {
            config.model_name = Some(model.clone());
        }

        if endpoint.is_some() {
            config.endpoint = endpoint;
        }

        Ok(config)
    }
}

fn parse_backend(s: &str) -> Result<Backend, String> {
    s.parse().map_err(|e: ragprep_embedders::error::EmbeddingError| e.to_string())
}

pub async fn run(args: StartArgs) -> Result<(), RagprepError> {
    let file = args.file_config()?;
    let key = args.openai_key();
    let endpoint = args.openai_endpoint();

    let command = args
        .command
        .unwrap_or_else(|| Execute::Demo(DemoArgs::default()));

    match command {
        Execute::Demo(DemoArgs { remote }) => {
            demo::run(remote, key.as_deref(), endpoint).await?;
        }
        Execute::Chunk(chunk) => run_chunk(&chunk, &file)?,
        Execute::Embed(embed) => {
            let config = embed.embedder_config(file.embedder.as_ref(), endpoint)?;
            let content = read_input(embed.input.as_deref())?;
            let text = demo::preview(&content, demo::PREVIEW_CHARS);

            let embedder = Embedder::from_config(&config, key.as_deref())?;
            let embedding = embedder.embed(text).await?;

            println!(
                "{} '{}' ({} dimensions)",
                config.backend,
                config.model_name(),
                embedder.dimensions()
            );
            println!("{embedding:?}");
        }
    }

    Ok(())
}

fn run_chunk(args: &ChunkArgs, file: &Config) -> Result<(), RagprepError> {
    let config = args.chunk_config(file.chunker.as_ref())?;
    let chunker = Chunker::from_config(&config)?;

    let content = read_input(args.input.as_deref())?;
    let chunks = chunker.chunk(&content);

    info!("{chunker} produced {} chunks", chunks.len());

    match args.out {
        Some(ref out) => write_chunks(chunks.into_owned(), out)?,
        None => {
            for (i, chunk) in chunks.iter().enumerate() {
                println!("Chunk {i} ==========\n{chunk}");
            }
        }
    }

    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, RagprepError> {
    match path {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => Ok(demo::SAMPLE_TEXT.to_string()),
    }
}

fn write_chunks(chunks: Vec<String>, out: &Path) -> Result<(), RagprepError> {
    std::fs::write(out, serde_json::to_string(&chunks)?)?;
    info!("Wrote {} chunks to {}", chunks.len(), out.display());
    Ok(())
}
