use crate::error::RagprepError;
use ragprep_chunk::{ChunkConfig, Chunker, ChunkerError};
use ragprep_embedders::{error::EmbeddingError, Backend, Embed, Embedder, EmbedderConfig};
use tracing::warn;

pub const SAMPLE_TEXT: &str = "Artificial Intelligence (AI) is transforming industries worldwide. From healthcare to finance, AI applications are revolutionizing how we interact with technology. \n    Large Language Models (LLMs) like GPT-4 have shown significant progress in natural language understanding and generation.";

/// Amount of chars of a document that get embedded.
pub const PREVIEW_CHARS: usize = 512;

/// The first `chars` chars of `text`.
pub fn preview(text: &str, chars: usize) -> &str {
    match text.char_indices().nth(chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Chunk `text` with every strategy using its default parameters.
pub fn chunk_sections(text: &str) -> Result<Vec<(&'static str, Vec<String>)>, ChunkerError> {
    let configs = [
        ("Fixed-size", ChunkConfig::fixed_default()),
        ("Sentence-based", ChunkConfig::sentence_default()),
        ("Paragraph-based", ChunkConfig::Paragraph),
        ("Token-based", ChunkConfig::token_default()),
    ];

    configs
        .into_iter()
        .map(|(label, config)| {
            let chunks = Chunker::from_config(&config)?.chunk(text);
            Ok((label, chunks.into_owned()))
        })
        .collect()
}

pub fn render_chunks(label: &str, chunks: &[String]) -> String {
    format!("{label}: {chunks:?}")
}

/// Embed `text` and render the vector with its length.
pub async fn render_embedding<E: Embed>(
    label: &str,
    embedder: &E,
    text: &str,
) -> Result<String, EmbeddingError> {
    let embedding = embedder.embed(text).await?;
    Ok(format!(
        "{label} ({} dimensions): {embedding:?}",
        embedder.dimensions()
    ))
}

fn label(backend: Backend) -> &'static str {
    match backend {
        Backend::RemoteApi => "OpenAI Embedding",
        Backend::LocalSentenceModel => "Sentence Transformers",
        Backend::LocalTransformerModel => "Hugging Face",
    }
}

/// Print every chunking strategy's output for [SAMPLE_TEXT], then the
/// embeddings of its first [PREVIEW_CHARS] chars. The remote backend
/// is only used when `remote` is set.
pub async fn run(
    remote: bool,
    api_key: Option<&str>,
    endpoint: Option<String>,
) -> Result<(), RagprepError> {
    println!("\n--- Chunking Methods ---");
    for (label, chunks) in chunk_sections(SAMPLE_TEXT)? {
        println!("{}", render_chunks(label, &chunks));
    }

    println!("\n--- Embedding Methods ---");
    let text = preview(SAMPLE_TEXT, PREVIEW_CHARS);

    let mut backends = vec![Backend::LocalSentenceModel, Backend::LocalTransformerModel];
    if remote {
        backends.push(Backend::RemoteApi);
    }

    for backend in backends {
        let mut config = EmbedderConfig::new(backend);
        config.endpoint = endpoint.clone();

        let embedder = match Embedder::from_config(&config, api_key) {
            Ok(embedder) => embedder,
            Err(EmbeddingError::BackendDisabled(e)) => {
                warn!("Skipping {backend}; {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        println!("{}", render_embedding(label(backend), &embedder, text).await?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEmbedder;

    impl Embed for StubEmbedder {
        async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
            if input.is_empty() {
                return Err(EmbeddingError::InvalidInput("empty".to_string()));
            }
            Ok(vec![input.chars().count() as f64, 0.5])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[test]
    fn preview_counts_chars() {
        assert_eq!("abc", preview("abcdef", 3));
        assert_eq!("ab", preview("ab", 3));
        assert_eq!("žđ", preview("žđć", 2));
        assert_eq!("", preview("", 512));
        assert_eq!(SAMPLE_TEXT, preview(SAMPLE_TEXT, PREVIEW_CHARS));
    }

    #[test]
    fn sample_sections() {
        let sections = chunk_sections(SAMPLE_TEXT).unwrap();
        let labels = sections.iter().map(|(l, _)| *l).collect::<Vec<_>>();
        assert_eq!(
            vec!["Fixed-size", "Sentence-based", "Paragraph-based", "Token-based"],
            labels
        );

        // 290 chars, a second window starts at 256
        let fixed = &sections[0].1;
        assert_eq!(2, fixed.len());
        assert_eq!(SAMPLE_TEXT, fixed[0]);
        assert_eq!(34, fixed[1].chars().count());
        assert!(SAMPLE_TEXT.contains("technology. \n"));

        // Three sentences fit a single window
        let sentence = &sections[1].1;
        assert_eq!(1, sentence.len());
        assert!(sentence[0].starts_with("Artificial Intelligence (AI)"));
        assert!(sentence[0].ends_with("understanding and generation."));
        assert!(!sentence[0].contains('\n'));

        assert_eq!(vec![SAMPLE_TEXT.to_string()], sections[2].1);
        assert_eq!(vec![SAMPLE_TEXT.to_string()], sections[3].1);
    }

    #[test]
    fn renders_chunks() {
        let chunks = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            r#"Paragraph-based: ["a", "b"]"#,
            render_chunks("Paragraph-based", &chunks)
        );
    }

    #[tokio::test]
    async fn renders_embedding() {
        let line = render_embedding("Stub", &StubEmbedder, preview(SAMPLE_TEXT, 10))
            .await
            .unwrap();
        assert_eq!("Stub (2 dimensions): [10.0, 0.5]", line);

        assert!(matches!(
            render_embedding("Stub", &StubEmbedder, "").await,
            Err(EmbeddingError::InvalidInput(_))
        ));
    }
}
