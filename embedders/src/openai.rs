use crate::{error::EmbeddingError, Embed, EmbeddingModel};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tracing::debug;

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";

pub const DEFAULT_OPENAI_MODEL: &str = TEXT_EMBEDDING_3_SMALL;

/// Remote embedder using the OpenAI embeddings API.
pub struct OpenAiEmbeddings {
    endpoint: String,
    key: String,
    model: EmbeddingModel,
    client: reqwest::Client,
}

impl OpenAiEmbeddings {
    /// Errors with [EmbeddingError::AuthenticationRequired] if `api_key` is blank
    /// and with [EmbeddingError::InvalidModel] if `model` is not an embedding model.
    pub fn new(api_key: &str, model: &str) -> Result<Self, EmbeddingError> {
        Self::with_endpoint(DEFAULT_OPENAI_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: &str,
        api_key: &str,
        model: &str,
    ) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::AuthenticationRequired(
                "missing OpenAI API key".to_string(),
            ));
        }

        let model = list_embedding_models()
            .into_iter()
            .find(|m| m.name == model)
            .ok_or_else(|| {
                EmbeddingError::InvalidModel(format!("model '{model}' not supported by OpenAI"))
            })?;

        tracing::info!(
            "Initializing OpenAI embeddings at {endpoint} with '{}'",
            model.name
        );

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: api_key.to_string(),
            model,
            client: reqwest::Client::new(),
        })
    }

    pub fn list_embedding_models(&self) -> Vec<EmbeddingModel> {
        list_embedding_models()
    }

    pub async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        if input.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }

        let request = EmbeddingRequest {
            model: self.model.name.clone(),
            input: vec![input.to_string()],
        };

        let response = match self
            .client
            .post(format!("{}/v1/embeddings", self.endpoint))
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await
        {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error in OpenAI request: {e}");
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            tracing::error!("Request to {} was not authorized", response.url());
            return Err(EmbeddingError::AuthenticationRequired(
                "OpenAI rejected the API key".to_string(),
            ));
        }

        if response.status() != reqwest::StatusCode::OK {
            tracing::error!(
                "Request to {} failed with status {}",
                response.url(),
                response.status()
            );
            let response = match response.json::<OpenAiError>().await {
                Ok(res) => res,
                Err(e) => {
                    tracing::error!("Error reading OpenAI response: {}", e);
                    tracing::error!("Source: {:?}", e.source());
                    return Err(EmbeddingError::Reqwest(e));
                }
            };
            tracing::error!("Response: {response:?}");
            return Err(EmbeddingError::OpenAi(response));
        }

        let response = match response.json::<EmbeddingResponse>().await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Error decoding OpenAI response: {}", e);
                tracing::error!("Source: {:?}", e.source());
                return Err(EmbeddingError::Reqwest(e));
            }
        };

        debug!(
            "Embedded 1 chunk with '{}', used tokens {}-{} (prompt-total)",
            response.model, response.usage.prompt_tokens, response.usage.total_tokens
        );

        response
            .data
            .into_iter()
            .next()
            .map(|o| o.embedding)
            .ok_or_else(|| {
                EmbeddingError::InvalidInput("OpenAI returned no embedding".to_string())
            })
    }
}

impl Embed for OpenAiEmbeddings {
    async fn embed(&self, input: &str) -> Result<Vec<f64>, EmbeddingError> {
        OpenAiEmbeddings::embed(self, input).await
    }

    fn dimensions(&self) -> usize {
        self.model.dimensions
    }
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

pub fn list_embedding_models() -> Vec<EmbeddingModel> {
    vec![
        EmbeddingModel::new(TEXT_EMBEDDING_3_LARGE, 3072),
        EmbeddingModel::new(TEXT_EMBEDDING_3_SMALL, 1536),
        EmbeddingModel::new(TEXT_EMBEDDING_ADA_002, 1536),
    ]
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    object: String,
    data: Vec<EmbeddingObject>,
    model: String,
    usage: Usage,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    object: String,
    embedding: Vec<f64>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    total_tokens: usize,
}

#[derive(Debug, Deserialize, Error)]
#[error("{message}, type: {r#type}, param: {param:?}, code: {code:?}")]
pub struct OpenAiErrorParams {
    pub message: String,
    pub r#type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, Error)]
#[error("OpenAI error response {{ {error} }}")]
pub struct OpenAiError {
    pub error: OpenAiErrorParams,
}

const TEXT_EMBEDDING_3_LARGE: &str = "text-embedding-3-large";
const TEXT_EMBEDDING_3_SMALL: &str = "text-embedding-3-small";
const TEXT_EMBEDDING_ADA_002: &str = "text-embedding-ada-002";

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, ServerGuard};

    const EMBEDDINGS_PATH: &str = "/v1/embeddings";

    /// Mock the embeddings route of `server`, answering requests made with `key`.
    async fn mock_embeddings(
        server: &mut ServerGuard,
        key: &str,
        status: usize,
        body: &str,
    ) -> Mock {
        server
            .mock("POST", EMBEDDINGS_PATH)
            .match_header("authorization", format!("Bearer {key}").as_str())
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": DEFAULT_OPENAI_MODEL,
                "input": ["hello world"],
            })))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn openai_rejects_blank_key() {
        let result = OpenAiEmbeddings::new("  ", DEFAULT_OPENAI_MODEL);
        assert!(matches!(
            result,
            Err(EmbeddingError::AuthenticationRequired(_))
        ));
    }

    #[test]
    fn openai_rejects_unknown_model() {
        let result = OpenAiEmbeddings::new("sk-test", "gpt-4o");
        assert!(matches!(result, Err(EmbeddingError::InvalidModel(_))));
    }

    #[test]
    fn openai_lists_dimensions() {
        let embedder = OpenAiEmbeddings::new("sk-test", TEXT_EMBEDDING_3_LARGE).unwrap();
        assert_eq!(3072, Embed::dimensions(&embedder));
        assert_eq!(3, embedder.list_embedding_models().len());
    }

    #[tokio::test]
    async fn openai_embeds() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_embeddings(
            &mut server,
            "sk-test",
            200,
            r#"{"object":"list","data":[{"object":"embedding","embedding":[0.5,-0.25,1.0],"index":0}],"model":"text-embedding-3-small","usage":{"prompt_tokens":2,"total_tokens":2}}"#,
        )
        .await;

        let embedder =
            OpenAiEmbeddings::with_endpoint(&server.url(), "sk-test", DEFAULT_OPENAI_MODEL)
                .unwrap();
        let embedding = embedder.embed("hello world").await.unwrap();

        assert_eq!(vec![0.5, -0.25, 1.0], embedding);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_embeddings(
            &mut server,
            "sk-wrong",
            401,
            r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","param":null,"code":"invalid_api_key"}}"#,
        )
        .await;

        let embedder =
            OpenAiEmbeddings::with_endpoint(&server.url(), "sk-wrong", DEFAULT_OPENAI_MODEL)
                .unwrap();

        assert!(matches!(
            embedder.embed("hello world").await,
            Err(EmbeddingError::AuthenticationRequired(_))
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_error_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_embeddings(
            &mut server,
            "sk-test",
            400,
            r#"{"error":{"message":"Input too long","type":"invalid_request_error","param":"input","code":null}}"#,
        )
        .await;

        let embedder =
            OpenAiEmbeddings::with_endpoint(&server.url(), "sk-test", DEFAULT_OPENAI_MODEL)
                .unwrap();

        let Err(EmbeddingError::OpenAi(e)) = embedder.embed("hello world").await else {
            panic!("expected an OpenAI error response");
        };
        assert_eq!("Input too long", e.error.message);
        assert_eq!(Some("input".to_string()), e.error.param);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn openai_rejects_empty_input() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", EMBEDDINGS_PATH)
            .expect(0)
            .create_async()
            .await;

        let embedder =
            OpenAiEmbeddings::with_endpoint(&server.url(), "sk-test", DEFAULT_OPENAI_MODEL)
                .unwrap();
        assert!(matches!(
            embedder.embed("").await,
            Err(EmbeddingError::InvalidInput(_))
        ));
        mock.assert_async().await;
    }
}
