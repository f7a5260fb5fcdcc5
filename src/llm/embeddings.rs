use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

use crate::chunking::views::anglicize_name;
use crate::config::EmbeddingConfig;

/// Maximum characters to send per text to the embedding API.
/// Small sentence-embedding models have a 512-token window; 3 000 chars of
/// code stays under the larger 8 192-token models as well.
const MAX_EMBED_CHARS: usize = 3_000;

/// Turns text into fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Length of every returned vector.
    fn dims(&self) -> usize;

    /// One vector per input, same order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .context("No embedding returned")
    }
}

/// Build the embedder named by `config.provider`.
pub fn create_embedder(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "ollama" | "openai" => Ok(Arc::new(HttpEmbedder::new(client.clone(), config.clone()))),
        "hashing" => Ok(Arc::new(HashingEmbedder::new(config.dims))),
        other => anyhow::bail!("Unknown embedding provider: {other}"),
    }
}

/// Truncate `text` to at most `MAX_EMBED_CHARS`, splitting on a UTF-8 char boundary.
fn truncate_for_embedding(text: &str) -> &str {
    if text.len() <= MAX_EMBED_CHARS {
        return text;
    }
    let mut end = MAX_EMBED_CHARS;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Ollama or OpenAI-compatible embedding endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    config: EmbeddingConfig,
}

impl HttpEmbedder {
    pub fn new(client: reqwest::Client, config: EmbeddingConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dims(&self) -> usize {
        self.config.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let truncated: Vec<String> = texts
            .iter()
            .map(|t| truncate_for_embedding(t).to_string())
            .collect();

        match self.config.provider.as_str() {
            "ollama" => embed_ollama(&self.client, &self.config, &truncated).await,
            "openai" => embed_openai(&self.client, &self.config, &truncated).await,
            other => anyhow::bail!("Unknown embedding provider: {other}"),
        }
    }
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaEmbedRequest {
    model: String,
    input: Vec<String>,
    truncate: bool,
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

async fn embed_ollama(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/api/embed", config.base_url.trim_end_matches('/'));

    let batch_size = 32;
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let req = OllamaEmbedRequest {
            model: config.model.clone(),
            input: chunk.to_vec(),
            truncate: true,
        };

        let resp = client
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call Ollama embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Ollama embed API returned {status}: {body}");
        }

        let body: OllamaEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse Ollama embed response")?;

        all_embeddings.extend(body.embeddings);
    }

    Ok(all_embeddings)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbedData>,
}

#[derive(Deserialize)]
struct OpenAiEmbedData {
    embedding: Vec<f32>,
}

async fn embed_openai(
    client: &reqwest::Client,
    config: &EmbeddingConfig,
    texts: &[String],
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/v1/embeddings", config.base_url.trim_end_matches('/'));
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let batch_size = 64;
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size) {
        let req = OpenAiEmbedRequest {
            model: config.model.clone(),
            input: chunk.to_vec(),
        };

        let resp = client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&req)
            .send()
            .await
            .context("Failed to call OpenAI embed API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI embed API returned {status}: {body}");
        }

        let body: OpenAiEmbedResponse = resp
            .json()
            .await
            .context("Failed to parse OpenAI embed response")?;

        all_embeddings.extend(body.data.into_iter().map(|d| d.embedding));
    }

    Ok(all_embeddings)
}

// ─── Offline ─────────────────────────────────────────────

/// Signed feature hashing of identifier-split tokens, L2-normalized.
///
/// Needs no model or network. Only captures token overlap, so synonyms do
/// not land near each other.
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        let words = text
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty());

        for word in words {
            for token in anglicize_name(word).split_whitespace() {
                let hash = xxh3_64(token.as_bytes());
                let bucket = (hash % self.dims as u64) as usize;
                let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
                vector[bucket] += sign;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn model_name(&self) -> &str {
        "hashing"
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "é".repeat(MAX_EMBED_CHARS);
        let cut = truncate_for_embedding(&text);
        assert!(cut.len() <= MAX_EMBED_CHARS);
        assert!(text.starts_with(cut));
    }

    #[tokio::test]
    async fn test_hashing_embedder_is_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("parse json config").await.unwrap();
        let b = embedder.embed("parse json config").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_hashing_embedder_splits_identifiers() {
        let embedder = HashingEmbedder::new(256);
        let snake = embedder.embed("delete_items").await.unwrap();
        let words = embedder.embed("delete items").await.unwrap();
        assert_eq!(snake, words);
    }

    #[tokio::test]
    async fn test_hashing_embedder_empty_text_is_zero() {
        let embedder = HashingEmbedder::new(8);
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_create_embedder_rejects_unknown_provider() {
        let client = reqwest::Client::new();
        let config = EmbeddingConfig {
            provider: "mystery".to_string(),
            ..EmbeddingConfig::default()
        };
        assert!(create_embedder(&client, &config).is_err());
    }
}
